//! CLI command implementations.

pub mod copy;
pub mod write;

use serde::Serialize;
use std::path::Path;

/// Outcome of an atomic write, as reported to the user.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct WriteReport {
    /// Destination that was replaced.
    pub destination: String,
    /// Number of bytes committed.
    pub bytes: u64,
    /// Permission bits of the committed file, in octal.
    pub mode: String,
}

impl WriteReport {
    pub(crate) fn new(destination: &Path, bytes: u64, mode: u32) -> Self {
        Self {
            destination: destination.display().to_string(),
            bytes,
            mode: format!("{mode:04o}"),
        }
    }

    /// Prints the report in the requested format (`text` or `json`).
    pub fn print(&self, format: &str) -> Result<(), Box<dyn std::error::Error>> {
        match format {
            "json" => println!("{}", serde_json::to_string_pretty(self)?),
            "text" => {
                println!("✓ Committed {}", self.destination);
                println!("  Size: {} bytes", self.bytes);
                println!("  Mode: {}", self.mode);
            }
            other => return Err(format!("unknown output format: {other}").into()),
        }
        Ok(())
    }
}

/// Parses permission bits written in octal: `644`, `0644` or `0o644`.
pub fn parse_mode(value: &str) -> Result<u32, String> {
    let digits = value.strip_prefix("0o").unwrap_or(value);
    let mode = u32::from_str_radix(digits, 8)
        .map_err(|_| format!("invalid octal mode: {value}"))?;
    if mode > 0o7777 {
        return Err(format!("mode out of range: {value}"));
    }
    Ok(mode)
}
