//! Copy command: atomically replace a file with the contents of another.

use super::WriteReport;
use super::write::write_from;
use atomicfile_core::Options;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Copies `source` onto `destination` atomically.
pub fn copy_file(
    source: &Path,
    destination: &Path,
    options: &Options,
) -> Result<WriteReport, Box<dyn std::error::Error>> {
    let mut input = File::open(source)
        .map_err(|e| format!("cannot open source {}: {e}", source.display()))?;
    write_from(&mut input, destination, options)
}

/// Runs the copy command.
pub fn run(
    source: &Path,
    destination: &Path,
    options: &Options,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Copying {:?} to {:?}", source, destination);

    let report = copy_file(source, destination, options)?;
    report.print(format)
}
