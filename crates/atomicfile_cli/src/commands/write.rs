//! Write command: atomically replace a file with data read from stdin.

use super::WriteReport;
use atomicfile_core::{AtomicFile, Options};
use std::io::{self, Read};
use std::path::Path;
use tracing::info;

/// Copies everything from `reader` into `destination` atomically.
///
/// The destination is only replaced once the reader is exhausted; a read
/// error leaves it untouched.
pub fn write_from<R: Read>(
    reader: &mut R,
    destination: &Path,
    options: &Options,
) -> Result<WriteReport, Box<dyn std::error::Error>> {
    let mut file = AtomicFile::with_options(destination, options)?;
    let bytes = io::copy(reader, &mut file)?;
    file.commit()?;

    Ok(WriteReport::new(destination, bytes, options.mode))
}

/// Runs the write command.
pub fn run(
    destination: &Path,
    options: &Options,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Writing stdin to {:?}", destination);

    let report = write_from(&mut io::stdin().lock(), destination, options)?;
    report.print(format)
}
