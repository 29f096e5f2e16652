//! atomicfile CLI
//!
//! Replace files atomically from the command line.
//!
//! # Commands
//!
//! - `write` - Replace a file with data read from stdin
//! - `copy` - Replace a file with the contents of another file
//! - `version` - Show version information

mod commands;

use atomicfile_core::{Options, DEFAULT_MODE};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Atomic file replacement tools.
#[derive(Parser)]
#[command(name = "atomicfile")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that writes a file.
#[derive(clap::Args)]
struct WriteArgs {
    /// Permission bits of the written file, in octal
    #[arg(short, long, value_parser = commands::parse_mode, default_value = "0666")]
    mode: u32,

    /// Create missing parent directories
    #[arg(short = 'p', long)]
    create_dirs: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,
}

impl WriteArgs {
    fn options(&self) -> Options {
        Options::new().mode(self.mode).create_dirs(self.create_dirs)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Replace a file with data read from stdin
    Write {
        /// File to replace
        destination: PathBuf,

        #[command(flatten)]
        args: WriteArgs,
    },

    /// Replace a file with the contents of another file
    Copy {
        /// File to read
        source: PathBuf,

        /// File to replace
        destination: PathBuf,

        #[command(flatten)]
        args: WriteArgs,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Write { destination, args } => {
            commands::write::run(&destination, &args.options(), &args.format)?;
        }
        Commands::Copy {
            source,
            destination,
            args,
        } => {
            commands::copy::run(&source, &destination, &args.options(), &args.format)?;
        }
        Commands::Version => {
            println!("atomicfile CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Default mode: {DEFAULT_MODE:04o}");
        }
    }

    Ok(())
}
