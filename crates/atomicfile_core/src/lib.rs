//! # atomicfile
//!
//! Atomic whole-file replacement on filesystems that only guarantee atomic
//! renames.
//!
//! Writes go to a hidden staging file in the destination's directory. On
//! commit the staging file is renamed over the destination in a single step;
//! on abort it is deleted. Other processes reading the destination see the
//! old contents or the new contents, never a partial write, even if this
//! process crashes halfway through.
//!
//! ## Design Principles
//!
//! - One staging file per handle, always in the destination's directory
//! - The destination is only ever changed by the final rename
//! - `abort` after `commit` is a no-op, so cleanup can run unconditionally
//! - No fsync: durability is whatever the rename itself provides
//! - No coordination between writers: the last rename wins
//!
//! ## Example
//!
//! ```rust
//! use atomicfile_core::AtomicFile;
//! use std::io::Write;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::tempdir()?;
//! let path = dir.path().join("x");
//! std::fs::write(&path, b"the answer is 42")?;
//!
//! let mut file = AtomicFile::new(&path, 0o644)?;
//! file.write_all(b"foo")?;
//! file.commit()?;
//! file.abort()?; // no-op after commit
//!
//! assert_eq!(std::fs::read(&path)?, b"foo");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod options;
mod platform;
mod staging;
mod state;

pub use error::{AtomicFileError, AtomicFileResult, RenameError};
pub use file::{write_atomic, AtomicFile};
pub use options::{Options, DEFAULT_MODE, DEFAULT_STAGING_SUFFIX};
pub use platform::rename_atomic;
pub use state::FileState;
