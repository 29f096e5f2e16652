//! Error types for atomic file operations.

use crate::state::FileState;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for atomic file operations.
pub type AtomicFileResult<T> = Result<T, AtomicFileError>;

/// Errors that can occur while creating, committing or aborting an
/// [`AtomicFile`](crate::AtomicFile).
///
/// Writes through the handle report plain [`io::Error`]s, as any file does.
#[derive(Debug, Error)]
pub enum AtomicFileError {
    /// The destination path cannot host a staging file.
    #[error("invalid destination {path:?}: {reason}")]
    InvalidDestination {
        /// The rejected destination.
        path: PathBuf,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Parent directories of the destination could not be created.
    #[error("failed to create directories for {path:?}: {source}")]
    CreateDirs {
        /// The directory that was being created.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The staging file could not be created.
    #[error("failed to create staging file {path:?}: {source}")]
    CreateStaging {
        /// The staging path of the last attempt.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The requested permission bits could not be applied to the staging file.
    ///
    /// The staging file has already been removed when this is returned.
    #[error("failed to set permissions {mode:#o} on {path:?}: {source}")]
    SetPermissions {
        /// The staging path.
        path: PathBuf,
        /// The requested mode.
        mode: u32,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// Closing the staging stream failed during commit.
    ///
    /// The staging file has been deleted; the destination is untouched.
    #[error("failed to close staging file {path:?}: {source}")]
    Close {
        /// The staging path.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// Renaming the staging file onto the destination failed.
    ///
    /// The staging file is left on disk; the destination is untouched.
    #[error(transparent)]
    Rename(#[from] RenameError),

    /// Deleting the staging file failed during abort.
    #[error("failed to remove staging file {path:?}: {source}")]
    Cleanup {
        /// The staging path.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The handle is no longer open for writing or committing.
    #[error("atomic file is not open (state: {state})")]
    NotOpen {
        /// The state the handle was in.
        state: FileState,
    },
}

impl AtomicFileError {
    pub(crate) fn not_open(state: FileState) -> Self {
        Self::NotOpen { state }
    }
}

impl From<AtomicFileError> for io::Error {
    fn from(err: AtomicFileError) -> Self {
        let kind = match &err {
            AtomicFileError::InvalidDestination { .. } => io::ErrorKind::InvalidInput,
            AtomicFileError::CreateDirs { source, .. }
            | AtomicFileError::CreateStaging { source, .. }
            | AtomicFileError::SetPermissions { source, .. }
            | AtomicFileError::Close { source, .. }
            | AtomicFileError::Cleanup { source, .. } => source.kind(),
            AtomicFileError::Rename(rename) => rename.source.kind(),
            AtomicFileError::NotOpen { .. } => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

/// A failed rename, carrying the operation, both paths and the OS error.
#[derive(Debug, Error)]
#[error("{op} {} {}: {source}", .from.display(), .to.display())]
pub struct RenameError {
    op: &'static str,
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: io::Error,
}

impl RenameError {
    pub(crate) fn new(op: &'static str, from: &Path, to: &Path, source: io::Error) -> Self {
        Self {
            op,
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        }
    }

    /// The name of the system operation that failed.
    #[must_use]
    pub fn op(&self) -> &'static str {
        self.op
    }

    /// The path being renamed.
    #[must_use]
    pub fn from(&self) -> &Path {
        &self.from
    }

    /// The path it was being renamed onto.
    #[must_use]
    pub fn to(&self) -> &Path {
        &self.to
    }

    /// The raw OS error code, if the failure came from the OS.
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        self.source.raw_os_error()
    }

    /// The underlying I/O error.
    #[must_use]
    pub fn io_error(&self) -> &io::Error {
        &self.source
    }
}
