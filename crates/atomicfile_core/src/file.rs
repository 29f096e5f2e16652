//! The atomic file handle.

use crate::error::{AtomicFileError, AtomicFileResult};
use crate::options::Options;
use crate::platform;
use crate::staging;
use crate::state::FileState;
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Releases the staging stream and reports the OS close status.
type CloseFn = fn(File) -> io::Result<()>;

/// A file whose new contents become visible all at once.
///
/// Every write goes to a hidden staging file next to the destination.
/// [`commit`](Self::commit) renames it onto the destination in one atomic
/// step; [`abort`](Self::abort) deletes it. Readers of the destination see
/// either the old contents or the complete new contents, never a partial
/// write.
///
/// # Lifecycle
///
/// ```text
/// new ──► Open ──commit──► Committed
///           │
///           └───abort───► Aborted
/// ```
///
/// `abort` is a no-op once committed, and dropping a handle that is still
/// open aborts it. Code can therefore abort unconditionally on every exit
/// path without undoing a successful commit.
///
/// # Concurrency
///
/// Two handles for the same destination each get their own staging file.
/// Nothing serializes them: the rename that completes last wins.
///
/// # Example
///
/// ```rust
/// use atomicfile_core::AtomicFile;
/// use std::io::Write;
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("settings.json");
///
/// let mut file = AtomicFile::new(&path, 0o644).unwrap();
/// file.write_all(b"{}").unwrap();
/// file.commit().unwrap();
///
/// assert_eq!(std::fs::read(&path).unwrap(), b"{}");
/// ```
#[derive(Debug)]
pub struct AtomicFile {
    /// Path that is replaced on commit.
    destination: PathBuf,
    /// Path of the staging file.
    staging: PathBuf,
    /// Staging stream; `None` once closed.
    file: Option<File>,
    /// Requested permission bits.
    mode: u32,
    state: FileState,
    close_fn: CloseFn,
}

impl AtomicFile {
    /// Creates a staging file that will replace `destination` on commit.
    ///
    /// `mode` becomes the permission bits of the committed file.
    ///
    /// # Errors
    ///
    /// Returns an error if the staging file cannot be created or its
    /// permissions cannot be set. No staging file is left behind.
    pub fn new(destination: impl AsRef<Path>, mode: u32) -> AtomicFileResult<Self> {
        Self::with_options(destination, &Options::new().mode(mode))
    }

    /// Creates a staging file for `destination` using `options`.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new), plus failure to create parent directories
    /// when [`Options::create_dirs`] is set.
    pub fn with_options(
        destination: impl AsRef<Path>,
        options: &Options,
    ) -> AtomicFileResult<Self> {
        let destination = destination.as_ref();
        let staging = staging::create(destination, options)?;

        Ok(Self {
            destination: destination.to_path_buf(),
            staging: staging.path,
            file: Some(staging.file),
            mode: options.mode,
            state: FileState::Open,
            close_fn: platform::close,
        })
    }

    /// Returns the path replaced on commit.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Returns the path of the staging file.
    #[must_use]
    pub fn staging_path(&self) -> &Path {
        &self.staging
    }

    /// Returns the requested permission bits.
    #[must_use]
    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> FileState {
        self.state
    }

    /// Returns the staging file.
    ///
    /// # Errors
    ///
    /// Returns [`AtomicFileError::NotOpen`] once the stream is closed.
    pub fn get_ref(&self) -> AtomicFileResult<&File> {
        match (&self.file, self.state) {
            (Some(file), FileState::Open) => Ok(file),
            _ => Err(AtomicFileError::not_open(self.state)),
        }
    }

    /// Returns the staging file mutably, e.g. to call [`File::set_len`].
    ///
    /// # Errors
    ///
    /// Returns [`AtomicFileError::NotOpen`] once the stream is closed.
    pub fn get_mut(&mut self) -> AtomicFileResult<&mut File> {
        match (&mut self.file, self.state) {
            (Some(file), FileState::Open) => Ok(file),
            _ => Err(AtomicFileError::not_open(self.state)),
        }
    }

    fn stream(&mut self) -> io::Result<&mut File> {
        self.get_mut().map_err(io::Error::from)
    }

    /// Closes the staging stream and returns the OS close status.
    ///
    /// The stream is released even when closing fails.
    fn close(&mut self) -> io::Result<()> {
        match self.file.take() {
            Some(mut file) => {
                file.flush()?;
                (self.close_fn)(file)
            }
            None => Ok(()),
        }
    }

    /// Makes the written contents visible at the destination.
    ///
    /// Closes the staging stream, then atomically renames the staging file
    /// onto the destination, replacing any existing file.
    ///
    /// Committing twice, or after [`abort`](Self::abort), is a programming
    /// error and is reported as [`AtomicFileError::NotOpen`].
    ///
    /// # Errors
    ///
    /// - [`AtomicFileError::Close`] if closing fails. The staging file is
    ///   deleted and the handle cannot be committed again.
    /// - [`AtomicFileError::Rename`] if the rename fails. The staging file is
    ///   kept until the handle is aborted or dropped.
    ///
    /// In both cases the destination is untouched.
    pub fn commit(&mut self) -> AtomicFileResult<()> {
        if self.state != FileState::Open || self.file.is_none() {
            return Err(AtomicFileError::not_open(self.state));
        }

        if let Err(source) = self.close() {
            if let Err(e) = fs::remove_file(&self.staging) {
                warn!(
                    staging = %self.staging.display(),
                    error = %e,
                    "failed to remove staging file"
                );
            }
            return Err(AtomicFileError::Close {
                path: self.staging.clone(),
                source,
            });
        }

        platform::rename_atomic(&self.staging, &self.destination)?;

        self.state = FileState::Committed;
        debug!(destination = %self.destination.display(), "committed atomic file");
        Ok(())
    }

    /// Discards everything written and deletes the staging file.
    ///
    /// Does nothing if the handle is already committed or aborted, so it is
    /// safe to call on every exit path.
    ///
    /// # Errors
    ///
    /// Returns [`AtomicFileError::Cleanup`] if the staging stream fails to
    /// close or the staging file exists but cannot be deleted. A stream that
    /// is already closed, or a staging file that is already gone, is not an
    /// error.
    pub fn abort(&mut self) -> AtomicFileResult<()> {
        if self.state.is_finished() {
            return Ok(());
        }

        let closed = match self.close() {
            Err(e) if platform::is_already_closed(&e) => Ok(()),
            closed => closed,
        };

        match fs::remove_file(&self.staging) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(AtomicFileError::Cleanup {
                    path: self.staging.clone(),
                    source,
                });
            }
        }

        self.state = FileState::Aborted;
        debug!(destination = %self.destination.display(), "aborted atomic file");

        closed.map_err(|source| AtomicFileError::Cleanup {
            path: self.staging.clone(),
            source,
        })
    }
}

impl Drop for AtomicFile {
    fn drop(&mut self) {
        if let Err(e) = self.abort() {
            warn!(error = %e, "failed to abort atomic file on drop");
        }
    }
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream()?.write(buf)
    }

    fn write_vectored(&mut self, bufs: &[io::IoSlice<'_>]) -> io::Result<usize> {
        self.stream()?.write_vectored(bufs)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream()?.flush()
    }
}

impl Read for AtomicFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream()?.read(buf)
    }
}

impl Seek for AtomicFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.stream()?.seek(pos)
    }
}

/// Atomically replaces the file at `path` with `contents`.
///
/// The atomic counterpart of [`std::fs::write`]: readers of `path` see the
/// old contents or all of `contents`, never a mix.
///
/// # Errors
///
/// Returns an error if the staging file cannot be created, written or
/// committed. No staging file is left behind.
///
/// # Example
///
/// ```rust
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("answer");
///
/// atomicfile_core::write_atomic(&path, b"42", 0o644).unwrap();
/// assert_eq!(std::fs::read(&path).unwrap(), b"42");
/// ```
pub fn write_atomic(
    path: impl AsRef<Path>,
    contents: impl AsRef<[u8]>,
    mode: u32,
) -> io::Result<()> {
    let mut file = AtomicFile::new(path, mode)?;
    file.write_all(contents.as_ref())?;
    file.commit()?;
    Ok(())
}
