//! Platform primitives: atomic rename, permission bits and closing.
//!
//! Exactly one implementation is compiled in, chosen by target.

#[cfg(not(windows))]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(not(windows))]
use self::unix as imp;
#[cfg(windows)]
use self::windows as imp;

use crate::error::RenameError;
use std::fs::File;
use std::io;
use std::path::Path;

/// Atomically renames `from` onto `to`, replacing any file at `to`.
///
/// Either `to` ends up referring to the content of `from`, or neither path
/// changes. Both paths must be on the same filesystem; the staging files of
/// [`AtomicFile`](crate::AtomicFile) satisfy this by living next to their
/// destination.
///
/// # Errors
///
/// Returns a [`RenameError`] naming the failed system operation, both paths
/// and the OS error.
pub fn rename_atomic(from: &Path, to: &Path) -> Result<(), RenameError> {
    imp::rename_atomic(from, to)
}

/// Applies permission bits to `path`, ignoring the process umask.
pub(crate) fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    imp::set_mode(path, mode)
}

/// Closes `file`, reporting the error `Drop for File` would discard.
///
/// Some filesystems (NFS in particular) only report delayed write errors
/// here.
pub(crate) fn close(file: File) -> io::Result<()> {
    imp::close(file)
}

/// Returns true if `err` means the handle was already closed.
pub(crate) fn is_already_closed(err: &io::Error) -> bool {
    imp::is_already_closed(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn rename_onto_missing_destination() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("from");
        let to = dir.path().join("to");
        fs::write(&from, b"new").unwrap();

        rename_atomic(&from, &to).unwrap();

        assert!(!from.exists());
        assert_eq!(fs::read(&to).unwrap(), b"new");
    }

    #[test]
    fn rename_replaces_existing_destination() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("from");
        let to = dir.path().join("to");
        fs::write(&from, b"new").unwrap();
        fs::write(&to, b"old contents").unwrap();

        rename_atomic(&from, &to).unwrap();

        assert!(!from.exists());
        assert_eq!(fs::read(&to).unwrap(), b"new");
    }

    #[test]
    fn rename_missing_source_reports_paths() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("missing");
        let to = dir.path().join("to");
        fs::write(&to, b"old").unwrap();

        let err = rename_atomic(&from, &to).unwrap_err();

        assert_eq!(err.from(), from);
        assert_eq!(err.to(), to);
        assert_eq!(err.io_error().kind(), io::ErrorKind::NotFound);
        assert!(err.raw_os_error().is_some());
        assert_eq!(fs::read(&to).unwrap(), b"old");
    }

    #[test]
    fn close_flushes_written_data() {
        use std::io::Write;

        let dir = tempdir().unwrap();
        let path = dir.path().join("file");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"closed").unwrap();

        close(file).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"closed");
    }

    #[test]
    fn set_mode_marks_read_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file");
        fs::write(&path, b"x").unwrap();

        set_mode(&path, 0o444).unwrap();
        assert!(fs::metadata(&path).unwrap().permissions().readonly());

        set_mode(&path, 0o644).unwrap();
        assert!(!fs::metadata(&path).unwrap().permissions().readonly());
    }
}
