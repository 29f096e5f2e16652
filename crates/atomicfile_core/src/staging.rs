//! Staging file allocation.
//!
//! A staging file lives in the same directory as its destination, so the
//! final rename never crosses a filesystem boundary:
//!
//! ```text
//! <dir>/
//! ├─ config.toml                              # destination
//! └─ .config.toml.3f2a...c9e1.tmp             # staging file
//! ```

use crate::error::{AtomicFileError, AtomicFileResult};
use crate::options::Options;
use crate::platform;
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{self, Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// How many fresh names to try before giving up on a crowded directory.
const MAX_ATTEMPTS: usize = 16;

/// Longest file name common filesystems accept, in bytes.
const MAX_NAME_LEN: usize = 255;

/// Applies permission bits to a freshly created staging file.
pub(crate) type SetModeFn = fn(&Path, u32) -> io::Result<()>;

/// A freshly created staging file.
#[derive(Debug)]
pub(crate) struct Staging {
    pub(crate) path: PathBuf,
    pub(crate) file: File,
}

/// Splits a destination into the directory and file name the staging file
/// derives from.
fn split_destination(destination: &Path) -> AtomicFileResult<(&Path, &OsStr)> {
    if names_a_directory(destination) {
        return Err(AtomicFileError::InvalidDestination {
            path: destination.to_path_buf(),
            reason: "destination ends in a separator or `.`",
        });
    }
    let name = destination
        .file_name()
        .ok_or_else(|| AtomicFileError::InvalidDestination {
            path: destination.to_path_buf(),
            reason: "destination has no file name",
        })?;
    let dir = destination.parent().unwrap_or_else(|| Path::new(""));
    Ok((dir, name))
}

/// Returns true for `dir/`, `dir/.` and `.`: `Path` normalizes these to a
/// file name that does not match what the rename would target.
fn names_a_directory(destination: &Path) -> bool {
    let is_separator = |b: &u8| path::is_separator(char::from(*b));
    match destination.as_os_str().as_encoded_bytes() {
        [b'.'] => true,
        [.., last] if is_separator(last) => true,
        [.., sep, b'.'] => is_separator(sep),
        _ => false,
    }
}

/// Cuts `name` to at most `max` bytes, on a char boundary.
fn truncate_name(name: &OsStr, max: usize) -> Cow<'_, OsStr> {
    if name.len() <= max {
        return Cow::Borrowed(name);
    }
    match name.to_str() {
        Some(s) => Cow::Borrowed(OsStr::new(floor_to_char(s, max))),
        None => {
            let lossy = name.to_string_lossy();
            Cow::Owned(OsString::from(floor_to_char(&lossy, max)))
        }
    }
}

fn floor_to_char(s: &str, max: usize) -> &str {
    let mut end = max.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Builds a hidden, unique staging name: `.<name>.<uuid><suffix>`.
///
/// Long names are shortened so the result still fits in a directory entry;
/// the UUID alone keeps it unique.
fn staging_name(name: &OsStr, suffix: &str) -> OsString {
    let id = Uuid::new_v4().simple().to_string();
    let budget = MAX_NAME_LEN.saturating_sub(id.len() + suffix.len() + 2);
    let name = truncate_name(name, budget);
    let mut staging = OsString::with_capacity(name.len() + id.len() + suffix.len() + 2);
    staging.push(".");
    staging.push(name);
    staging.push(".");
    staging.push(id);
    staging.push(suffix);
    staging
}

/// Opens a new file exclusively; on Unix it starts owner-only until the
/// requested mode is applied.
fn open_exclusive(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options.open(path)
}

/// Creates the staging file for `destination`.
///
/// # Errors
///
/// Returns an error if the destination has no file name, the directory
/// cannot be created or written, or the permission bits cannot be applied.
/// In the last case the staging file is removed before returning.
pub(crate) fn create(destination: &Path, options: &Options) -> AtomicFileResult<Staging> {
    create_with(destination, options, platform::set_mode)
}

/// [`create`] with the permission step supplied by the caller.
pub(crate) fn create_with(
    destination: &Path,
    options: &Options,
    set_mode: SetModeFn,
) -> AtomicFileResult<Staging> {
    let (dir, name) = split_destination(destination)?;

    if options.create_dirs && !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir).map_err(|source| AtomicFileError::CreateDirs {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let mut attempt = 1;
    let (path, file) = loop {
        let path = dir.join(staging_name(name, &options.staging_suffix));
        match open_exclusive(&path) {
            Ok(file) => break (path, file),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && attempt < MAX_ATTEMPTS => {
                attempt += 1;
            }
            Err(source) => return Err(AtomicFileError::CreateStaging { path, source }),
        }
    };

    if let Err(source) = set_mode(&path, options.mode) {
        drop(file);
        if let Err(e) = fs::remove_file(&path) {
            warn!(path = %path.display(), error = %e, "failed to remove staging file");
        }
        return Err(AtomicFileError::SetPermissions {
            path,
            mode: options.mode,
            source,
        });
    }

    debug!(
        destination = %destination.display(),
        staging = %path.display(),
        mode = %format!("{:#o}", options.mode),
        "created staging file"
    );

    Ok(Staging { path, file })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn staging_lives_next_to_destination() {
        let dir = tempdir().unwrap();
        let destination = dir.path().join("config.toml");

        let staging = create(&destination, &Options::default()).unwrap();

        assert_eq!(staging.path.parent(), Some(dir.path()));
        assert!(staging.path.exists());
        assert!(!destination.exists());
    }

    #[test]
    fn staging_name_is_hidden_and_prefixed() {
        let name = staging_name(OsStr::new("config.toml"), ".tmp");
        let name = name.to_str().unwrap();

        assert!(name.starts_with(".config.toml."));
        assert!(name.ends_with(".tmp"));
        assert_ne!(name, "config.toml");
    }

    #[test]
    fn long_name_is_shortened_to_fit() {
        let name = "a".repeat(240);
        let staging = staging_name(OsStr::new(&name), ".tmp");

        assert!(staging.len() <= MAX_NAME_LEN);
        let staging = staging.to_str().unwrap();
        assert!(staging.starts_with(".aaaa"));
        assert!(staging.ends_with(".tmp"));
    }

    #[test]
    fn shortened_name_keeps_whole_chars() {
        let name = "é".repeat(200);
        let staging = staging_name(OsStr::new(&name), ".tmp");

        assert!(staging.len() <= MAX_NAME_LEN);
        let staging = staging.to_str().unwrap();
        assert!(staging.starts_with(".é"));
    }

    #[test]
    fn long_destination_name_gets_a_staging_file() {
        let dir = tempdir().unwrap();
        let destination = dir.path().join("b".repeat(240));

        let staging = create(&destination, &Options::default()).unwrap();

        assert_eq!(staging.path.parent(), Some(dir.path()));
        assert!(staging.path.exists());
    }

    #[test]
    fn custom_suffix_is_used() {
        let dir = tempdir().unwrap();
        let destination = dir.path().join("data.bin");

        let options = Options::new().staging_suffix(".partial");
        let staging = create(&destination, &options).unwrap();

        let name = staging.path.file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with(".partial"));
    }

    #[test]
    fn relative_destination_without_directory() {
        let (dir, name) = split_destination(Path::new("plain.txt")).unwrap();
        assert_eq!(dir, Path::new(""));
        assert_eq!(name, OsStr::new("plain.txt"));
    }

    #[test]
    fn destination_without_file_name_is_rejected() {
        let result = create(Path::new("/"), &Options::default());
        assert!(matches!(
            result,
            Err(AtomicFileError::InvalidDestination { .. })
        ));
    }

    #[test]
    fn directory_like_destinations_are_rejected() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("x");

        let mut trailing_dot = nested.clone().into_os_string();
        trailing_dot.push("/.");
        let mut trailing_slash = nested.into_os_string();
        trailing_slash.push("/");

        for destination in [
            PathBuf::from(trailing_dot),
            PathBuf::from(trailing_slash),
            PathBuf::from("."),
        ] {
            let result = create(&destination, &Options::default());
            assert!(
                matches!(result, Err(AtomicFileError::InvalidDestination { .. })),
                "{} was accepted",
                destination.display()
            );
        }
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn dotted_file_names_are_accepted() {
        assert!(!names_a_directory(Path::new("dir/.hidden")));
        assert!(!names_a_directory(Path::new("dir/x.")));
        assert!(!names_a_directory(Path::new("x")));
    }

    #[test]
    fn failed_chmod_removes_staging_file() {
        fn refuse(_path: &Path, _mode: u32) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "chmod refused"))
        }

        let dir = tempdir().unwrap();
        let destination = dir.path().join("locked");

        let result = create_with(&destination, &Options::new().mode(0o600), refuse);

        assert!(matches!(
            result,
            Err(AtomicFileError::SetPermissions { mode: 0o600, .. })
        ));
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn missing_directory_fails_without_create_dirs() {
        let dir = tempdir().unwrap();
        let destination = dir.path().join("missing").join("file");

        let result = create(&destination, &Options::default());
        assert!(matches!(result, Err(AtomicFileError::CreateStaging { .. })));
        assert!(!dir.path().join("missing").exists());
    }

    #[test]
    fn create_dirs_builds_parents() {
        let dir = tempdir().unwrap();
        let destination = dir.path().join("nested").join("path").join("file");

        let staging = create(&destination, &Options::new().create_dirs(true)).unwrap();

        assert_eq!(staging.path.parent(), destination.parent());
    }

    #[cfg(unix)]
    #[test]
    fn requested_mode_is_applied() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let destination = dir.path().join("secret");

        let staging = create(&destination, &Options::new().mode(0o640)).unwrap();

        let mode = fs::metadata(&staging.path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[test]
    fn concurrent_callers_get_distinct_files() {
        let dir = tempdir().unwrap();
        let destination = Arc::new(dir.path().join("shared"));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let destination = Arc::clone(&destination);
                thread::spawn(move || create(&destination, &Options::default()).unwrap().path)
            })
            .collect();

        let paths: HashSet<PathBuf> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(paths.len(), 8);
        assert!(paths.iter().all(|p| p.exists()));
    }
}
