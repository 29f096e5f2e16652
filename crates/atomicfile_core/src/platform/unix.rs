//! POSIX rename is atomic and replaces the target, so this is a pass-through.

use crate::error::RenameError;
use std::fs::{self, File};
use std::io;
use std::path::Path;

const OP: &str = "rename";

pub(super) fn rename_atomic(from: &Path, to: &Path) -> Result<(), RenameError> {
    fs::rename(from, to).map_err(|e| RenameError::new(OP, from, to, e))
}

#[cfg(unix)]
pub(super) fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
pub(super) fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_readonly(mode & 0o200 == 0);
    fs::set_permissions(path, permissions)
}

#[cfg(unix)]
#[allow(unsafe_code)]
pub(super) fn close(file: File) -> io::Result<()> {
    use std::os::unix::io::IntoRawFd;

    let fd = file.into_raw_fd();
    // SAFETY: `fd` was just released by `File`, so nothing else owns or closes it.
    if unsafe { libc::close(fd) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
pub(super) fn close(file: File) -> io::Result<()> {
    drop(file);
    Ok(())
}

#[cfg(unix)]
pub(super) fn is_already_closed(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EBADF)
}

#[cfg(not(unix))]
pub(super) fn is_already_closed(_err: &io::Error) -> bool {
    false
}
