//! Windows rename via `MoveFileExW`.
//!
//! `std::fs::rename` does not promise to replace an existing target here, so
//! the move is requested explicitly with `MOVEFILE_REPLACE_EXISTING`, plus
//! `MOVEFILE_WRITE_THROUGH` so the call does not return before the move is
//! flushed past the cache.

#![allow(unsafe_code)]

use crate::error::RenameError;
use std::fs::{self, File};
use std::io;
use std::os::windows::ffi::OsStrExt;
use std::os::windows::io::IntoRawHandle;
use std::path::Path;
use ::windows::Win32::Foundation::{CloseHandle, ERROR_INVALID_HANDLE, HANDLE};
use ::windows::Win32::Storage::FileSystem::{
    MoveFileExW, MOVEFILE_REPLACE_EXISTING, MOVEFILE_WRITE_THROUGH,
};
use ::windows::core::PCWSTR;

const OP: &str = "MoveFileExW";

/// `ERROR_INVALID_HANDLE` wrapped as an HRESULT, as `windows::core::Error`
/// reports it.
const HRESULT_INVALID_HANDLE: u32 = 0x8007_0000 | ERROR_INVALID_HANDLE.0;

/// Encodes a path as a nul-terminated UTF-16 buffer.
fn to_wide(path: &Path) -> io::Result<Vec<u16>> {
    let mut wide: Vec<u16> = path.as_os_str().encode_wide().collect();
    if wide.contains(&0) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "path contains an interior nul",
        ));
    }
    wide.push(0);
    Ok(wide)
}

pub(super) fn rename_atomic(from: &Path, to: &Path) -> Result<(), RenameError> {
    let src = to_wide(from).map_err(|e| RenameError::new(OP, from, to, e))?;
    let dest = to_wide(to).map_err(|e| RenameError::new(OP, from, to, e))?;

    // SAFETY: Both buffers are nul-terminated and outlive the call.
    unsafe {
        MoveFileExW(
            PCWSTR(src.as_ptr()),
            PCWSTR(dest.as_ptr()),
            MOVEFILE_REPLACE_EXISTING | MOVEFILE_WRITE_THROUGH,
        )
    }
    .map_err(|e| RenameError::new(OP, from, to, io::Error::from(e)))
}

pub(super) fn close(file: File) -> io::Result<()> {
    let handle = HANDLE(file.into_raw_handle());
    // SAFETY: The handle was just released by `File`, so nothing else owns or closes it.
    unsafe { CloseHandle(handle) }.map_err(io::Error::from)
}

pub(super) fn is_already_closed(err: &io::Error) -> bool {
    matches!(
        err.raw_os_error().map(|code| code as u32),
        Some(code) if code == ERROR_INVALID_HANDLE.0 || code == HRESULT_INVALID_HANDLE
    )
}

pub(super) fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_readonly(mode & 0o200 == 0);
    fs::set_permissions(path, permissions)
}
