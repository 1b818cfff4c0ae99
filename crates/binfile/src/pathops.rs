//! Path queries that do not need an open handle.

use std::path::Path;

use binfile_core::{ErrorCode, Operation, errno};

use crate::error::FileError;
use crate::log;
use crate::native;

fn finish<T>(op: Operation, path: &Path, result: Result<T, ErrorCode>) -> Result<T, FileError> {
    result.map_err(|code| {
        log::record_failure(op, path, code);
        FileError::new(op, path, code)
    })
}

fn finish_with<T>(
    op: Operation,
    path: &Path,
    result: Result<T, ErrorCode>,
    ec: &mut ErrorCode,
) -> Option<T> {
    if let Err(code) = &result {
        log::record_failure(op, path, *code);
    }
    ec.capture(result)
}

/// Returns `true` if something exists at `path`. Never fails; any error
/// from the native query (including permission errors) reads as absent.
#[must_use]
pub fn exists(path: impl AsRef<Path>) -> bool {
    native::sys_stat(path.as_ref()).is_ok()
}

fn try_file_size(path: &Path) -> Result<u64, ErrorCode> {
    let st = native::sys_stat(path).map_err(|e| ErrorCode::from_native(Operation::Stat, e))?;
    if st.is_dir {
        return Err(ErrorCode::from_native(Operation::Stat, errno::EISDIR));
    }
    Ok(st.size.max(0) as u64)
}

/// Size in bytes of the file at `path`. A directory is an error.
pub fn file_size(path: impl AsRef<Path>) -> Result<u64, FileError> {
    let path = path.as_ref();
    finish(Operation::Stat, path, try_file_size(path))
}

/// [`file_size`], reporting failure through `ec`. Returns `0` on failure.
pub fn file_size_with(path: impl AsRef<Path>, ec: &mut ErrorCode) -> u64 {
    let path = path.as_ref();
    finish_with(Operation::Stat, path, try_file_size(path), ec).unwrap_or(0)
}

fn try_remove(path: &Path) -> Result<bool, ErrorCode> {
    let native_err = |e| ErrorCode::from_native(Operation::Remove, e);
    let st = match native::sys_stat(path) {
        Ok(st) => st,
        Err(errno::ENOENT) => return Ok(false),
        Err(e) => return Err(native_err(e)),
    };
    let removed = if st.is_dir {
        native::sys_rmdir(path)
    } else {
        native::sys_unlink(path)
    };
    match removed {
        Ok(()) => Ok(true),
        // Lost a race with another remover.
        Err(errno::ENOENT) => Ok(false),
        Err(e) => Err(native_err(e)),
    }
}

/// Remove the file or empty directory at `path`.
///
/// Returns `false` if nothing existed there.
pub fn remove(path: impl AsRef<Path>) -> Result<bool, FileError> {
    let path = path.as_ref();
    finish(Operation::Remove, path, try_remove(path))
}

/// [`remove`], reporting failure through `ec`. Returns `false` on failure.
pub fn remove_with(path: impl AsRef<Path>, ec: &mut ErrorCode) -> bool {
    let path = path.as_ref();
    finish_with(Operation::Remove, path, try_remove(path), ec).unwrap_or(false)
}
