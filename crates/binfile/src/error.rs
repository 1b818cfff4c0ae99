//! Error types returned by the `Result`-based entry points.
//!
//! Each carries the same [`ErrorCode`] the `*_with` entry points store in
//! their out-parameter, so both reporting channels agree on the native
//! value and its classification.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use binfile_core::{ErrorCode, ErrorKind, Operation};

/// A failed operation on a [`BinaryFile`](crate::BinaryFile) or a path query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{op} {}: {code}", .path.display())]
pub struct FileError {
    op: Operation,
    path: PathBuf,
    code: ErrorCode,
}

impl FileError {
    #[must_use]
    pub fn new(op: Operation, path: impl Into<PathBuf>, code: ErrorCode) -> Self {
        Self {
            op,
            path: path.into(),
            code,
        }
    }

    /// The operation that failed.
    #[must_use]
    pub fn operation(&self) -> Operation {
        self.op
    }

    /// The path bound to the handle (or queried), verbatim.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Native value plus classification.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Shorthand for `code().kind()`.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    /// Shorthand for `code().value()`.
    #[must_use]
    pub fn raw_os_error(&self) -> i32 {
        self.code.value()
    }
}

/// A failed read of the native process clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("process times: {code}")]
pub struct ClockError {
    code: ErrorCode,
}

impl ClockError {
    #[must_use]
    pub fn new(code: ErrorCode) -> Self {
        Self { code }
    }

    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }
}

fn io_kind(kind: ErrorKind) -> io::ErrorKind {
    match kind {
        ErrorKind::NotFound => io::ErrorKind::NotFound,
        ErrorKind::AlreadyExists => io::ErrorKind::AlreadyExists,
        ErrorKind::InvalidSeek | ErrorKind::InvalidInput => io::ErrorKind::InvalidInput,
        ErrorKind::AccessDenied => io::ErrorKind::PermissionDenied,
        ErrorKind::Interrupted => io::ErrorKind::Interrupted,
        ErrorKind::IoError | ErrorKind::Unknown => io::ErrorKind::Other,
    }
}

impl From<FileError> for io::Error {
    fn from(err: FileError) -> Self {
        match err.kind() {
            // Classification may refine the OS view (negative seek), so keep
            // the portable kind and carry the native value in the message.
            ErrorKind::InvalidSeek => io::Error::new(io_kind(err.kind()), err),
            _ => io::Error::from_raw_os_error(err.raw_os_error()),
        }
    }
}

impl From<ClockError> for io::Error {
    fn from(err: ClockError) -> Self {
        io::Error::new(io_kind(err.code.kind()), err)
    }
}
