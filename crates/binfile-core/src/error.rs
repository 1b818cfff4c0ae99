//! Portable error classification.
//!
//! Native calls report failures as a raw platform number. [`classify`] maps
//! that number onto an [`ErrorKind`]; [`classify_for`] refines the mapping
//! with the operation that failed, which is how a negative seek classifies
//! as [`ErrorKind::InvalidSeek`] on every platform even though POSIX only
//! reports a generic `EINVAL` for it.

use std::fmt;

use crate::errno;

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// Portable classification of a native error value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The path (or a component of it) does not exist.
    NotFound,
    /// Exclusive creation found an existing file.
    AlreadyExists,
    /// A seek would have produced a negative or unrepresentable position,
    /// or the descriptor cannot seek.
    InvalidSeek,
    /// An argument was rejected before or by the native call.
    InvalidInput,
    /// Permission denied, or the descriptor lacks the required access mode.
    AccessDenied,
    /// The native call was interrupted by a signal.
    Interrupted,
    /// Generic native I/O failure.
    IoError,
    /// A value no rule recognises.
    #[default]
    Unknown,
}

impl ErrorKind {
    /// Stable lowercase name, used in structured logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::InvalidSeek => "invalid_seek",
            Self::InvalidInput => "invalid_input",
            Self::AccessDenied => "access_denied",
            Self::Interrupted => "interrupted",
            Self::IoError => "io_error",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NotFound => "no such file or directory",
            Self::AlreadyExists => "file already exists",
            Self::InvalidSeek => "invalid seek",
            Self::InvalidInput => "invalid argument",
            Self::AccessDenied => "access denied",
            Self::Interrupted => "interrupted",
            Self::IoError => "input/output error",
            Self::Unknown => "unknown error",
        };
        f.write_str(text)
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// The native operation that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Open,
    Seek,
    Read,
    Write,
    Close,
    Sync,
    Size,
    Stat,
    Remove,
    Times,
}

impl Operation {
    /// Stable lowercase name, used in messages and structured logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Seek => "seek",
            Self::Read => "read",
            Self::Write => "write",
            Self::Close => "close",
            Self::Sync => "sync",
            Self::Size => "size",
            Self::Stat => "stat",
            Self::Remove => "remove",
            Self::Times => "times",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Map a native error value to a portable kind.
#[cfg(not(windows))]
#[must_use]
pub fn classify(native: i32) -> ErrorKind {
    match native {
        errno::ENOENT | errno::ENOTDIR | errno::ENXIO | errno::ENODEV => ErrorKind::NotFound,
        errno::EEXIST => ErrorKind::AlreadyExists,
        errno::ESPIPE => ErrorKind::InvalidSeek,
        errno::EINVAL | errno::ENAMETOOLONG | errno::EFAULT => ErrorKind::InvalidInput,
        errno::EACCES | errno::EPERM | errno::EROFS | errno::EBADF | errno::EISDIR
        | errno::ETXTBSY => ErrorKind::AccessDenied,
        errno::EINTR => ErrorKind::Interrupted,
        errno::EIO
        | errno::ENOSPC
        | errno::EFBIG
        | errno::EOVERFLOW
        | errno::ENOMEM
        | errno::EMFILE
        | errno::ENFILE
        | errno::EAGAIN
        | errno::EBUSY
        | errno::ELOOP => ErrorKind::IoError,
        _ => ErrorKind::Unknown,
    }
}

/// Map a native error value to a portable kind.
#[cfg(windows)]
#[must_use]
pub fn classify(native: i32) -> ErrorKind {
    match native {
        errno::WIN_ERROR_FILE_NOT_FOUND | errno::WIN_ERROR_PATH_NOT_FOUND => ErrorKind::NotFound,
        errno::WIN_ERROR_FILE_EXISTS | errno::WIN_ERROR_ALREADY_EXISTS => {
            ErrorKind::AlreadyExists
        }
        errno::WIN_ERROR_NEGATIVE_SEEK => ErrorKind::InvalidSeek,
        errno::WIN_ERROR_INVALID_PARAMETER => ErrorKind::InvalidInput,
        errno::WIN_ERROR_ACCESS_DENIED => ErrorKind::AccessDenied,
        0 => ErrorKind::Unknown,
        _ => ErrorKind::IoError,
    }
}

/// Map a native error value to a portable kind, taking the failing
/// operation into account.
///
/// A seek that fails with a generic invalid-argument or overflow code
/// failed because the target position was out of range.
#[must_use]
pub fn classify_for(op: Operation, native: i32) -> ErrorKind {
    let kind = classify(native);
    match (op, kind) {
        (Operation::Seek, ErrorKind::InvalidInput) => ErrorKind::InvalidSeek,
        (Operation::Seek, _) if native == errno::EOVERFLOW && cfg!(not(windows)) => {
            ErrorKind::InvalidSeek
        }
        _ => kind,
    }
}

// ---------------------------------------------------------------------------
// Error code slot
// ---------------------------------------------------------------------------

/// A native error value together with its classification.
///
/// The default value is the cleared state: `value() == 0` and
/// [`is_err`](Self::is_err) returns `false`. Non-panicking operations take
/// `&mut ErrorCode` and fill it in on failure.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    value: i32,
    kind: ErrorKind,
}

impl ErrorCode {
    /// The cleared state.
    pub const NONE: Self = Self {
        value: 0,
        kind: ErrorKind::Unknown,
    };

    /// Classify `native` as a failure of `op`.
    #[must_use]
    pub fn from_native(op: Operation, native: i32) -> Self {
        Self {
            value: native,
            kind: classify_for(op, native),
        }
    }

    /// Build a code with an explicit kind (for failures detected before
    /// any native call).
    #[must_use]
    pub const fn with_kind(value: i32, kind: ErrorKind) -> Self {
        Self { value, kind }
    }

    /// The raw native error value.
    #[must_use]
    pub const fn value(&self) -> i32 {
        self.value
    }

    /// The portable classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns `true` if this slot holds a failure.
    #[must_use]
    pub const fn is_err(&self) -> bool {
        self.value != 0
    }

    /// Reset to the cleared state.
    pub fn clear(&mut self) {
        *self = Self::NONE;
    }

    /// Store `result`'s error (or clear) and return its success value.
    ///
    /// This is the adapter every non-panicking entry point uses.
    pub fn capture<T>(&mut self, result: Result<T, ErrorCode>) -> Option<T> {
        match result {
            Ok(v) => {
                self.clear();
                Some(v)
            }
            Err(e) => {
                *self = e;
                None
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (os error {})", self.kind, self.value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
