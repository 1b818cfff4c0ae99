//! Seek references and target computation.
//!
//! The handle never lets the native layer compute a relative position: it
//! resolves the absolute target here first and only then repositions the
//! descriptor, so a rejected seek leaves the descriptor untouched.

use crate::errno;
use crate::error::{ErrorCode, Operation};

/// Seek from beginning of file.
pub const SEEK_SET: i32 = 0;
/// Seek from current position.
pub const SEEK_CUR: i32 = 1;
/// Seek from end of file.
pub const SEEK_END: i32 = 2;

/// Origin against which a seek offset is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeekDir {
    Begin,
    Current,
    End,
}

impl SeekDir {
    /// The POSIX `whence` value for this origin.
    #[must_use]
    pub const fn whence(self) -> i32 {
        match self {
            Self::Begin => SEEK_SET,
            Self::Current => SEEK_CUR,
            Self::End => SEEK_END,
        }
    }

    /// Returns `true` if resolving this origin needs a native query
    /// (current position or file size).
    #[must_use]
    pub const fn needs_base(self) -> bool {
        !matches!(self, Self::Begin)
    }
}

/// Compute `base + offset`, rejecting negative or overflowing targets.
///
/// `base` is `0` for [`SeekDir::Begin`], the current position for
/// [`SeekDir::Current`] and the file size for [`SeekDir::End`].
pub fn resolve_target(base: i64, offset: i64) -> Result<i64, ErrorCode> {
    match base.checked_add(offset) {
        Some(target) if target >= 0 => Ok(target),
        Some(_) => Err(ErrorCode::from_native(
            Operation::Seek,
            errno::NEGATIVE_SEEK,
        )),
        None => Err(ErrorCode::from_native(Operation::Seek, overflow_code())),
    }
}

#[cfg(not(windows))]
const fn overflow_code() -> i32 {
    errno::EOVERFLOW
}

#[cfg(windows)]
const fn overflow_code() -> i32 {
    errno::NEGATIVE_SEEK
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn whence_values() {
        assert_eq!(SeekDir::Begin.whence(), 0);
        assert_eq!(SeekDir::Current.whence(), 1);
        assert_eq!(SeekDir::End.whence(), 2);
    }

    #[test]
    fn positive_targets_resolve() {
        assert_eq!(resolve_target(0, 0), Ok(0));
        assert_eq!(resolve_target(10, 32 * 1024), Ok(10 + 32 * 1024));
        assert_eq!(resolve_target(100, -100), Ok(0));
    }

    #[test]
    fn targets_beyond_32_bits_resolve() {
        let big = 5 * (1i64 << 32);
        assert_eq!(resolve_target(big, 17), Ok(big + 17));
    }

    #[test]
    fn negative_target_is_invalid_seek() {
        let err = resolve_target(0, -1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSeek);
        assert_eq!(err.value(), errno::NEGATIVE_SEEK);

        let err = resolve_target(10, -11).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSeek);
    }

    #[test]
    fn overflow_is_invalid_seek() {
        let err = resolve_target(i64::MAX, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSeek);
    }

    #[test]
    fn only_begin_skips_base_query() {
        assert!(!SeekDir::Begin.needs_base());
        assert!(SeekDir::Current.needs_base());
        assert!(SeekDir::End.needs_base());
    }
}
