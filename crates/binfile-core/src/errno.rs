//! Native error numbers.
//!
//! The values below are the classic Unix numbers shared by Linux and the
//! BSD family. Values that diverge between platform families are selected
//! with `cfg`.

pub const EPERM: i32 = 1;
pub const ENOENT: i32 = 2;
pub const EINTR: i32 = 4;
pub const EIO: i32 = 5;
pub const ENXIO: i32 = 6;
pub const EBADF: i32 = 9;
pub const ENOMEM: i32 = 12;
pub const EACCES: i32 = 13;
pub const EFAULT: i32 = 14;
pub const EBUSY: i32 = 16;
pub const EEXIST: i32 = 17;
pub const ENODEV: i32 = 19;
pub const ENOTDIR: i32 = 20;
pub const EISDIR: i32 = 21;
pub const EINVAL: i32 = 22;
pub const ENFILE: i32 = 23;
pub const EMFILE: i32 = 24;
pub const ETXTBSY: i32 = 26;
pub const EFBIG: i32 = 27;
pub const ENOSPC: i32 = 28;
pub const ESPIPE: i32 = 29;
pub const EROFS: i32 = 30;

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd", target_os = "netbsd", target_os = "openbsd", target_os = "dragonfly"))]
pub const EAGAIN: i32 = 35;
#[cfg(not(any(target_os = "macos", target_os = "ios", target_os = "freebsd", target_os = "netbsd", target_os = "openbsd", target_os = "dragonfly")))]
pub const EAGAIN: i32 = 11;

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd", target_os = "netbsd", target_os = "openbsd", target_os = "dragonfly"))]
pub const ENAMETOOLONG: i32 = 63;
#[cfg(not(any(target_os = "macos", target_os = "ios", target_os = "freebsd", target_os = "netbsd", target_os = "openbsd", target_os = "dragonfly")))]
pub const ENAMETOOLONG: i32 = 36;

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd", target_os = "netbsd", target_os = "openbsd", target_os = "dragonfly"))]
pub const ELOOP: i32 = 62;
#[cfg(not(any(target_os = "macos", target_os = "ios", target_os = "freebsd", target_os = "netbsd", target_os = "openbsd", target_os = "dragonfly")))]
pub const ELOOP: i32 = 40;

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd", target_os = "netbsd", target_os = "dragonfly"))]
pub const EOVERFLOW: i32 = 84;
#[cfg(target_os = "openbsd")]
pub const EOVERFLOW: i32 = 87;
#[cfg(not(any(target_os = "macos", target_os = "ios", target_os = "freebsd", target_os = "netbsd", target_os = "openbsd", target_os = "dragonfly")))]
pub const EOVERFLOW: i32 = 75;

/// Win32 `ERROR_FILE_NOT_FOUND`.
pub const WIN_ERROR_FILE_NOT_FOUND: i32 = 2;
/// Win32 `ERROR_PATH_NOT_FOUND`.
pub const WIN_ERROR_PATH_NOT_FOUND: i32 = 3;
/// Win32 `ERROR_ACCESS_DENIED`.
pub const WIN_ERROR_ACCESS_DENIED: i32 = 5;
/// Win32 `ERROR_INVALID_PARAMETER`.
pub const WIN_ERROR_INVALID_PARAMETER: i32 = 87;
/// Win32 `ERROR_NEGATIVE_SEEK`.
pub const WIN_ERROR_NEGATIVE_SEEK: i32 = 131;
/// Win32 `ERROR_FILE_EXISTS`.
pub const WIN_ERROR_FILE_EXISTS: i32 = 80;
/// Win32 `ERROR_ALREADY_EXISTS`.
pub const WIN_ERROR_ALREADY_EXISTS: i32 = 183;

/// The native value reported for a seek whose target would be negative.
#[cfg(windows)]
pub const NEGATIVE_SEEK: i32 = WIN_ERROR_NEGATIVE_SEEK;
/// The native value reported for a seek whose target would be negative.
#[cfg(not(windows))]
pub const NEGATIVE_SEEK: i32 = EINVAL;

/// The native value reported for a rejected open-flag combination.
#[cfg(windows)]
pub const INVALID_ARGUMENT: i32 = WIN_ERROR_INVALID_PARAMETER;
/// The native value reported for a rejected open-flag combination.
#[cfg(not(windows))]
pub const INVALID_ARGUMENT: i32 = EINVAL;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_values_match_kernel_headers() {
        assert_eq!(ENOENT, 2);
        assert_eq!(EBADF, 9);
        assert_eq!(EACCES, 13);
        assert_eq!(EINVAL, 22);
        assert_eq!(ESPIPE, 29);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_divergent_values() {
        assert_eq!(EOVERFLOW, 75);
        assert_eq!(ENAMETOOLONG, 36);
        assert_eq!(ELOOP, 40);
        assert_eq!(EAGAIN, 11);
    }

    #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd",
        target_os = "dragonfly"
    ))]
    #[test]
    fn bsd_divergent_values() {
        assert_eq!(EAGAIN, 35);
        assert_eq!(EOVERFLOW, if cfg!(target_os = "openbsd") { 87 } else { 84 });
        assert_eq!(ENAMETOOLONG, 63);
        assert_eq!(ELOOP, 62);
    }

    #[cfg(unix)]
    #[test]
    fn divergent_values_match_libc() {
        assert_eq!(EAGAIN, libc::EAGAIN);
        assert_eq!(EOVERFLOW, libc::EOVERFLOW);
        assert_eq!(ENAMETOOLONG, libc::ENAMETOOLONG);
        assert_eq!(ELOOP, libc::ELOOP);
    }

    #[cfg(not(windows))]
    #[test]
    fn negative_seek_is_einval_on_posix() {
        assert_eq!(NEGATIVE_SEEK, EINVAL);
    }
}
