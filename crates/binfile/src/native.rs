//! Typed wrappers over the native calls used by the handle, the path
//! queries and the process clock.
//!
//! Every wrapper performs exactly one native call and converts a failure
//! into the raw `errno` value. Retrying (`EINTR`, short transfers) is the
//! caller's decision.
//!
//! On glibc the explicit 64-bit variants (`open64`, `lseek64`, `fstat64`)
//! are used so that offsets beyond 2 GiB work on 32-bit targets too.

use std::ffi::{CString, c_int, c_void};
use std::mem::MaybeUninit;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use binfile_core::errno;
use binfile_core::flags::{Access, OpenPlan};

#[cfg(all(target_os = "linux", target_env = "gnu"))]
use libc::{
    fstat64 as native_fstat, lseek64 as native_lseek, off64_t as NativeOff, open64 as native_open,
    stat64 as NativeStat, stat64 as native_stat,
};
#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
use libc::{
    fstat as native_fstat, lseek as native_lseek, off_t as NativeOff, open as native_open,
    stat as NativeStat, stat as native_stat,
};

/// Native descriptor type.
pub type RawFd = c_int;

/// Sentinel stored in a handle that holds no descriptor.
pub const CLOSED_FD: RawFd = -1;

/// Permission bits for newly created files, before the umask.
const CREATE_MODE: libc::c_uint = 0o666;

#[inline]
fn last_errno(default_errno: i32) -> i32 {
    std::io::Error::last_os_error()
        .raw_os_error()
        .unwrap_or(default_errno)
}

/// Convert a path to a NUL-terminated string. Interior NUL is `EINVAL`.
fn c_path(path: &Path) -> Result<CString, i32> {
    CString::new(path.as_os_str().as_bytes()).map_err(|_| errno::EINVAL)
}

/// Lower a validated open plan to `O_*` bits.
#[must_use]
pub fn plan_to_oflags(plan: OpenPlan) -> c_int {
    let mut oflags = match plan.access {
        Access::ReadOnly => libc::O_RDONLY,
        Access::WriteOnly => libc::O_WRONLY,
        Access::ReadWrite => libc::O_RDWR,
    };
    if plan.create {
        oflags |= libc::O_CREAT;
    }
    if plan.truncate {
        oflags |= libc::O_TRUNC;
    }
    oflags | libc::O_CLOEXEC
}

// ---------------------------------------------------------------------------
// Descriptor calls
// ---------------------------------------------------------------------------

/// `open(path, oflags, 0666)`.
pub fn sys_open(path: &Path, plan: OpenPlan) -> Result<RawFd, i32> {
    let c_path = c_path(path)?;
    // SAFETY: c_path is a valid NUL-terminated string that outlives the call.
    let fd = unsafe { native_open(c_path.as_ptr(), plan_to_oflags(plan), CREATE_MODE) };
    if fd < 0 {
        Err(last_errno(errno::EIO))
    } else {
        Ok(fd)
    }
}

/// `lseek(fd, offset, whence)`.
pub fn sys_lseek(fd: RawFd, offset: i64, whence: c_int) -> Result<i64, i32> {
    let offset = NativeOff::try_from(offset).map_err(|_| errno::EOVERFLOW)?;
    // SAFETY: lseek is safe on any fd value (a bad fd returns EBADF).
    let pos = unsafe { native_lseek(fd, offset, whence) };
    if pos < 0 {
        Err(last_errno(errno::EINVAL))
    } else {
        Ok(i64::from(pos))
    }
}

/// `read(fd, buf, buf.len())`.
pub fn sys_read(fd: RawFd, buf: &mut [u8]) -> Result<usize, i32> {
    // SAFETY: buf is a valid writable region of buf.len() bytes.
    let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast::<c_void>(), buf.len()) };
    if n < 0 {
        Err(last_errno(errno::EIO))
    } else {
        Ok(n as usize)
    }
}

/// `write(fd, buf, buf.len())`.
pub fn sys_write(fd: RawFd, buf: &[u8]) -> Result<usize, i32> {
    // SAFETY: buf is a valid readable region of buf.len() bytes.
    let n = unsafe { libc::write(fd, buf.as_ptr().cast::<c_void>(), buf.len()) };
    if n < 0 {
        Err(last_errno(errno::EIO))
    } else {
        Ok(n as usize)
    }
}

/// `close(fd)`. The descriptor is released even when this reports an error.
pub fn sys_close(fd: RawFd) -> Result<(), i32> {
    // SAFETY: close is safe on any fd value (a bad fd returns EBADF).
    let rc = unsafe { libc::close(fd) };
    if rc != 0 {
        Err(last_errno(errno::EIO))
    } else {
        Ok(())
    }
}

/// `fsync(fd)`.
pub fn sys_fsync(fd: RawFd) -> Result<(), i32> {
    // SAFETY: fsync is safe on any fd value.
    let rc = unsafe { libc::fsync(fd) };
    if rc != 0 {
        Err(last_errno(errno::EIO))
    } else {
        Ok(())
    }
}

/// Size in bytes of the file behind `fd`.
pub fn sys_fstat_size(fd: RawFd) -> Result<i64, i32> {
    let mut st = MaybeUninit::<NativeStat>::zeroed();
    // SAFETY: st points to writable storage for one stat structure.
    let rc = unsafe { native_fstat(fd, st.as_mut_ptr()) };
    if rc != 0 {
        return Err(last_errno(errno::EIO));
    }
    // SAFETY: fstat succeeded and filled the structure.
    let st = unsafe { st.assume_init() };
    Ok(i64::from(st.st_size))
}

// ---------------------------------------------------------------------------
// Path calls
// ---------------------------------------------------------------------------

/// The subset of `stat` results the path queries need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub size: i64,
    pub is_dir: bool,
    pub is_regular: bool,
}

/// `stat(path)`.
pub fn sys_stat(path: &Path) -> Result<FileStat, i32> {
    let c_path = c_path(path)?;
    let mut st = MaybeUninit::<NativeStat>::zeroed();
    // SAFETY: c_path is NUL-terminated; st is writable storage for one stat.
    let rc = unsafe { native_stat(c_path.as_ptr(), st.as_mut_ptr()) };
    if rc != 0 {
        return Err(last_errno(errno::EIO));
    }
    // SAFETY: stat succeeded and filled the structure.
    let st = unsafe { st.assume_init() };
    let fmt = st.st_mode & libc::S_IFMT;
    Ok(FileStat {
        size: i64::from(st.st_size),
        is_dir: fmt == libc::S_IFDIR,
        is_regular: fmt == libc::S_IFREG,
    })
}

/// `unlink(path)`.
pub fn sys_unlink(path: &Path) -> Result<(), i32> {
    let c_path = c_path(path)?;
    // SAFETY: c_path is a valid NUL-terminated string.
    let rc = unsafe { libc::unlink(c_path.as_ptr()) };
    if rc != 0 {
        Err(last_errno(errno::EIO))
    } else {
        Ok(())
    }
}

/// `rmdir(path)`.
pub fn sys_rmdir(path: &Path) -> Result<(), i32> {
    let c_path = c_path(path)?;
    // SAFETY: c_path is a valid NUL-terminated string.
    let rc = unsafe { libc::rmdir(c_path.as_ptr()) };
    if rc != 0 {
        Err(last_errno(errno::EIO))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Process clock
// ---------------------------------------------------------------------------

/// Raw `times(2)` result, in clock ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTimes {
    pub elapsed: i64,
    pub user: i64,
    pub system: i64,
}

/// `times(&tms)`. User and system include reaped children.
pub fn sys_times() -> Result<RawTimes, i32> {
    let mut tm = MaybeUninit::<libc::tms>::zeroed();
    // SAFETY: tm points to writable storage for one tms structure.
    let ticks = unsafe { libc::times(tm.as_mut_ptr()) };
    if ticks as i64 == -1 {
        return Err(last_errno(errno::EINVAL));
    }
    // SAFETY: times succeeded and filled the structure.
    let tm = unsafe { tm.assume_init() };
    Ok(RawTimes {
        elapsed: ticks as i64,
        user: tm.tms_utime as i64 + tm.tms_cutime as i64,
        system: tm.tms_stime as i64 + tm.tms_cstime as i64,
    })
}

/// `sysconf(_SC_CLK_TCK)`: clock ticks per second.
pub fn sys_clock_ticks() -> Result<i64, i32> {
    // SAFETY: sysconf has no memory-safety preconditions.
    let hz = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if hz <= 0 {
        Err(last_errno(errno::EINVAL))
    } else {
        Ok(hz as i64)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use binfile_core::OpenFlags;

    #[test]
    fn oflags_for_write_create_truncate() {
        let plan = (OpenFlags::WRITE | OpenFlags::TRUNCATE).plan().unwrap();
        let o = plan_to_oflags(plan);
        assert_eq!(o & libc::O_ACCMODE, libc::O_WRONLY);
        assert_ne!(o & libc::O_CREAT, 0);
        assert_ne!(o & libc::O_TRUNC, 0);
        assert_ne!(o & libc::O_CLOEXEC, 0);
    }

    #[test]
    fn oflags_for_read_only_do_not_create() {
        let o = plan_to_oflags(OpenFlags::READ.plan().unwrap());
        assert_eq!(o & libc::O_ACCMODE, libc::O_RDONLY);
        assert_eq!(o & libc::O_CREAT, 0);
        assert_eq!(o & libc::O_TRUNC, 0);
    }

    #[test]
    fn close_bad_fd_returns_ebadf() {
        assert_eq!(sys_close(-1), Err(errno::EBADF));
    }

    #[test]
    fn lseek_bad_fd_returns_ebadf() {
        assert_eq!(sys_lseek(-1, 0, libc::SEEK_SET), Err(errno::EBADF));
    }

    #[test]
    fn interior_nul_is_einval() {
        let plan = OpenFlags::READ.plan().unwrap();
        assert_eq!(sys_open(Path::new("a\0b"), plan), Err(errno::EINVAL));
    }

    #[test]
    fn stat_missing_path_is_enoent() {
        let err = sys_stat(Path::new("/definitely/not/here/binfile")).unwrap_err();
        assert_eq!(err, errno::ENOENT);
    }

    #[test]
    fn clock_ticks_positive() {
        assert!(sys_clock_ticks().unwrap() > 0);
    }

    #[test]
    fn times_succeeds() {
        let t = sys_times().unwrap();
        assert!(t.user >= 0);
        assert!(t.system >= 0);
    }
}
