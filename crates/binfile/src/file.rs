//! Binary file handle.
//!
//! [`BinaryFile`] binds one path to one native descriptor. Every operation
//! exists in two forms that share a single implementation:
//!
//! - `op(..) -> Result<T, FileError>`: the error carries the bound path,
//!   the failing [`Operation`] and the classified native value.
//! - `op_with(.., &mut ErrorCode) -> T`: never fails; clears the code on
//!   success, sets it on failure and returns a sentinel.
//!
//! Design: the internal `try_*` methods return `Result<T, ErrorCode>` and
//! the two public adapters (`finish`, `finish_with`) only translate that
//! result, so both channels report the same native value and kind.

use std::path::{Path, PathBuf};

use binfile_core::errno;
use binfile_core::seek::SEEK_CUR;
use binfile_core::{ErrorCode, OpenFlags, Operation, SeekDir, resolve_target};

use crate::error::FileError;
use crate::log;
use crate::native::{self, CLOSED_FD, RawFd};

/// Position and byte-count type: signed 64-bit.
pub type Offset = i64;

/// A binary file opened for raw, unbuffered, random access.
///
/// The handle owns its descriptor exclusively and closes it on drop. All
/// mutating operations take `&mut self`; sharing one handle between
/// threads requires external synchronisation by the caller.
#[derive(Debug)]
pub struct BinaryFile {
    path: PathBuf,
    /// Native descriptor (`CLOSED_FD` if not open).
    fd: RawFd,
    flags: OpenFlags,
}

impl BinaryFile {
    /// Bind `path` without opening anything.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fd: CLOSED_FD,
            flags: OpenFlags::empty(),
        }
    }

    /// Open `path` with `flags`.
    pub fn open(path: impl Into<PathBuf>, flags: OpenFlags) -> Result<Self, FileError> {
        let mut file = Self::new(path);
        file.reopen(flags)?;
        Ok(file)
    }

    /// Open `path` with `flags`, reporting failure through `ec`.
    ///
    /// On failure the returned handle is not open but is otherwise valid.
    pub fn open_with(path: impl Into<PathBuf>, flags: OpenFlags, ec: &mut ErrorCode) -> Self {
        let mut file = Self::new(path);
        file.reopen_with(flags, ec);
        file
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The path given at construction, verbatim.
    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` between a successful open and close/drop.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.fd != CLOSED_FD
    }

    /// Flags of the most recent successful open.
    #[must_use]
    pub fn flags(&self) -> OpenFlags {
        self.flags
    }

    /// The native descriptor, if open. Ownership stays with the handle.
    #[must_use]
    pub fn raw_fd(&self) -> Option<RawFd> {
        self.is_open().then_some(self.fd)
    }

    /// Give up ownership of the descriptor without closing it.
    #[must_use]
    pub fn into_raw_fd(mut self) -> Option<RawFd> {
        let fd = std::mem::replace(&mut self.fd, CLOSED_FD);
        (fd != CLOSED_FD).then_some(fd)
    }

    // -----------------------------------------------------------------------
    // Open
    // -----------------------------------------------------------------------

    /// Open the bound path with `flags`, closing any descriptor held first.
    pub fn reopen(&mut self, flags: OpenFlags) -> Result<(), FileError> {
        let result = self.try_open(flags);
        self.finish(Operation::Open, result)
    }

    /// [`reopen`](Self::reopen), reporting failure through `ec`.
    pub fn reopen_with(&mut self, flags: OpenFlags, ec: &mut ErrorCode) {
        let result = self.try_open(flags);
        self.finish_with(Operation::Open, result, ec);
    }

    // -----------------------------------------------------------------------
    // Seek
    // -----------------------------------------------------------------------

    /// Reposition to `offset` relative to `from`; returns the new absolute
    /// position. `seek(0, SeekDir::Current)` queries the position.
    ///
    /// A target below zero fails with [`ErrorKind::InvalidSeek`] and leaves
    /// the position unchanged. Targets past end-of-file are allowed.
    ///
    /// [`ErrorKind::InvalidSeek`]: binfile_core::ErrorKind::InvalidSeek
    pub fn seek(&mut self, offset: Offset, from: SeekDir) -> Result<Offset, FileError> {
        let result = self.try_seek(offset, from);
        self.finish(Operation::Seek, result)
    }

    /// [`seek`](Self::seek), reporting failure through `ec`. Returns `-1`
    /// on failure.
    pub fn seek_with(&mut self, offset: Offset, from: SeekDir, ec: &mut ErrorCode) -> Offset {
        let result = self.try_seek(offset, from);
        self.finish_with(Operation::Seek, result, ec).unwrap_or(-1)
    }

    // -----------------------------------------------------------------------
    // Read / write
    // -----------------------------------------------------------------------

    /// Read up to `buf.len()` bytes at the current position.
    ///
    /// Returns `0` at or past end-of-file. Bytes of `buf` past the returned
    /// count are left untouched; short reads are not errors.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, FileError> {
        let result = self.try_read(buf);
        self.finish(Operation::Read, result)
    }

    /// [`read`](Self::read), reporting failure through `ec`. Returns `0`
    /// on failure.
    pub fn read_with(&mut self, buf: &mut [u8], ec: &mut ErrorCode) -> usize {
        let result = self.try_read(buf);
        self.finish_with(Operation::Read, result, ec).unwrap_or(0)
    }

    /// Write all of `buf` at the current position.
    ///
    /// Writing past end-of-file extends the file; skipped bytes read back
    /// as zero. A write that cannot complete is a failure of the whole call.
    pub fn write(&mut self, buf: &[u8]) -> Result<(), FileError> {
        let result = self.try_write(buf);
        self.finish(Operation::Write, result)
    }

    /// [`write`](Self::write), reporting failure through `ec`.
    pub fn write_with(&mut self, buf: &[u8], ec: &mut ErrorCode) {
        let result = self.try_write(buf);
        self.finish_with(Operation::Write, result, ec);
    }

    // -----------------------------------------------------------------------
    // Metadata / durability
    // -----------------------------------------------------------------------

    /// Current size of the open file. Does not move the position.
    pub fn size(&mut self) -> Result<u64, FileError> {
        let result = self.try_size();
        self.finish(Operation::Size, result)
    }

    /// [`size`](Self::size), reporting failure through `ec`. Returns `0`
    /// on failure.
    pub fn size_with(&mut self, ec: &mut ErrorCode) -> u64 {
        let result = self.try_size();
        self.finish_with(Operation::Size, result, ec).unwrap_or(0)
    }

    /// Flush file data and metadata to the device.
    pub fn sync(&mut self) -> Result<(), FileError> {
        let result = self.try_sync();
        self.finish(Operation::Sync, result)
    }

    /// [`sync`](Self::sync), reporting failure through `ec`.
    pub fn sync_with(&mut self, ec: &mut ErrorCode) {
        let result = self.try_sync();
        self.finish_with(Operation::Sync, result, ec);
    }

    // -----------------------------------------------------------------------
    // Close
    // -----------------------------------------------------------------------

    /// Release the descriptor. Closing a closed handle is a no-op.
    ///
    /// The descriptor is released even when an error is reported.
    pub fn close(&mut self) -> Result<(), FileError> {
        let result = self.try_close();
        self.finish(Operation::Close, result)
    }

    /// [`close`](Self::close), reporting failure through `ec`.
    pub fn close_with(&mut self, ec: &mut ErrorCode) {
        let result = self.try_close();
        self.finish_with(Operation::Close, result, ec);
    }

    // -----------------------------------------------------------------------
    // Adapters
    // -----------------------------------------------------------------------

    fn finish<T>(&self, op: Operation, result: Result<T, ErrorCode>) -> Result<T, FileError> {
        result.map_err(|code| {
            log::record_failure(op, &self.path, code);
            FileError::new(op, self.path.clone(), code)
        })
    }

    fn finish_with<T>(
        &self,
        op: Operation,
        result: Result<T, ErrorCode>,
        ec: &mut ErrorCode,
    ) -> Option<T> {
        if let Err(code) = &result {
            log::record_failure(op, &self.path, *code);
        }
        ec.capture(result)
    }

    // -----------------------------------------------------------------------
    // Implementation
    // -----------------------------------------------------------------------

    fn live_fd(&self, op: Operation) -> Result<RawFd, ErrorCode> {
        if self.is_open() {
            Ok(self.fd)
        } else {
            Err(ErrorCode::from_native(op, errno::EBADF))
        }
    }

    fn try_open(&mut self, flags: OpenFlags) -> Result<(), ErrorCode> {
        let plan = flags.plan()?;
        if let Err(code) = self.try_close() {
            log::record_implicit_close_failure(&self.path, code);
        }
        let fd = native::sys_open(&self.path, plan)
            .map_err(|e| ErrorCode::from_native(Operation::Open, e))?;
        self.fd = fd;
        self.flags = flags;
        log::record_lifecycle(Operation::Open, &self.path);
        Ok(())
    }

    fn try_seek(&mut self, offset: Offset, from: SeekDir) -> Result<Offset, ErrorCode> {
        let fd = self.live_fd(Operation::Seek)?;
        let native_err = |e| ErrorCode::from_native(Operation::Seek, e);
        let base = if !from.needs_base() {
            0
        } else if from == SeekDir::Current {
            native::sys_lseek(fd, 0, SEEK_CUR).map_err(native_err)?
        } else {
            native::sys_fstat_size(fd).map_err(native_err)?
        };
        let target = resolve_target(base, offset)?;
        native::sys_lseek(fd, target, SeekDir::Begin.whence()).map_err(native_err)
    }

    fn try_read(&mut self, buf: &mut [u8]) -> Result<usize, ErrorCode> {
        let fd = self.live_fd(Operation::Read)?;
        loop {
            match native::sys_read(fd, buf) {
                Ok(n) => return Ok(n),
                Err(errno::EINTR) => continue,
                Err(e) => return Err(ErrorCode::from_native(Operation::Read, e)),
            }
        }
    }

    fn try_write(&mut self, buf: &[u8]) -> Result<(), ErrorCode> {
        let fd = self.live_fd(Operation::Write)?;
        let mut remaining = buf;
        while !remaining.is_empty() {
            match native::sys_write(fd, remaining) {
                Ok(0) => return Err(ErrorCode::from_native(Operation::Write, errno::EIO)),
                Ok(n) => remaining = &remaining[n..],
                Err(errno::EINTR) => continue,
                Err(e) => return Err(ErrorCode::from_native(Operation::Write, e)),
            }
        }
        Ok(())
    }

    fn try_size(&mut self) -> Result<u64, ErrorCode> {
        let fd = self.live_fd(Operation::Size)?;
        let size = native::sys_fstat_size(fd)
            .map_err(|e| ErrorCode::from_native(Operation::Size, e))?;
        Ok(size.max(0) as u64)
    }

    fn try_sync(&mut self) -> Result<(), ErrorCode> {
        let fd = self.live_fd(Operation::Sync)?;
        native::sys_fsync(fd).map_err(|e| ErrorCode::from_native(Operation::Sync, e))
    }

    fn try_close(&mut self) -> Result<(), ErrorCode> {
        if !self.is_open() {
            return Ok(());
        }
        let fd = std::mem::replace(&mut self.fd, CLOSED_FD);
        native::sys_close(fd).map_err(|e| ErrorCode::from_native(Operation::Close, e))?;
        log::record_lifecycle(Operation::Close, &self.path);
        Ok(())
    }
}

impl Drop for BinaryFile {
    fn drop(&mut self) {
        if let Err(code) = self.try_close() {
            log::record_implicit_close_failure(&self.path, code);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use binfile_core::ErrorKind;

    fn rw_trunc() -> OpenFlags {
        OpenFlags::READ | OpenFlags::WRITE | OpenFlags::TRUNCATE
    }

    #[test]
    fn unopened_handle_is_closed() {
        let f = BinaryFile::new("never_opened.bin");
        assert!(!f.is_open());
        assert_eq!(f.raw_fd(), None);
        assert_eq!(f.flags(), OpenFlags::empty());
        assert_eq!(f.file_path(), Path::new("never_opened.bin"));
    }

    #[test]
    fn operations_on_closed_handle_report_ebadf() {
        let mut f = BinaryFile::new("never_opened.bin");
        let err = f.seek(0, SeekDir::Current).unwrap_err();
        assert_eq!(err.raw_os_error(), errno::EBADF);
        assert_eq!(err.kind(), ErrorKind::AccessDenied);

        let mut ec = ErrorCode::default();
        assert_eq!(f.read_with(&mut [0u8; 4], &mut ec), 0);
        assert_eq!(ec.value(), errno::EBADF);

        f.write_with(b"x", &mut ec);
        assert_eq!(ec.value(), errno::EBADF);
    }

    #[test]
    fn close_is_idempotent_on_unopened_handle() {
        let mut f = BinaryFile::new("never_opened.bin");
        assert!(f.close().is_ok());
        let mut ec = ErrorCode::from_native(Operation::Close, errno::EIO);
        f.close_with(&mut ec);
        assert!(!ec.is_err());
    }

    #[test]
    fn invalid_flags_rejected_before_native_call() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("flags.bin");
        let err = BinaryFile::open(&p, OpenFlags::empty()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.operation(), Operation::Open);
        assert!(!p.exists());

        let mut ec = ErrorCode::default();
        let f = BinaryFile::open_with(&p, OpenFlags::READ | OpenFlags::TRUNCATE, &mut ec);
        assert!(!f.is_open());
        assert_eq!(ec, err.code());
    }

    #[test]
    fn reopen_replaces_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("reopen.bin");
        let mut f = BinaryFile::open(&p, rw_trunc()).unwrap();
        f.write(b"abc").unwrap();
        f.reopen(OpenFlags::READ).unwrap();
        assert!(f.is_open());
        assert_eq!(f.flags(), OpenFlags::READ);
        assert_eq!(f.seek(0, SeekDir::Current).unwrap(), 0);
        let mut buf = [0u8; 3];
        assert_eq!(f.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"abc");
    }

    #[test]
    fn write_to_read_only_handle_is_access_denied() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("ro.bin");
        BinaryFile::open(&p, OpenFlags::WRITE).unwrap();
        let mut f = BinaryFile::open(&p, OpenFlags::READ).unwrap();
        let err = f.write(b"nope").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AccessDenied);
        assert_eq!(err.path(), p.as_path());

        let mut ec = ErrorCode::default();
        f.write_with(b"nope", &mut ec);
        assert_eq!(ec, err.code());
        assert_eq!(f.size().unwrap(), 0);
    }

    #[test]
    fn size_and_sync_do_not_move_position() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("size.bin");
        let mut f = BinaryFile::open(&p, rw_trunc()).unwrap();
        f.write(b"0123456789").unwrap();
        f.seek(4, SeekDir::Begin).unwrap();
        assert_eq!(f.size().unwrap(), 10);
        f.sync().unwrap();
        assert_eq!(f.seek(0, SeekDir::Current).unwrap(), 4);
    }

    #[test]
    fn into_raw_fd_transfers_ownership() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("raw.bin");
        let f = BinaryFile::open(&p, OpenFlags::WRITE).unwrap();
        let fd = f.into_raw_fd().unwrap();
        assert!(native::sys_close(fd).is_ok());
    }
}
