//! # binfile
//!
//! Raw, unbuffered binary file access with dual error reporting, plus a
//! process elapsed-time recorder.
//!
//! This crate provides:
//! - [`BinaryFile`]: open/seek/read/write/close on one path, 64-bit offsets
//! - Path queries: [`pathops::exists`], [`pathops::file_size`], [`pathops::remove`]
//! - [`Timer`] and [`process_times`]: wall, user and system time
//! - [`log`]: structured JSONL records of failed operations
//!
//! Every fallible operation comes in two forms. `op(..)` returns
//! `Result<T, FileError>` (or [`ClockError`]); `op_with(.., &mut ErrorCode)`
//! never fails, stores the error in the out-parameter and returns a
//! sentinel. Both forms carry the same native value and [`ErrorKind`].

pub mod config;
pub mod error;
pub mod log;

#[cfg(unix)]
pub mod clock;
#[cfg(unix)]
pub mod file;
#[cfg(unix)]
pub mod native;
#[cfg(unix)]
pub mod pathops;

pub use binfile_core::{
    ErrorCode, ErrorKind, Microseconds, NativeClock, OpenFlags, Operation, SeekDir, Times,
};
pub use error::{ClockError, FileError};

#[cfg(unix)]
pub use clock::{PosixClock, Timer, process_times, process_times_with};
#[cfg(unix)]
pub use file::{BinaryFile, Offset};
