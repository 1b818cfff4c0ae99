//! # binfile-core
//!
//! Platform-neutral logic behind the `binfile` handle and process timer.
//!
//! This crate holds everything that can be decided without touching the
//! operating system: error classification, open-flag validation, seek
//! target computation and time-sample arithmetic. No `unsafe` code is
//! permitted at the crate level; native calls live in the `binfile` crate.

#![deny(unsafe_code)]

pub mod errno;
pub mod error;
pub mod flags;
pub mod seek;
pub mod time;

pub use error::{ErrorCode, ErrorKind, Operation, classify, classify_for};
pub use flags::{Access, OpenFlags, OpenPlan};
pub use seek::{SeekDir, resolve_target};
pub use time::{Microseconds, NativeClock, Times};
