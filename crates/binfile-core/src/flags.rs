//! Open-flag sets.
//!
//! A handle is opened with a combination of [`OpenFlags::READ`],
//! [`OpenFlags::WRITE`] and [`OpenFlags::TRUNCATE`]. Not every combination
//! is meaningful; [`OpenFlags::plan`] validates the set and lowers it to an
//! [`OpenPlan`] that the native layer turns into `O_*` bits.

use bitflags::bitflags;

use crate::errno;
use crate::error::{ErrorCode, ErrorKind};

bitflags! {
    /// Capabilities requested when opening a binary file.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenFlags: u8 {
        /// Allow reading. Opening read-only never creates the file.
        const READ = 0b001;
        /// Allow writing. The file is created if it does not exist.
        const WRITE = 0b010;
        /// Discard existing content on open. Requires `WRITE`.
        const TRUNCATE = 0b100;
    }
}

/// Access mode of the native descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// Validated open request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenPlan {
    pub access: Access,
    pub create: bool,
    pub truncate: bool,
}

impl OpenFlags {
    /// Returns `true` if this set can be opened.
    ///
    /// The empty set and `TRUNCATE` without `WRITE` are rejected.
    #[must_use]
    pub fn is_valid(self) -> bool {
        if self.is_empty() {
            return false;
        }
        !(self.contains(Self::TRUNCATE) && !self.contains(Self::WRITE))
    }

    /// Validate the set and lower it to native open semantics.
    pub fn plan(self) -> Result<OpenPlan, ErrorCode> {
        if !self.is_valid() {
            return Err(ErrorCode::with_kind(
                errno::INVALID_ARGUMENT,
                ErrorKind::InvalidInput,
            ));
        }
        let readable = self.readable();
        let writable = self.writable();
        let access = match (readable, writable) {
            (true, true) => Access::ReadWrite,
            (false, true) => Access::WriteOnly,
            _ => Access::ReadOnly,
        };
        Ok(OpenPlan {
            access,
            create: writable,
            truncate: self.contains(Self::TRUNCATE),
        })
    }

    /// Returns `true` if reads are permitted.
    #[must_use]
    pub fn readable(self) -> bool {
        self.contains(Self::READ)
    }

    /// Returns `true` if writes are permitted.
    #[must_use]
    pub fn writable(self) -> bool {
        self.contains(Self::WRITE)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
