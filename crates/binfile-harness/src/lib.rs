//! Scenario harness for binfile.
//!
//! This crate provides:
//! - Gap check: write, seek past EOF, write again and verify the round trip
//! - Open-flag matrix: every flag combination against fresh and existing files
//! - Log validation: check JSONL output against the structured-log schema

#![forbid(unsafe_code)]

#[cfg(unix)]
pub mod scenario;
pub mod structured_log;

use thiserror::Error;

use binfile::{ClockError, FileError};

/// Failure of a harness command.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    File(#[from] FileError),
    #[error(transparent)]
    Clock(#[from] ClockError),
    #[error("{scenario}: expected {expected}, got {actual}")]
    Mismatch {
        scenario: String,
        expected: String,
        actual: String,
    },
    #[error("{0} log line(s) failed validation")]
    InvalidLog(usize),
}

#[cfg(unix)]
pub use scenario::{
    FlagCaseResult, GapCheckSummary, GapReport, run_all, run_flag_matrix, run_gap_check,
};
pub use structured_log::{LogValidationError, validate_log_file, validate_log_line};
