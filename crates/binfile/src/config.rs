//! Runtime logging configuration.
//!
//! The threshold is set via the `BINFILE_LOG` environment variable:
//! - `warn` (default): failed operations and drop-time close failures.
//! - `debug`: additionally successful open/close events.
//! - `off`: nothing is recorded, even with a sink installed.
//!
//! Unknown values fall back to the default.

use std::sync::atomic::{AtomicU8, Ordering};

/// Name of the environment variable read on first use.
pub const LOG_ENV_VAR: &str = "BINFILE_LOG";

/// How much the handle reports to the structured log sink.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogThreshold {
    Off,
    #[default]
    Warn,
    Debug,
}

impl LogThreshold {
    /// Parse from string (case-insensitive).
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" | "0" | "disabled" => Self::Off,
            "debug" | "trace" | "all" | "verbose" => Self::Debug,
            _ => Self::Warn,
        }
    }

    /// Returns true if events at `level` pass this threshold.
    #[must_use]
    pub const fn allows(self, level: LogThreshold) -> bool {
        !matches!(self, Self::Off) && (level as u8) <= (self as u8)
    }
}

// Atomic cache: 0=unresolved, 1=Off, 2=Warn, 3=Debug.
static CACHED_THRESHOLD: AtomicU8 = AtomicU8::new(0);

const THRESHOLD_UNRESOLVED: u8 = 0;
const THRESHOLD_OFF: u8 = 1;
const THRESHOLD_WARN: u8 = 2;
const THRESHOLD_DEBUG: u8 = 3;

fn threshold_to_u8(t: LogThreshold) -> u8 {
    match t {
        LogThreshold::Off => THRESHOLD_OFF,
        LogThreshold::Warn => THRESHOLD_WARN,
        LogThreshold::Debug => THRESHOLD_DEBUG,
    }
}

fn u8_to_threshold(v: u8) -> LogThreshold {
    match v {
        THRESHOLD_OFF => LogThreshold::Off,
        THRESHOLD_DEBUG => LogThreshold::Debug,
        _ => LogThreshold::Warn,
    }
}

/// Get the configured threshold (reads `BINFILE_LOG` on first call, caches
/// thereafter).
#[must_use]
pub fn log_threshold() -> LogThreshold {
    let cached = CACHED_THRESHOLD.load(Ordering::Relaxed);
    if cached != THRESHOLD_UNRESOLVED {
        return u8_to_threshold(cached);
    }
    let resolved = std::env::var(LOG_ENV_VAR)
        .map(|v| LogThreshold::from_str_loose(&v))
        .unwrap_or_default();
    // A concurrent set_log_threshold wins over the environment.
    match CACHED_THRESHOLD.compare_exchange(
        THRESHOLD_UNRESOLVED,
        threshold_to_u8(resolved),
        Ordering::AcqRel,
        Ordering::Acquire,
    ) {
        Ok(_) => resolved,
        Err(current) => u8_to_threshold(current),
    }
}

/// Override the threshold for the rest of the process.
pub fn set_log_threshold(threshold: LogThreshold) {
    CACHED_THRESHOLD.store(threshold_to_u8(threshold), Ordering::Release);
}
