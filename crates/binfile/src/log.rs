//! Structured JSONL logging.
//!
//! Provides:
//! - [`LogEntry`]: canonical log record with required + optional fields.
//! - [`LogEmitter`]: writes JSONL lines to a file or an in-memory buffer.
//! - A process-wide sink ([`install`] / [`uninstall`]) receiving failed
//!   operations from every handle, filtered by
//!   [`crate::config::log_threshold`].
//!
//! Logging is best-effort: a failing sink never changes the outcome of the
//! file operation being reported.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use binfile_core::{ErrorCode, Operation};

use crate::config::{LogThreshold, log_threshold};

// ---------------------------------------------------------------------------
// Log entry
// ---------------------------------------------------------------------------

/// Severity level for log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn threshold(self) -> LogThreshold {
        match self {
            Self::Trace | Self::Debug | Self::Info => LogThreshold::Debug,
            Self::Warn | Self::Error => LogThreshold::Warn,
        }
    }
}

/// Outcome of a scenario step (used by the harness).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
    Skip,
    Error,
}

/// Canonical structured log entry.
///
/// Required fields: `timestamp`, `trace_id`, `level`, `event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub trace_id: String,
    pub level: LogLevel,
    pub event: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errno: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ns: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl LogEntry {
    /// Create a new log entry with required fields only.
    #[must_use]
    pub fn new(trace_id: impl Into<String>, level: LogLevel, event: impl Into<String>) -> Self {
        Self {
            timestamp: now_utc(),
            trace_id: trace_id.into(),
            level,
            event: event.into(),
            op: None,
            path: None,
            errno: None,
            kind: None,
            outcome: None,
            latency_ns: None,
            details: None,
        }
    }

    /// Set the operation name.
    #[must_use]
    pub fn with_op(mut self, op: Operation) -> Self {
        self.op = Some(op.as_str().to_string());
        self
    }

    /// Set the path the event concerns.
    #[must_use]
    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.display().to_string());
        self
    }

    /// Set native value and classification from an error code.
    #[must_use]
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.errno = Some(code.value());
        self.kind = Some(code.kind().as_str().to_string());
        self
    }

    /// Set the outcome.
    #[must_use]
    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// Set latency in nanoseconds.
    #[must_use]
    pub fn with_latency_ns(mut self, ns: u64) -> Self {
        self.latency_ns = Some(ns);
        self
    }

    /// Set free-form details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Serialize to a single JSONL line (no trailing newline).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Log emitter
// ---------------------------------------------------------------------------

/// In-memory JSONL destination whose contents can be read back.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Copy of everything written so far.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    /// Parsed entries written so far; malformed lines are skipped.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.contents()
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Writes structured JSONL log entries.
pub struct LogEmitter {
    writer: Box<dyn Write + Send>,
    seq: u64,
    component: String,
    run_id: String,
}

impl LogEmitter {
    /// Create an emitter that writes to a file (truncating it).
    pub fn to_file(path: &Path, component: &str, run_id: &str) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::to_writer(
            Box::new(std::io::BufWriter::new(file)),
            component,
            run_id,
        ))
    }

    /// Create an emitter over any writer.
    #[must_use]
    pub fn to_writer(writer: Box<dyn Write + Send>, component: &str, run_id: &str) -> Self {
        Self {
            writer,
            seq: 0,
            component: component.to_string(),
            run_id: run_id.to_string(),
        }
    }

    /// Create an emitter that writes to a readable in-memory buffer.
    #[must_use]
    pub fn to_buffer(component: &str, run_id: &str) -> (Self, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let emitter = Self::to_writer(Box::new(buffer.clone()), component, run_id);
        (emitter, buffer)
    }

    /// Generate the next trace ID (`<component>::<run_id>::<seq>`).
    pub fn next_trace_id(&mut self) -> String {
        self.seq += 1;
        format!("{}::{}::{:03}", self.component, self.run_id, self.seq)
    }

    /// Emit a log entry with an auto-generated trace_id.
    pub fn emit(&mut self, level: LogLevel, event: &str) -> std::io::Result<LogEntry> {
        let trace_id = self.next_trace_id();
        let entry = LogEntry::new(trace_id, level, event);
        self.write_line(&entry)?;
        Ok(entry)
    }

    /// Emit a fully-populated log entry, filling in an empty trace_id.
    pub fn emit_entry(&mut self, mut entry: LogEntry) -> std::io::Result<()> {
        if entry.trace_id.is_empty() {
            entry.trace_id = self.next_trace_id();
        }
        self.write_line(&entry)
    }

    fn write_line(&mut self, entry: &LogEntry) -> std::io::Result<()> {
        let line = serde_json::to_string(entry).map_err(std::io::Error::other)?;
        writeln!(self.writer, "{line}")
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

// ---------------------------------------------------------------------------
// Process-wide sink
// ---------------------------------------------------------------------------

static SINK: Mutex<Option<LogEmitter>> = parking_lot::const_mutex(None);

/// Install the process-wide sink, returning the previous one.
pub fn install(emitter: LogEmitter) -> Option<LogEmitter> {
    SINK.lock().replace(emitter)
}

/// Remove and return the process-wide sink, flushing it first.
pub fn uninstall() -> Option<LogEmitter> {
    let mut taken = SINK.lock().take();
    if let Some(emitter) = taken.as_mut() {
        let _ = emitter.flush();
    }
    taken
}

/// Returns `true` if an entry at `level` would be written.
#[must_use]
pub fn enabled(level: LogLevel) -> bool {
    log_threshold().allows(level.threshold()) && SINK.lock().is_some()
}

/// Write `entry` to the sink if one is installed and the threshold allows.
pub fn record(entry: LogEntry) {
    if !log_threshold().allows(entry.level.threshold()) {
        return;
    }
    if let Some(emitter) = SINK.lock().as_mut() {
        let _ = emitter.emit_entry(entry);
    }
}

/// Record a failed operation against `path`.
pub(crate) fn record_failure(op: Operation, path: &Path, code: ErrorCode) {
    record(
        LogEntry::new(String::new(), LogLevel::Warn, "binfile.op_failed")
            .with_op(op)
            .with_path(path)
            .with_code(code),
    );
}

/// Record a successful lifecycle event (open/close).
pub(crate) fn record_lifecycle(op: Operation, path: &Path) {
    record(
        LogEntry::new(String::new(), LogLevel::Debug, "binfile.lifecycle")
            .with_op(op)
            .with_path(path),
    );
}

/// Record a failed sample of the process clock.
pub(crate) fn record_clock_failure(code: ErrorCode) {
    record(
        LogEntry::new(String::new(), LogLevel::Warn, "binfile.clock_failed")
            .with_op(Operation::Times)
            .with_code(code),
    );
}

/// Record a close failure of a descriptor released by drop or reopen.
pub(crate) fn record_implicit_close_failure(path: &Path, code: ErrorCode) {
    record(
        LogEntry::new(String::new(), LogLevel::Error, "binfile.implicit_close_failed")
            .with_op(Operation::Close)
            .with_path(path)
            .with_code(code),
    );
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Current time as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
fn now_utc() -> String {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format_utc(duration.as_secs() as i64, duration.subsec_millis())
}

fn format_utc(epoch_secs: i64, millis: u32) -> String {
    let days = epoch_secs.div_euclid(86_400);
    let rem = epoch_secs.rem_euclid(86_400);
    let (year, month, day) = civil_from_days(days);
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{millis:03}Z",
        rem / 3600,
        (rem / 60) % 60,
        rem % 60,
    )
}

/// Days since 1970-01-01 to a proleptic Gregorian (year, month, day).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use binfile_core::errno;

    #[test]
    fn log_entry_serializes_required_fields() {
        let entry = LogEntry::new("binfile::run-1::001", LogLevel::Info, "test_start");
        let json = entry.to_jsonl().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed["timestamp"].is_string());
        assert_eq!(parsed["trace_id"], "binfile::run-1::001");
        assert_eq!(parsed["level"], "info");
        assert_eq!(parsed["event"], "test_start");
        assert!(parsed.get("op").is_none());
        assert!(parsed.get("errno").is_none());
    }

    #[test]
    fn log_entry_with_code() {
        let code = ErrorCode::from_native(Operation::Seek, errno::NEGATIVE_SEEK);
        let entry = LogEntry::new("a::b::001", LogLevel::Warn, "binfile.op_failed")
            .with_op(Operation::Seek)
            .with_path(Path::new("file_with_gap"))
            .with_code(code)
            .with_outcome(Outcome::Fail);
        let parsed: serde_json::Value = serde_json::from_str(&entry.to_jsonl().unwrap()).unwrap();
        assert_eq!(parsed["op"], "seek");
        assert_eq!(parsed["path"], "file_with_gap");
        assert_eq!(parsed["errno"], errno::NEGATIVE_SEEK);
        assert_eq!(parsed["kind"], "invalid_seek");
        assert_eq!(parsed["outcome"], "fail");
    }

    #[test]
    fn emitter_generates_sequential_trace_ids() {
        let (mut emitter, buffer) = LogEmitter::to_buffer("binfile", "run-42");
        let e1 = emitter.emit(LogLevel::Info, "start").unwrap();
        let e2 = emitter.emit(LogLevel::Info, "end").unwrap();
        assert_eq!(e1.trace_id, "binfile::run-42::001");
        assert_eq!(e2.trace_id, "binfile::run-42::002");
        let entries = buffer.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].event, "end");
    }

    #[test]
    fn emit_entry_fills_missing_trace_id() {
        let (mut emitter, buffer) = LogEmitter::to_buffer("binfile", "r");
        emitter
            .emit_entry(LogEntry::new(String::new(), LogLevel::Warn, "x"))
            .unwrap();
        assert_eq!(buffer.entries()[0].trace_id, "binfile::r::001");
    }

    #[test]
    fn utc_formatting() {
        assert_eq!(format_utc(0, 0), "1970-01-01T00:00:00.000Z");
        assert_eq!(format_utc(1_704_067_200, 5), "2024-01-01T00:00:00.005Z");
        assert_eq!(format_utc(1_709_208_000, 0), "2024-02-29T12:00:00.000Z");
        assert_eq!(format_utc(-1, 0), "1969-12-31T23:59:59.000Z");
    }

    #[test]
    fn roundtrip_deserialization() {
        let entry = LogEntry::new("a::b::001", LogLevel::Warn, "slow_op").with_latency_ns(25_000);
        let restored: LogEntry = serde_json::from_str(&entry.to_jsonl().unwrap()).unwrap();
        assert_eq!(restored, entry);
    }
}
