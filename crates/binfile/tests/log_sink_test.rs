#![cfg(unix)]

//! The sink and threshold are process-wide; every test here holds `SERIAL`.

use binfile::config::{LogThreshold, set_log_threshold};
use binfile::log::{self, LogEmitter, LogLevel};
use binfile::{BinaryFile, ErrorCode, OpenFlags, SeekDir};
use binfile_core::errno;
use parking_lot::Mutex;

static SERIAL: Mutex<()> = parking_lot::const_mutex(());

#[test]
fn failed_operations_are_recorded_once_per_call() {
    let _guard = SERIAL.lock();
    set_log_threshold(LogThreshold::Warn);
    let (emitter, buffer) = LogEmitter::to_buffer("binfile", "failures");
    log::install(emitter);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logged.bin");
    let mut f = BinaryFile::open(&path, OpenFlags::WRITE).unwrap();
    let _ = f.seek(-1, SeekDir::Begin);
    let mut ec = ErrorCode::default();
    f.seek_with(-1, SeekDir::Begin, &mut ec);
    drop(f);
    log::uninstall();

    let entries = buffer.entries();
    assert_eq!(entries.len(), 2, "{}", buffer.contents());
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.event, "binfile.op_failed");
        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.op.as_deref(), Some("seek"));
        assert_eq!(entry.errno, Some(errno::NEGATIVE_SEEK));
        assert_eq!(entry.kind.as_deref(), Some("invalid_seek"));
        assert_eq!(entry.path.as_deref(), Some(path.display().to_string().as_str()));
        assert_eq!(entry.trace_id, format!("binfile::failures::{:03}", i + 1));
    }
}

#[test]
fn debug_threshold_adds_lifecycle_events() {
    let _guard = SERIAL.lock();
    set_log_threshold(LogThreshold::Debug);
    let (emitter, buffer) = LogEmitter::to_buffer("binfile", "lifecycle");
    log::install(emitter);

    let dir = tempfile::tempdir().unwrap();
    let mut f = BinaryFile::open(dir.path().join("life.bin"), OpenFlags::WRITE).unwrap();
    f.close().unwrap();
    log::uninstall();
    set_log_threshold(LogThreshold::Warn);

    let ops: Vec<_> = buffer
        .entries()
        .into_iter()
        .filter(|e| e.event == "binfile.lifecycle")
        .filter_map(|e| e.op)
        .collect();
    assert_eq!(ops, ["open", "close"]);
}

#[test]
fn off_threshold_suppresses_everything() {
    let _guard = SERIAL.lock();
    set_log_threshold(LogThreshold::Off);
    let (emitter, buffer) = LogEmitter::to_buffer("binfile", "off");
    log::install(emitter);
    assert!(!log::enabled(LogLevel::Error));

    let dir = tempfile::tempdir().unwrap();
    let _ = BinaryFile::open(dir.path().join("missing.bin"), OpenFlags::READ);
    log::uninstall();
    set_log_threshold(LogThreshold::Warn);

    assert!(buffer.contents().is_empty());
}

#[test]
fn no_sink_means_no_output() {
    let _guard = SERIAL.lock();
    set_log_threshold(LogThreshold::Warn);
    log::uninstall();
    assert!(!log::enabled(LogLevel::Warn));
    let dir = tempfile::tempdir().unwrap();
    let err = BinaryFile::open(dir.path().join("missing.bin"), OpenFlags::READ).unwrap_err();
    assert_eq!(err.raw_os_error(), errno::ENOENT);
}
