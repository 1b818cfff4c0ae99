#![cfg(unix)]

use parking_lot::Mutex;

use binfile::config::{LogThreshold, set_log_threshold};
use binfile::log::{self, LogEmitter};
use binfile_harness::{run_all, validate_log_file, validate_log_line};

// The log sink is process-wide.
static SERIAL: Mutex<()> = parking_lot::const_mutex(());

#[test]
fn full_run_produces_valid_log() {
    let _guard = SERIAL.lock();
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("logs").join("gap_check.jsonl");
    std::fs::create_dir_all(log_path.parent().unwrap()).unwrap();

    set_log_threshold(LogThreshold::Debug);
    log::install(LogEmitter::to_file(&log_path, "binfile-harness", "itest").unwrap());
    let summary = run_all(dir.path(), Some(64));
    log::uninstall();
    let summary = summary.unwrap();

    assert!(summary.passed, "{summary:#?}");
    let gaps: Vec<u64> = summary.gaps.iter().map(|g| g.gap_bytes).collect();
    assert_eq!(gaps, [0, 1024, 32 * 1024, 64 * 1024]);
    assert!(summary.times.contains("s wall"));

    let (lines, errors) = validate_log_file(&log_path).unwrap();
    assert!(errors.is_empty(), "{errors:?}");
    let content = std::fs::read_to_string(&log_path).unwrap();
    let events: Vec<String> = content
        .lines()
        .map(|l| validate_log_line(l, 0).unwrap().event)
        .collect();
    assert_eq!(events.len(), lines);
    assert_eq!(
        events.iter().filter(|e| *e == "harness.gap_check").count(),
        4
    );
    assert_eq!(
        events.iter().filter(|e| *e == "harness.flag_case").count(),
        8
    );
    // Each gap run provokes two rejected negative seeks.
    assert!(events.iter().filter(|e| *e == "binfile.op_failed").count() >= 8);
}

#[test]
fn duplicate_extra_gap_is_not_repeated() {
    let _guard = SERIAL.lock();
    let dir = tempfile::tempdir().unwrap();
    let summary = run_all(dir.path(), Some(32)).unwrap();
    assert_eq!(summary.gaps.len(), 3);
}
