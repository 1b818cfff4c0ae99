//! Gap round-trip and open-flag matrix scenarios.
//!
//! Each step is recorded through [`binfile::log::record`], so when the
//! caller has installed a sink the handle's own failure records and the
//! step records land in one JSONL stream.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use sha2::{Digest, Sha256};

use binfile::log::{self, LogEntry, LogLevel, Outcome};
use binfile::{BinaryFile, ErrorCode, ErrorKind, OpenFlags, SeekDir, Timer, pathops};

use crate::HarnessError;

const HEAD: &[u8] = b"Hello, ";
const TAIL: &[u8] = b"world!";
const CHUNK: usize = 64 * 1024;

/// Gap sizes always exercised, in KiB. The caller may add one more.
pub const STANDARD_GAPS_KIB: [u64; 3] = [0, 1, 32];

/// Result of one gap round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GapReport {
    pub path: PathBuf,
    pub gap_bytes: u64,
    pub expected_size: u64,
    pub file_size: u64,
    pub sha256: String,
    pub gap_zeroed: bool,
    pub tail_matches: bool,
    pub negative_seek_kind: String,
    pub negative_seek_errno: i32,
    pub eof_read: usize,
    pub passed: bool,
}

/// Result of one open-flag combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagCaseResult {
    pub name: String,
    pub flags: String,
    pub expected: String,
    pub actual: String,
    pub passed: bool,
}

/// Summary printed by `gap-check`.
#[derive(Debug, Clone, Serialize)]
pub struct GapCheckSummary {
    pub gaps: Vec<GapReport>,
    pub flag_matrix: Vec<FlagCaseResult>,
    pub passed: bool,
    pub times: String,
}

fn record_step(
    event: &str,
    path: &Path,
    passed: bool,
    started: Instant,
    details: serde_json::Value,
) {
    let (level, outcome) = if passed {
        (LogLevel::Info, Outcome::Pass)
    } else {
        (LogLevel::Error, Outcome::Fail)
    };
    log::record(
        LogEntry::new(String::new(), level, event)
            .with_path(path)
            .with_outcome(outcome)
            .with_latency_ns(u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX))
            .with_details(details),
    );
}

fn flags_label(flags: OpenFlags) -> String {
    if flags.is_empty() {
        return "none".to_string();
    }
    let mut parts = Vec::new();
    if flags.contains(OpenFlags::READ) {
        parts.push("read");
    }
    if flags.contains(OpenFlags::WRITE) {
        parts.push("write");
    }
    if flags.contains(OpenFlags::TRUNCATE) {
        parts.push("truncate");
    }
    parts.join("|")
}

fn hex_lower(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Read `len` bytes from the current position, returning whether all of
/// them were zero. Every byte read is fed to `hasher`.
fn read_gap(file: &mut BinaryFile, len: u64, hasher: &mut Sha256) -> Result<bool, HarnessError> {
    let mut buf = vec![0u8; CHUNK];
    let mut remaining = len;
    let mut zeroed = true;
    while remaining > 0 {
        let want = usize::try_from(remaining.min(CHUNK as u64)).unwrap_or(CHUNK);
        let n = file.read(&mut buf[..want])?;
        if n == 0 {
            return Ok(false);
        }
        hasher.update(&buf[..n]);
        zeroed &= buf[..n].iter().all(|&b| b == 0);
        remaining -= n as u64;
    }
    Ok(zeroed)
}

fn read_exact_hashed(
    file: &mut BinaryFile,
    len: usize,
    hasher: &mut Sha256,
) -> Result<Vec<u8>, HarnessError> {
    let mut out = vec![0u8; len];
    let mut filled = 0;
    while filled < len {
        let n = file.read(&mut out[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    out.truncate(filled);
    hasher.update(&out);
    Ok(out)
}

/// Write head, seek `gap_kib` KiB past EOF, write tail, then verify size,
/// contents, negative-seek rejection and the EOF signal.
pub fn run_gap_check(dir: &Path, gap_kib: u64) -> Result<GapReport, HarnessError> {
    let started = Instant::now();
    let path = dir.join(format!("file_with_gap_{gap_kib}k"));
    let too_large = || HarnessError::Mismatch {
        scenario: "gap".to_string(),
        expected: format!("gap below {} bytes", i64::MAX),
        actual: format!("{gap_kib} KiB"),
    };
    let gap_bytes = gap_kib.checked_mul(1024).ok_or_else(too_large)?;
    let gap = i64::try_from(gap_bytes).map_err(|_| too_large())?;

    {
        let flags = OpenFlags::READ | OpenFlags::WRITE | OpenFlags::TRUNCATE;
        let mut f = BinaryFile::open(&path, flags)?;
        f.write(HEAD)?;
        f.seek(gap, SeekDir::Current)?;
        f.write(TAIL)?;
        f.close()?;
    }

    let expected_size = (HEAD.len() + TAIL.len()) as u64 + gap_bytes;
    let file_size = pathops::file_size(&path)?;

    let mut f = BinaryFile::open(&path, OpenFlags::READ)?;
    let mut hasher = Sha256::new();
    let head = read_exact_hashed(&mut f, HEAD.len(), &mut hasher)?;
    let gap_zeroed = read_gap(&mut f, gap_bytes, &mut hasher)?;
    let tail = read_exact_hashed(&mut f, TAIL.len(), &mut hasher)?;
    let tail_matches = head == HEAD && tail == TAIL;

    let position = f.seek(0, SeekDir::Current)?;
    let mut ec = ErrorCode::default();
    f.seek_with(-1, SeekDir::Begin, &mut ec);
    let thrown = f.seek(-1, SeekDir::Begin).err();
    let channels_agree = thrown
        .as_ref()
        .is_some_and(|e| e.code() == ec && e.path() == path.as_path());
    let position_kept = f.seek(0, SeekDir::Current)? == position;

    let mut one = [0u8; 1];
    let eof_read = f.read(&mut one)?;
    f.close()?;

    let passed = file_size == expected_size
        && gap_zeroed
        && tail_matches
        && ec.kind() == ErrorKind::InvalidSeek
        && channels_agree
        && position_kept
        && eof_read == 0;

    let report = GapReport {
        path: path.clone(),
        gap_bytes,
        expected_size,
        file_size,
        sha256: hex_lower(&hasher.finalize()),
        gap_zeroed,
        tail_matches,
        negative_seek_kind: ec.kind().as_str().to_string(),
        negative_seek_errno: ec.value(),
        eof_read,
        passed,
    };
    record_step(
        "harness.gap_check",
        &path,
        passed,
        started,
        serde_json::to_value(&report)?,
    );
    Ok(report)
}

struct FlagCase {
    name: &'static str,
    flags: OpenFlags,
    preexisting: bool,
    expected: Result<u64, ErrorKind>,
}

fn flag_cases(payload_len: u64) -> [FlagCase; 8] {
    [
        FlagCase {
            name: "read_missing",
            flags: OpenFlags::READ,
            preexisting: false,
            expected: Err(ErrorKind::NotFound),
        },
        FlagCase {
            name: "write_creates",
            flags: OpenFlags::WRITE,
            preexisting: false,
            expected: Ok(0),
        },
        FlagCase {
            name: "read_existing",
            flags: OpenFlags::READ,
            preexisting: true,
            expected: Ok(payload_len),
        },
        FlagCase {
            name: "read_write_preserves",
            flags: OpenFlags::READ | OpenFlags::WRITE,
            preexisting: true,
            expected: Ok(payload_len),
        },
        FlagCase {
            name: "read_write_truncate",
            flags: OpenFlags::READ | OpenFlags::WRITE | OpenFlags::TRUNCATE,
            preexisting: true,
            expected: Ok(0),
        },
        FlagCase {
            name: "write_truncate",
            flags: OpenFlags::WRITE | OpenFlags::TRUNCATE,
            preexisting: true,
            expected: Ok(0),
        },
        FlagCase {
            name: "empty_flags",
            flags: OpenFlags::empty(),
            preexisting: true,
            expected: Err(ErrorKind::InvalidInput),
        },
        FlagCase {
            name: "truncate_without_write",
            flags: OpenFlags::READ | OpenFlags::TRUNCATE,
            preexisting: true,
            expected: Err(ErrorKind::InvalidInput),
        },
    ]
}

fn describe(result: &Result<u64, ErrorKind>) -> String {
    match result {
        Ok(size) => format!("open, size {size}"),
        Err(kind) => format!("error {}", kind.as_str()),
    }
}

/// Open every flag combination against a fresh or pre-populated file and
/// compare the outcome (error kind, or resulting size) with expectations.
pub fn run_flag_matrix(dir: &Path) -> Result<Vec<FlagCaseResult>, HarnessError> {
    let payload = b"0123456789abcdef";
    let mut results = Vec::new();

    for case in flag_cases(payload.len() as u64) {
        let started = Instant::now();
        let path = dir.join(format!("flags_{}", case.name));
        pathops::remove(&path)?;
        if case.preexisting {
            let mut f = BinaryFile::open(&path, OpenFlags::WRITE)?;
            f.write(payload)?;
        }

        let actual = match BinaryFile::open(&path, case.flags) {
            Ok(mut f) => {
                let size = f.size()?;
                f.close()?;
                Ok(size)
            }
            Err(err) => Err(err.kind()),
        };
        let passed = actual == case.expected;
        let result = FlagCaseResult {
            name: case.name.to_string(),
            flags: flags_label(case.flags),
            expected: describe(&case.expected),
            actual: describe(&actual),
            passed,
        };
        record_step(
            "harness.flag_case",
            &path,
            passed,
            started,
            serde_json::to_value(&result)?,
        );
        results.push(result);
    }

    Ok(results)
}

/// Run the gap check for the standard sizes plus `extra_gap_kib`, then the
/// flag matrix, timing the whole run.
pub fn run_all(dir: &Path, extra_gap_kib: Option<u64>) -> Result<GapCheckSummary, HarnessError> {
    let mut timer = Timer::new();
    let mut gaps_kib = STANDARD_GAPS_KIB.to_vec();
    if let Some(extra) = extra_gap_kib
        && !gaps_kib.contains(&extra)
    {
        gaps_kib.push(extra);
    }

    let mut gaps = Vec::with_capacity(gaps_kib.len());
    for kib in gaps_kib {
        gaps.push(run_gap_check(dir, kib)?);
    }
    let flag_matrix = run_flag_matrix(dir)?;
    let times = timer.stop()?;

    let passed = gaps.iter().all(|g| g.passed) && flag_matrix.iter().all(|c| c.passed);
    Ok(GapCheckSummary {
        gaps,
        flag_matrix,
        passed,
        times: times.to_string(),
    })
}
