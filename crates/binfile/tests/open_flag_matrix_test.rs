#![cfg(unix)]

use std::fs;

use binfile::{BinaryFile, ErrorCode, ErrorKind, OpenFlags, SeekDir, pathops};
use binfile_core::errno;

const PAYLOAD: &[u8] = b"0123456789abcdef";

#[derive(Clone, Copy)]
struct Case {
    name: &'static str,
    flags: OpenFlags,
    preexisting: bool,
    expected_kind: Option<ErrorKind>,
    expected_size: Option<u64>,
}

fn matrix_cases() -> Vec<Case> {
    vec![
        Case {
            name: "read_missing",
            flags: OpenFlags::READ,
            preexisting: false,
            expected_kind: Some(ErrorKind::NotFound),
            expected_size: None,
        },
        Case {
            name: "write_creates_empty",
            flags: OpenFlags::WRITE,
            preexisting: false,
            expected_kind: None,
            expected_size: Some(0),
        },
        Case {
            name: "read_existing",
            flags: OpenFlags::READ,
            preexisting: true,
            expected_kind: None,
            expected_size: Some(PAYLOAD.len() as u64),
        },
        Case {
            name: "read_write_preserves",
            flags: OpenFlags::READ | OpenFlags::WRITE,
            preexisting: true,
            expected_kind: None,
            expected_size: Some(PAYLOAD.len() as u64),
        },
        Case {
            name: "write_preserves",
            flags: OpenFlags::WRITE,
            preexisting: true,
            expected_kind: None,
            expected_size: Some(PAYLOAD.len() as u64),
        },
        Case {
            name: "read_write_truncate_resets",
            flags: OpenFlags::READ | OpenFlags::WRITE | OpenFlags::TRUNCATE,
            preexisting: true,
            expected_kind: None,
            expected_size: Some(0),
        },
        Case {
            name: "write_truncate_resets",
            flags: OpenFlags::WRITE | OpenFlags::TRUNCATE,
            preexisting: true,
            expected_kind: None,
            expected_size: Some(0),
        },
        Case {
            name: "no_flags_rejected",
            flags: OpenFlags::empty(),
            preexisting: true,
            expected_kind: Some(ErrorKind::InvalidInput),
            expected_size: None,
        },
        Case {
            name: "truncate_without_write_rejected",
            flags: OpenFlags::READ | OpenFlags::TRUNCATE,
            preexisting: true,
            expected_kind: Some(ErrorKind::InvalidInput),
            expected_size: None,
        },
    ]
}

#[test]
fn open_flag_matrix() {
    let dir = tempfile::tempdir().unwrap();
    for case in matrix_cases() {
        let path = dir.path().join(case.name);
        if case.preexisting {
            fs::write(&path, PAYLOAD).unwrap();
        }

        let mut ec = ErrorCode::default();
        let soft = BinaryFile::open_with(&path, case.flags, &mut ec);
        let hard = BinaryFile::open(&path, case.flags);

        match case.expected_kind {
            Some(kind) => {
                let err = hard.unwrap_err();
                assert_eq!(err.kind(), kind, "{}", case.name);
                assert_eq!(ec, err.code(), "{}", case.name);
                assert_eq!(err.path(), path.as_path(), "{}", case.name);
                assert!(!soft.is_open(), "{}", case.name);
            }
            None => {
                assert!(!ec.is_err(), "{}: {ec}", case.name);
                let f = hard.unwrap();
                assert!(f.is_open(), "{}", case.name);
                assert_eq!(f.flags(), case.flags, "{}", case.name);
            }
        }
        drop(soft);

        if let Some(size) = case.expected_size {
            assert_eq!(pathops::file_size(&path).unwrap(), size, "{}", case.name);
        }
        if case.expected_kind == Some(ErrorKind::NotFound) {
            assert!(!pathops::exists(&path), "{}: read must not create", case.name);
        }
    }
}

#[test]
fn rejected_flags_carry_invalid_argument() {
    let dir = tempfile::tempdir().unwrap();
    let err = BinaryFile::open(dir.path().join("x"), OpenFlags::TRUNCATE).unwrap_err();
    assert_eq!(err.raw_os_error(), errno::INVALID_ARGUMENT);
}

#[test]
fn write_then_reopen_read_only_reflects_size() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reflect.bin");
    {
        let mut f = BinaryFile::open(&path, OpenFlags::WRITE).unwrap();
        f.write(PAYLOAD).unwrap();
    }
    let mut f = BinaryFile::open(&path, OpenFlags::READ).unwrap();
    assert_eq!(f.size().unwrap(), PAYLOAD.len() as u64);
    assert_eq!(f.seek(0, SeekDir::End).unwrap(), PAYLOAD.len() as i64);
}
