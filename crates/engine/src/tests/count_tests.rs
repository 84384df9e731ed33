use crate::*;
use anyhow::Result;
use runs::{RunError, RunReader, RunWriter};
use std::io::Cursor;
use tempfile::tempdir;

#[test]
fn counts_value_changes() {
    let mut src = vec![1u32, 1, 2, 3, 3, 3, 9].into_iter();
    assert_eq!(count_distinct(&mut src).unwrap(), 4);
}

#[test]
fn empty_source_counts_zero() {
    let mut src = Vec::<u32>::new().into_iter();
    assert_eq!(count_distinct(&mut src).unwrap(), 0);
}

#[test]
fn all_equal_counts_one() {
    let mut src = vec![7u32; 1000].into_iter();
    assert_eq!(count_distinct(&mut src).unwrap(), 1);
}

#[test]
fn zero_key_is_counted() {
    // 0.0.0.0 encodes to 0; the first key must count even when it is 0
    let mut src = vec![0u32, 0, 1].into_iter();
    assert_eq!(count_distinct(&mut src).unwrap(), 2);
}

#[test]
fn truncated_source_reports_error() {
    let mut bytes = Vec::new();
    for k in [1u32, 2] {
        bytes.extend_from_slice(&k.to_le_bytes());
    }
    bytes.push(0xFF);
    let mut rdr = RunReader::from_reader("mem", Cursor::new(bytes));

    let err = count_distinct(&mut rdr).unwrap_err();
    assert!(matches!(err, RunError::TruncatedKey { .. }), "{err:?}");
}

#[test]
fn count_merged_reads_file() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("merged.bin");
    RunWriter::write_sorted(&path, &[5, 5, 6, 100, 100])?;

    assert_eq!(count_merged(&path)?, 3);
    Ok(())
}

#[test]
fn count_merged_rejects_misaligned_file() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("merged.bin");
    std::fs::write(&path, [0u8; 6])?;

    let err = count_merged(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("failed to open merged stream"), "{:#}", err);
    Ok(())
}

#[test]
fn count_merged_missing_file_errors() -> Result<()> {
    let dir = tempdir()?;
    assert!(count_merged(&dir.path().join("nope.bin")).is_err());
    Ok(())
}
