use crate::*;
use anyhow::Result;
use std::fs;
use tempfile::tempdir;

#[test]
fn write_empty_run_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.bin");
    let result = RunWriter::write_sorted(&path, &[]);
    assert!(matches!(result, Err(RunError::Empty { .. })));
    assert!(
        result.unwrap_err().to_string().contains("empty"),
        "error message should mention 'empty'"
    );
    // No file should have been created
    assert!(!path.exists(), "no run file should be created for an empty buffer");
}

#[test]
fn written_file_is_raw_little_endian() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("run-000000.bin");

    let n = RunWriter::write_sorted(&path, &[0x0101_0101, 0x0202_0202, 0xC0A8_0001])?;
    assert_eq!(n, 3);

    let bytes = fs::read(&path)?;
    assert_eq!(bytes.len(), 3 * KEY_BYTES);
    assert_eq!(
        bytes,
        vec![
            0x01, 0x01, 0x01, 0x01, //
            0x02, 0x02, 0x02, 0x02, //
            0x01, 0x00, 0xA8, 0xC0,
        ]
    );
    Ok(())
}

#[test]
fn finish_renames_tmp_file() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("run-000001.bin");
    let tmp = dir.path().join("run-000001.bin.tmp");

    let mut w = RunWriter::create(&path)?;
    w.push(5)?;
    w.push(7)?;
    assert!(tmp.exists(), "keys go to the tmp file first");
    assert!(!path.exists(), "final name appears only after finish");

    assert_eq!(w.finish()?, 2);
    assert!(path.exists());
    assert!(!tmp.exists());
    Ok(())
}

#[test]
fn dropped_writer_never_publishes() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("run-000002.bin");
    {
        let mut w = RunWriter::create(&path)?;
        w.push(1)?;
    }
    assert!(!path.exists());
    Ok(())
}

#[test]
fn duplicates_are_accepted() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("dups.bin");
    assert_eq!(RunWriter::write_sorted(&path, &[3, 3, 3, 4, 4])?, 5);
    Ok(())
}

#[test]
fn out_of_order_key_is_rejected() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("bad.bin");

    let mut w = RunWriter::create(&path)?;
    w.push(10)?;
    let err = w.push(9).unwrap_err();
    match err {
        RunError::OutOfOrder { previous, key, .. } => {
            assert_eq!(previous, 10);
            assert_eq!(key, 9);
        }
        other => panic!("expected OutOfOrder, got {:?}", other),
    }
    assert_eq!(w.len(), 1, "rejected key is not counted");
    Ok(())
}

#[test]
fn empty_streaming_writer_produces_empty_file() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join(MERGED_FILE_NAME);

    let w = RunWriter::create(&path)?;
    assert!(w.is_empty());
    assert_eq!(w.finish()?, 0);
    assert_eq!(fs::metadata(&path)?.len(), 0);
    Ok(())
}

#[test]
fn create_in_missing_directory_reports_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nope").join("run-000000.bin");
    let err = RunWriter::create(&path).err().expect("create should fail");
    assert!(matches!(err, RunError::Io { .. }));
    assert!(err.to_string().contains("run-000000.bin.tmp"), "{}", err);
}
