use crate::*;
use anyhow::Result;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use std::fs;
use std::io::Cursor;
use tempfile::tempdir;

fn bytes_of(keys: &[Key]) -> Vec<u8> {
    keys.iter().flat_map(|k| k.to_le_bytes()).collect()
}

// -------------------- Round trip --------------------

#[test]
fn round_trip_preserves_sequence() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("run.bin");

    let mut rng = StdRng::seed_from_u64(1);
    let mut keys: Vec<Key> = (0..10_000).map(|_| rng.gen_range(0..5_000)).collect();
    keys.sort_unstable();

    RunWriter::write_sorted(&path, &keys)?;

    let mut r = RunReader::open(&path)?;
    assert_eq!(r.len(), Some(keys.len() as u64));
    assert_eq!(r.read_all()?, keys);
    assert_eq!(r.keys_read(), keys.len() as u64);
    Ok(())
}

#[test]
fn round_trip_spanning_buffer_boundaries() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("big.bin");

    // more than one READ_BUFFER_BYTES worth of keys
    let keys: Vec<Key> = (0..(READ_BUFFER_BYTES as u32 / 2)).collect();
    RunWriter::write_sorted(&path, &keys)?;

    let read: Vec<Key> = RunReader::open(&path)?.collect::<Result<_, _>>()?;
    assert_eq!(read, keys);
    Ok(())
}

#[test]
fn empty_file_yields_no_keys() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("empty.bin");
    fs::write(&path, b"")?;

    let mut r = RunReader::open(&path)?;
    assert_eq!(r.len(), Some(0));
    assert_eq!(r.next_key()?, None);
    // stays exhausted
    assert_eq!(r.next_key()?, None);
    Ok(())
}

// -------------------- Corruption --------------------

#[test]
fn misaligned_file_is_rejected_on_open() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("odd.bin");
    fs::write(&path, [1u8, 0, 0, 0, 2, 0])?;

    match RunReader::open(&path) {
        Err(RunError::Misaligned { len, .. }) => assert_eq!(len, 6),
        Err(other) => panic!("expected Misaligned, got {:?}", other),
        Ok(_) => panic!("expected Misaligned, got a reader"),
    }
    Ok(())
}

#[test]
fn truncated_tail_in_stream_is_an_error() {
    let mut data = bytes_of(&[1, 2]);
    data.extend_from_slice(&[9, 9]);

    let mut r = RunReader::from_reader("mem", Cursor::new(data));
    assert_eq!(r.next_key().unwrap(), Some(1));
    assert_eq!(r.next_key().unwrap(), Some(2));
    let err = r.next_key().unwrap_err();
    assert!(matches!(err, RunError::TruncatedKey { .. }));
    assert!(err.to_string().contains("mem"));
}

#[test]
fn missing_file_reports_io_error_with_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gone.bin");
    let err = RunReader::open(&path).err().expect("open should fail");
    assert!(matches!(err, RunError::Io { .. }));
    assert!(err.to_string().contains("gone.bin"));
}

// -------------------- In-memory sources --------------------

#[test]
fn from_reader_decodes_little_endian() -> Result<()> {
    let data = bytes_of(&[0x0A00_0001, 0xFFFF_FFFF]);
    let mut r = RunReader::from_reader("mem", Cursor::new(data));
    assert_eq!(r.len(), None);
    assert_eq!(r.read_all()?, vec![0x0A00_0001, 0xFFFF_FFFF]);
    Ok(())
}
