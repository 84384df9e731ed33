use config::CountConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes `lines` (each followed by `\n`) to `dir/input.txt`.
pub fn write_input(dir: &Path, lines: &[&str]) -> PathBuf {
    let path = dir.join("input.txt");
    let mut data = String::new();
    for line in lines {
        data.push_str(line);
        data.push('\n');
    }
    fs::write(&path, data).unwrap();
    path
}

/// Config over `input` holding `capacity` keys per run, with its workspace
/// under `dir/tmp`.
pub fn config_for(input: &Path, dir: &Path, capacity: usize) -> CountConfig {
    CountConfig::new(input)
        .with_buffer_capacity(capacity)
        .with_temp_root(dir.join("tmp"))
}

/// Number of entries left under `dir` (0 if it does not exist).
pub fn count_entries(dir: &Path) -> usize {
    fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
