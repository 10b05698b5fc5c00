//! Atomic file writes shared by every persisted file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Write `contents` to `path` without ever leaving a half-written file.
///
/// Creates the parent directory if needed, writes `<path>.tmp` and renames it
/// over the target.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let temp_path = temp_path_for(path);
    fs::write(&temp_path, contents)?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    Ok(())
}

/// Sibling path with `.tmp` appended to the full file name
pub fn temp_path_for(path: &Path) -> PathBuf {
    sibling_with_suffix(path, "tmp")
}

/// Sibling path with `.bak` appended to the full file name
pub fn backup_path_for(path: &Path) -> PathBuf {
    sibling_with_suffix(path, "bak")
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}
