//! Filesystem helpers shared by the doc builders.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Remove `dir` if present, then recreate it empty.
pub fn create_or_clear_dir(dir: &Path) -> io::Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
        tracing::info!("Removed directory {}", dir.display());
    }
    fs::create_dir_all(dir)?;
    tracing::info!("Created directory {}", dir.display());
    Ok(())
}

/// Recursively copy `src` into `dest`, creating directories as needed.
pub fn copy_dir_recursive(src: &Path, dest: &Path) -> io::Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
