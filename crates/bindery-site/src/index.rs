//! Reads the documented-module list out of the site index page.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static MODULE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*python_api/(\S+)\s*$").expect("Invalid module line regex")
});

/// Errors from reading the index page.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Failed to read index {path}: {message}")]
    Read { path: String, message: String },
}

/// Module names referenced as `python_api/<name>` lines in the index page,
/// in the order they appear.
pub fn documented_modules(index_path: &Path) -> Result<Vec<String>, IndexError> {
    let text = fs::read_to_string(index_path).map_err(|e| IndexError::Read {
        path: index_path.display().to_string(),
        message: e.to_string(),
    })?;

    Ok(text
        .lines()
        .filter_map(|line| MODULE_LINE_RE.captures(line))
        .map(|captures| captures[1].to_string())
        .collect())
}
