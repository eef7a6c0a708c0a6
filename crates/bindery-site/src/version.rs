//! Release version extraction from the project version file.

use std::fs;
use std::path::Path;

/// Errors from resolving the release version.
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("Failed to read version file {path}: {message}")]
    Read { path: String, message: String },

    #[error("Version file {path} has no version line")]
    MissingLine { path: String },

    #[error("Malformed version line in {path}: {line:?}")]
    Malformed { path: String, line: String },
}

/// Dotted `major.minor.patch` version from the version file.
///
/// The version sits on the second line as a label followed by the three
/// numeric components; anything after those is ignored.
pub fn release_version(version_file: &Path) -> Result<String, VersionError> {
    let text = fs::read_to_string(version_file).map_err(|e| VersionError::Read {
        path: version_file.display().to_string(),
        message: e.to_string(),
    })?;

    let line = text
        .lines()
        .nth(1)
        .ok_or_else(|| VersionError::MissingLine {
            path: version_file.display().to_string(),
        })?;

    let components: Vec<&str> = line.split_whitespace().skip(1).take(3).collect();
    if components.len() < 3 {
        return Err(VersionError::Malformed {
            path: version_file.display().to_string(),
            line: line.to_string(),
        });
    }

    Ok(components.join("."))
}
