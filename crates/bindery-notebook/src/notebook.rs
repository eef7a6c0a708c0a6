//! Minimal nbformat 4 document model.
//!
//! Only the fields the stager inspects are modelled; staged files are copied
//! and rewritten as raw bytes, so nothing here needs to round-trip.

use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Errors from reading or parsing a notebook file.
#[derive(Debug, thiserror::Error)]
pub enum NotebookError {
    #[error("Failed to read notebook {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse notebook JSON: {0}")]
    Parse(String),

    #[error("Unsupported notebook format version {0}, expected 4")]
    UnsupportedVersion(u64),
}

/// Cell source, stored by notebooks either as one string or a list of lines.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Source {
    Text(String),
    Lines(Vec<String>),
}

impl Source {
    /// True when the source contains no text at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Source::Text(text) => text.is_empty(),
            Source::Lines(lines) => lines.iter().all(|line| line.is_empty()),
        }
    }
}

impl Default for Source {
    fn default() -> Self {
        Source::Text(String::new())
    }
}

/// Kind of a notebook cell. Unrecognized kinds parse as `Other` so that a
/// notebook using newer cell types still stages cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum CellType {
    Code,
    Markdown,
    Raw,
    Other,
}

impl From<String> for CellType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "code" => CellType::Code,
            "markdown" => CellType::Markdown,
            "raw" => CellType::Raw,
            _ => CellType::Other,
        }
    }
}

/// A single notebook cell.
#[derive(Debug, Clone, Deserialize)]
pub struct Cell {
    pub cell_type: CellType,

    #[serde(default)]
    pub source: Source,

    #[serde(default)]
    pub outputs: Vec<serde_json::Value>,

    #[serde(default)]
    pub execution_count: Option<i64>,
}

/// A parsed notebook document.
#[derive(Debug, Clone, Deserialize)]
pub struct Notebook {
    pub nbformat: u64,

    #[serde(default)]
    pub cells: Vec<Cell>,
}

impl Notebook {
    /// Read and parse a notebook file.
    pub fn load(path: &Path) -> Result<Self, NotebookError> {
        let text = fs::read_to_string(path).map_err(|e| NotebookError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&text)
    }

    /// Parse notebook JSON, rejecting anything that is not nbformat 4.
    pub fn parse(json: &str) -> Result<Self, NotebookError> {
        let notebook: Notebook =
            serde_json::from_str(json).map_err(|e| NotebookError::Parse(e.to_string()))?;
        if notebook.nbformat != 4 {
            return Err(NotebookError::UnsupportedVersion(notebook.nbformat));
        }
        Ok(notebook)
    }

    /// True when any code cell has a non-empty source.
    pub fn has_code(&self) -> bool {
        self.cells
            .iter()
            .any(|c| c.cell_type == CellType::Code && !c.source.is_empty())
    }

    /// True when any code cell carries outputs or a recorded execution count.
    pub fn has_output(&self) -> bool {
        self.cells.iter().any(|c| {
            c.cell_type == CellType::Code
                && (!c.outputs.is_empty() || c.execution_count.is_some())
        })
    }
}
