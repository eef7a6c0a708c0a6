//! Tutorial notebook staging for documentation builds.
//!
//! Copies example notebooks into the docs tree, decides per notebook whether
//! it needs executing, and runs the ones that do through `jupyter nbconvert`
//! so the staged copies carry their outputs.

pub mod executor;
pub mod notebook;
pub mod stager;

pub use executor::{ExecError, NotebookExecutor};
pub use notebook::{Cell, CellType, Notebook, NotebookError, Source};
pub use stager::{ExecuteMode, NotebookStager, StageConfig, StageError, StageReport};
