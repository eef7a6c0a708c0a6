//! Runs staged notebooks through `jupyter nbconvert`.

use std::path::Path;
use std::time::Duration;

use tokio::process::Command;

/// Default per-notebook wall-clock execution limit, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 6000;

/// Errors from a single notebook execution.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("Failed to launch {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("Execution timed out after {0} seconds")]
    Timeout(u64),

    #[error("Execution failed ({status}): {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Execution produced an invalid notebook: {0}")]
    Invalid(String),
}

/// Executes a notebook in its own directory and captures the executed
/// document from stdout.
///
/// The child runs with `CI=true` so notebooks can skip interactive or
/// blocking steps, and is killed if it outlives the configured timeout.
#[derive(Debug, Clone)]
pub struct NotebookExecutor {
    program: String,
    timeout: Duration,
}

impl NotebookExecutor {
    /// Create an executor using the `jupyter` binary from `PATH`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: "jupyter".to_string(),
            timeout,
        }
    }

    /// Use a different interpreter binary.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Execute `notebook`, returning the executed document bytes on success.
    pub async fn execute(&self, notebook: &Path) -> Result<Vec<u8>, ExecError> {
        let dir = match notebook.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let file_name = notebook.file_name().map(Path::new).unwrap_or(notebook);

        let mut command = Command::new(&self.program);
        command
            .args(["nbconvert", "--to", "notebook", "--execute", "--stdout"])
            .arg(file_name)
            .current_dir(dir)
            .env("CI", "true")
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(result) => result.map_err(|e| ExecError::Spawn {
                program: self.program.clone(),
                message: e.to_string(),
            })?,
            Err(_) => return Err(ExecError::Timeout(self.timeout.as_secs())),
        };

        if !output.status.success() {
            return Err(ExecError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

impl Default for NotebookExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}
