//! Stages tutorial notebooks into the docs tree and executes the ones that
//! need fresh outputs.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use walkdir::WalkDir;

use crate::executor::{ExecError, NotebookExecutor, DEFAULT_TIMEOUT_SECS};
use crate::notebook::{Notebook, NotebookError};

/// When staged notebooks get executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteMode {
    /// Execute only notebooks that have code but no recorded output.
    Auto,

    /// Execute every staged notebook.
    Always,
}

impl ExecuteMode {
    /// Decide whether a notebook should be executed under this mode.
    pub fn should_execute(self, has_code: bool, has_output: bool) -> bool {
        match self {
            ExecuteMode::Auto => has_code && !has_output,
            ExecuteMode::Always => true,
        }
    }
}

impl FromStr for ExecuteMode {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(ExecuteMode::Auto),
            "always" => Ok(ExecuteMode::Always),
            other => Err(StageError::InvalidExecuteMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for ExecuteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecuteMode::Auto => f.write_str("auto"),
            ExecuteMode::Always => f.write_str("always"),
        }
    }
}

/// Configuration for a staging run.
#[derive(Debug, Clone)]
pub struct StageConfig {
    /// Directory holding the example notebooks, one subdirectory per category
    pub examples_dir: PathBuf,

    /// Documentation tree the notebooks are staged into
    pub docs_dir: PathBuf,

    /// Subdirectory of `docs_dir` receiving the staged categories
    pub output_subdir: String,

    /// Example categories to stage, in order
    pub categories: Vec<String>,

    /// Helper script copied from the examples root next to the categories
    pub helper_script: String,

    /// Optional data directory copied fresh into `docs_dir`
    pub data_dir: Option<PathBuf>,

    /// Delete previously staged notebooks before copying
    pub clean: bool,

    /// Execution mode
    pub mode: ExecuteMode,

    /// Fail the run on notebook execution errors
    pub ci: bool,

    /// Per-notebook execution timeout
    pub timeout: Duration,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            examples_dir: PathBuf::from("examples/python"),
            docs_dir: PathBuf::from("docs"),
            output_subdir: "tutorial".to_string(),
            categories: vec!["basic".to_string(), "advanced".to_string()],
            helper_script: "tutorial_helpers.py".to_string(),
            data_dir: None,
            clean: false,
            mode: ExecuteMode::Auto,
            ci: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Result of a staging run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    /// Notebooks copied into the docs tree this run
    pub copied: usize,

    /// Notebooks already present and kept as-is
    pub skipped: usize,

    /// Notebooks executed and rewritten with fresh outputs
    pub executed: usize,

    /// Notebooks whose execution failed without failing the run
    pub failed: usize,
}

/// Errors that can occur while staging notebooks.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("Invalid execute option: {0}, expected \"auto\" or \"always\"")]
    InvalidExecuteMode(String),

    #[error("Failed to stage data directory {path}: {message}")]
    DataCopy { path: String, message: String },

    #[error("Failed to copy helper script {path}: {message}")]
    HelperCopy { path: String, message: String },

    #[error("Failed to stage {path}: {message}")]
    Stage { path: String, message: String },

    #[error("Notebook {path}: {source}")]
    Notebook {
        path: String,
        #[source]
        source: NotebookError,
    },

    #[error("Execution of {path} failed: {source}")]
    Execution {
        path: String,
        #[source]
        source: ExecError,
    },

    #[error("Failed to rewrite {path}: {message}")]
    Rewrite { path: String, message: String },
}

/// Copies example notebooks into the docs tree and executes the ones whose
/// outputs are missing or forced by the execution mode.
pub struct NotebookStager {
    config: StageConfig,
    executor: NotebookExecutor,
}

impl NotebookStager {
    /// Create a new stager.
    pub fn new(config: StageConfig) -> Self {
        let executor = NotebookExecutor::new(config.timeout);
        tracing::info!("Notebook execution mode: {}", config.mode);
        Self { config, executor }
    }

    /// Replace the executor, e.g. to run a different interpreter binary.
    pub fn with_executor(mut self, executor: NotebookExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Stage every configured category, then execute what needs executing.
    pub async fn run(&self) -> Result<StageReport, StageError> {
        if let Some(ref data_dir) = self.config.data_dir {
            self.stage_data_dir(data_dir)?;
        }

        let tutorial_dir = self.config.docs_dir.join(&self.config.output_subdir);
        self.copy_helper_script(&tutorial_dir)?;

        let mut report = StageReport::default();
        let mut staged = Vec::new();

        for category in &self.config.categories {
            let in_dir = self.config.examples_dir.join(category);
            let out_dir = tutorial_dir.join(category);

            if !in_dir.is_dir() {
                tracing::warn!(
                    "Example category {} not found, staging nothing",
                    in_dir.display()
                );
                continue;
            }

            fs::create_dir_all(&out_dir).map_err(|e| StageError::Stage {
                path: out_dir.display().to_string(),
                message: e.to_string(),
            })?;

            if self.config.clean {
                for nb_out_path in notebooks_in(&out_dir)? {
                    tracing::info!("Delete: {}", nb_out_path.display());
                    fs::remove_file(&nb_out_path).map_err(|e| StageError::Stage {
                        path: nb_out_path.display().to_string(),
                        message: e.to_string(),
                    })?;
                }
            }

            for nb_in_path in notebooks_in(&in_dir)? {
                let file_name = match nb_in_path.file_name() {
                    Some(name) => name,
                    None => continue,
                };
                let nb_out_path = out_dir.join(file_name);

                if nb_out_path.is_file() {
                    // Keep the existing copy; it may already carry outputs.
                    tracing::info!("Copy skipped: {}", nb_out_path.display());
                    report.skipped += 1;
                } else {
                    tracing::info!(
                        "Copy: {} -> {}",
                        nb_in_path.display(),
                        nb_out_path.display()
                    );
                    fs::copy(&nb_in_path, &nb_out_path).map_err(|e| StageError::Stage {
                        path: nb_out_path.display().to_string(),
                        message: e.to_string(),
                    })?;
                    report.copied += 1;
                }
                staged.push(nb_out_path);
            }
        }

        for nb_path in &staged {
            self.process(nb_path, &mut report).await?;
        }

        Ok(report)
    }

    /// Parse one staged notebook, decide whether to execute it, and rewrite
    /// it in place when execution succeeds.
    async fn process(&self, nb_path: &Path, report: &mut StageReport) -> Result<(), StageError> {
        let name = nb_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| nb_path.display().to_string());
        tracing::info!("Processing notebook {}", name);

        let notebook = Notebook::load(nb_path).map_err(|e| StageError::Notebook {
            path: nb_path.display().to_string(),
            source: e,
        })?;

        let has_code = notebook.has_code();
        let has_output = notebook.has_output();
        let execute = self.config.mode.should_execute(has_code, has_output);
        tracing::info!(
            "has_code: {}, has_output: {}, execute: {}",
            has_code,
            has_output,
            execute
        );

        if !execute {
            return Ok(());
        }

        match self.execute_and_validate(nb_path).await {
            Ok(bytes) => {
                fs::write(nb_path, &bytes).map_err(|e| StageError::Rewrite {
                    path: nb_path.display().to_string(),
                    message: e.to_string(),
                })?;
                report.executed += 1;
            }
            Err(e) => {
                tracing::error!("Execution of {} failed: {}", name, e);
                if self.config.ci {
                    return Err(StageError::Execution {
                        path: nb_path.display().to_string(),
                        source: e,
                    });
                }
                report.failed += 1;
            }
        }

        Ok(())
    }

    async fn execute_and_validate(&self, nb_path: &Path) -> Result<Vec<u8>, ExecError> {
        let bytes = self.executor.execute(nb_path).await?;
        let text = String::from_utf8_lossy(&bytes);
        Notebook::parse(&text).map_err(|e| ExecError::Invalid(e.to_string()))?;
        Ok(bytes)
    }

    /// Copy the configured data directory into the docs tree, replacing any
    /// previously staged copy.
    fn stage_data_dir(&self, data_dir: &Path) -> Result<(), StageError> {
        let copy_err = |path: &Path, e: std::io::Error| StageError::DataCopy {
            path: path.display().to_string(),
            message: e.to_string(),
        };

        let name = data_dir.file_name().unwrap_or(data_dir.as_os_str());
        let dest = self.config.docs_dir.join(name);

        if dest.exists() {
            fs::remove_dir_all(&dest).map_err(|e| copy_err(&dest, e))?;
        }

        for entry in WalkDir::new(data_dir).into_iter().filter_map(|e| e.ok()) {
            let relative = entry.path().strip_prefix(data_dir).unwrap_or(entry.path());
            let target = dest.join(relative);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&target).map_err(|e| copy_err(&target, e))?;
            } else {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).map_err(|e| copy_err(parent, e))?;
                }
                fs::copy(entry.path(), &target).map_err(|e| copy_err(&target, e))?;
            }
        }

        tracing::info!(
            "Staged data directory {} -> {}",
            data_dir.display(),
            dest.display()
        );
        Ok(())
    }

    fn copy_helper_script(&self, tutorial_dir: &Path) -> Result<(), StageError> {
        let source = self.config.examples_dir.join(&self.config.helper_script);
        let dest = tutorial_dir.join(&self.config.helper_script);

        fs::create_dir_all(tutorial_dir).map_err(|e| StageError::Stage {
            path: tutorial_dir.display().to_string(),
            message: e.to_string(),
        })?;
        fs::copy(&source, &dest).map_err(|e| StageError::HelperCopy {
            path: source.display().to_string(),
            message: e.to_string(),
        })?;

        tracing::debug!("Copied helper script to {}", dest.display());
        Ok(())
    }
}

/// Notebook files directly inside `dir`, in sorted order.
fn notebooks_in(dir: &Path) -> Result<Vec<PathBuf>, StageError> {
    let read_err = |e: std::io::Error| StageError::Stage {
        path: dir.display().to_string(),
        message: e.to_string(),
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("ipynb") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::tempdir;

    fn executed_notebook() -> String {
        json!({
            "nbformat": 4,
            "nbformat_minor": 5,
            "metadata": {},
            "cells": [
                {"cell_type": "code", "source": "x = 1", "outputs": [], "execution_count": 1},
            ],
        })
        .to_string()
    }

    fn fresh_notebook() -> String {
        json!({
            "nbformat": 4,
            "nbformat_minor": 5,
            "metadata": {},
            "cells": [
                {"cell_type": "code", "source": "x = 1", "outputs": [], "execution_count": null},
            ],
        })
        .to_string()
    }

    #[cfg(unix)]
    fn fake_jupyter(root: &Path, stdout: &str) -> NotebookExecutor {
        use std::os::unix::fs::PermissionsExt;

        let script = root.join("fake-jupyter.sh");
        fs::write(&script, format!("#!/bin/sh\ncat <<'EOF'\n{}\nEOF\n", stdout)).unwrap();
        let mut perms = fs::metadata(&script).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script, perms).unwrap();
        NotebookExecutor::default().with_program(script.to_string_lossy())
    }

    fn config(root: &Path) -> StageConfig {
        StageConfig {
            examples_dir: root.join("examples/python"),
            docs_dir: root.join("docs"),
            ..StageConfig::default()
        }
    }

    fn seed_examples(root: &Path, categories: &[&str], notebooks: &[&str]) {
        let examples = root.join("examples/python");
        fs::create_dir_all(&examples).unwrap();
        fs::write(examples.join("tutorial_helpers.py"), "HELPERS = True\n").unwrap();
        for category in categories {
            let dir = examples.join(category);
            fs::create_dir_all(&dir).unwrap();
            for notebook in notebooks {
                fs::write(dir.join(notebook), executed_notebook()).unwrap();
            }
        }
    }

    #[test]
    fn mode_parses_auto_and_always_only() {
        assert_eq!("auto".parse::<ExecuteMode>().unwrap(), ExecuteMode::Auto);
        assert_eq!(
            "always".parse::<ExecuteMode>().unwrap(),
            ExecuteMode::Always
        );
        let err = "bogus".parse::<ExecuteMode>().unwrap_err();
        assert!(matches!(err, StageError::InvalidExecuteMode(ref s) if s == "bogus"));
    }

    #[test]
    fn auto_executes_only_unexecuted_code() {
        assert!(ExecuteMode::Auto.should_execute(true, false));
        assert!(!ExecuteMode::Auto.should_execute(true, true));
        assert!(!ExecuteMode::Auto.should_execute(false, false));
        assert!(ExecuteMode::Always.should_execute(true, true));
        assert!(ExecuteMode::Always.should_execute(false, false));
    }

    #[tokio::test]
    async fn stages_notebooks_and_helper_script() {
        let temp = tempdir().unwrap();
        seed_examples(temp.path(), &["basic", "advanced"], &["a.ipynb", "b.ipynb"]);

        let stager = NotebookStager::new(config(temp.path()));
        let report = stager.run().await.unwrap();

        assert_eq!(report.copied, 4);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.executed, 0);

        let tutorial = temp.path().join("docs/tutorial");
        assert!(tutorial.join("tutorial_helpers.py").is_file());
        assert!(tutorial.join("basic/a.ipynb").is_file());
        assert!(tutorial.join("advanced/b.ipynb").is_file());
    }

    #[tokio::test]
    async fn existing_copies_are_kept_not_overwritten() {
        let temp = tempdir().unwrap();
        seed_examples(temp.path(), &["basic"], &["a.ipynb"]);

        let stager = NotebookStager::new(config(temp.path()));
        stager.run().await.unwrap();

        let staged = temp.path().join("docs/tutorial/basic/a.ipynb");
        let original = fs::read_to_string(&staged).unwrap();

        // A changed source must not clobber the staged copy.
        fs::write(
            temp.path().join("examples/python/basic/a.ipynb"),
            executed_notebook().replace("x = 1", "y = 2"),
        )
        .unwrap();

        let report = stager.run().await.unwrap();
        assert_eq!(report.copied, 0);
        assert_eq!(report.skipped, 1);
        assert_eq!(fs::read_to_string(&staged).unwrap(), original);
    }

    #[tokio::test]
    async fn clean_removes_stale_staged_notebooks() {
        let temp = tempdir().unwrap();
        seed_examples(temp.path(), &["basic"], &["a.ipynb"]);

        let out_dir = temp.path().join("docs/tutorial/basic");
        fs::create_dir_all(&out_dir).unwrap();
        fs::write(out_dir.join("gone.ipynb"), executed_notebook()).unwrap();
        fs::write(out_dir.join("index.rst"), "toctree").unwrap();

        let stager = NotebookStager::new(StageConfig {
            clean: true,
            ..config(temp.path())
        });
        stager.run().await.unwrap();

        assert!(!out_dir.join("gone.ipynb").exists());
        assert!(out_dir.join("a.ipynb").is_file());
        // Only notebooks are cleaned.
        assert!(out_dir.join("index.rst").is_file());
    }

    #[tokio::test]
    async fn missing_helper_script_is_fatal() {
        let temp = tempdir().unwrap();
        let examples = temp.path().join("examples/python/basic");
        fs::create_dir_all(&examples).unwrap();
        fs::write(examples.join("a.ipynb"), executed_notebook()).unwrap();

        let stager = NotebookStager::new(config(temp.path()));
        let err = stager.run().await.unwrap_err();
        assert!(matches!(err, StageError::HelperCopy { .. }));
    }

    #[tokio::test]
    async fn missing_category_stages_nothing() {
        let temp = tempdir().unwrap();
        seed_examples(temp.path(), &["basic"], &["a.ipynb"]);

        let stager = NotebookStager::new(StageConfig {
            categories: vec!["basic".to_string(), "expert".to_string()],
            ..config(temp.path())
        });
        let report = stager.run().await.unwrap();

        assert_eq!(report.copied, 1);
        assert!(!temp.path().join("docs/tutorial/expert").exists());
    }

    #[tokio::test]
    async fn data_directory_is_staged_fresh() {
        let temp = tempdir().unwrap();
        seed_examples(temp.path(), &["basic"], &["a.ipynb"]);

        let data = temp.path().join("examples/test_data");
        fs::create_dir_all(data.join("fragment")).unwrap();
        fs::write(data.join("fragment/mesh.ply"), "ply").unwrap();

        let staged_data = temp.path().join("docs/test_data");
        fs::create_dir_all(&staged_data).unwrap();
        fs::write(staged_data.join("stale.ply"), "old").unwrap();

        let stager = NotebookStager::new(StageConfig {
            data_dir: Some(data),
            ..config(temp.path())
        });
        stager.run().await.unwrap();

        assert!(staged_data.join("fragment/mesh.ply").is_file());
        assert!(!staged_data.join("stale.ply").exists());
    }

    #[tokio::test]
    async fn malformed_staged_notebook_is_fatal() {
        let temp = tempdir().unwrap();
        seed_examples(temp.path(), &["basic"], &[]);
        fs::write(
            temp.path().join("examples/python/basic/broken.ipynb"),
            "{not json",
        )
        .unwrap();

        let stager = NotebookStager::new(config(temp.path()));
        let err = stager.run().await.unwrap_err();
        assert!(matches!(err, StageError::Notebook { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn fresh_code_notebook_is_executed_and_rewritten() {
        let temp = tempdir().unwrap();
        let examples = temp.path().join("examples/python/basic");
        fs::create_dir_all(&examples).unwrap();
        fs::write(
            temp.path().join("examples/python/tutorial_helpers.py"),
            "HELPERS = True\n",
        )
        .unwrap();
        fs::write(examples.join("a.ipynb"), fresh_notebook()).unwrap();

        let stager = NotebookStager::new(config(temp.path()))
            .with_executor(fake_jupyter(temp.path(), &executed_notebook()));
        let report = stager.run().await.unwrap();

        assert_eq!(report.executed, 1);
        assert_eq!(report.failed, 0);
        let staged = fs::read_to_string(temp.path().join("docs/tutorial/basic/a.ipynb")).unwrap();
        assert!(staged.contains("\"execution_count\":1"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unparseable_execution_output_leaves_the_staged_copy_intact() {
        let temp = tempdir().unwrap();
        seed_examples(temp.path(), &["basic"], &[]);
        fs::write(
            temp.path().join("examples/python/basic/a.ipynb"),
            fresh_notebook(),
        )
        .unwrap();

        let stager = NotebookStager::new(config(temp.path()))
            .with_executor(fake_jupyter(temp.path(), "{not a notebook"));
        let report = stager.run().await.unwrap();

        assert_eq!(report.executed, 0);
        assert_eq!(report.failed, 1);
        let staged = fs::read_to_string(temp.path().join("docs/tutorial/basic/a.ipynb")).unwrap();
        assert_eq!(staged, fresh_notebook());
    }

    #[tokio::test]
    async fn execution_failure_is_swallowed_outside_ci() {
        let temp = tempdir().unwrap();
        seed_examples(temp.path(), &["basic"], &["a.ipynb"]);

        let stager = NotebookStager::new(StageConfig {
            mode: ExecuteMode::Always,
            ..config(temp.path())
        })
        .with_executor(NotebookExecutor::default().with_program("false"));

        let report = stager.run().await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.executed, 0);
    }

    #[tokio::test]
    async fn execution_failure_fails_the_run_under_ci() {
        let temp = tempdir().unwrap();
        seed_examples(temp.path(), &["basic"], &["a.ipynb"]);

        let stager = NotebookStager::new(StageConfig {
            mode: ExecuteMode::Always,
            ci: true,
            ..config(temp.path())
        })
        .with_executor(NotebookExecutor::default().with_program("false"));

        let err = stager.run().await.unwrap_err();
        assert!(matches!(err, StageError::Execution { .. }));
    }
}
