//! Native API doc builder: runs the external generator in the docs tree and
//! relocates its HTML output into the final site tree.

use std::fs;
use std::path::PathBuf;

use tokio::process::Command;

use crate::fsutil;

/// Configuration for a native API docs build.
#[derive(Debug, Clone)]
pub struct NativeConfig {
    /// Docs directory the generator runs in
    pub docs_dir: PathBuf,

    /// Output directory receiving the `html/` tree
    pub html_output_dir: PathBuf,

    /// Generator binary
    pub generator: String,

    /// Generator configuration file, relative to `docs_dir`
    pub config_file: String,

    /// Scratch directory the generator writes into, relative to `docs_dir`
    pub scratch_dir: String,

    /// Subdirectory of `<output>/html` receiving the relocated HTML
    pub output_subdir: String,
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("docs"),
            html_output_dir: PathBuf::from("docs/_out"),
            generator: "doxygen".to_string(),
            config_file: "Doxyfile".to_string(),
            scratch_dir: "doxygen".to_string(),
            output_subdir: "cpp_api".to_string(),
        }
    }
}

/// Errors that can occur during a native docs build.
#[derive(Debug, thiserror::Error)]
pub enum NativeError {
    #[error("Failed to prepare scratch directory {path}: {message}")]
    Scratch { path: String, message: String },

    #[error("Failed to launch {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("Native docs build failed ({status})")]
    GeneratorFailed { status: String },

    #[error("Generator produced no HTML output at {path}")]
    MissingOutput { path: String },

    #[error("Failed to relocate generated HTML to {path}: {message}")]
    Relocate { path: String, message: String },
}

/// Runs the native doc generator and relocates its HTML output.
pub struct NativeDocsBuilder {
    config: NativeConfig,
}

impl NativeDocsBuilder {
    /// Create a new native docs builder.
    pub fn new(config: NativeConfig) -> Self {
        Self { config }
    }

    /// Clear the scratch directory, run the generator, relocate its HTML.
    pub async fn run(&self) -> Result<(), NativeError> {
        let scratch = self.config.docs_dir.join(&self.config.scratch_dir);
        let scratch_err = |e: std::io::Error| NativeError::Scratch {
            path: scratch.display().to_string(),
            message: e.to_string(),
        };
        fsutil::create_or_clear_dir(&scratch).map_err(scratch_err)?;

        tracing::info!(
            "Calling: \"{} {}\"",
            self.config.generator,
            self.config.config_file
        );
        let status = Command::new(&self.config.generator)
            .arg(&self.config.config_file)
            .current_dir(&self.config.docs_dir)
            .status()
            .await
            .map_err(|e| NativeError::Spawn {
                program: self.config.generator.clone(),
                message: e.to_string(),
            })?;
        if !status.success() {
            return Err(NativeError::GeneratorFailed {
                status: status.to_string(),
            });
        }

        let html = scratch.join("html");
        if !html.is_dir() {
            return Err(NativeError::MissingOutput {
                path: html.display().to_string(),
            });
        }

        let dest = self
            .config
            .html_output_dir
            .join("html")
            .join(&self.config.output_subdir);
        fsutil::copy_dir_recursive(&html, &dest).map_err(|e| NativeError::Relocate {
            path: dest.display().to_string(),
            message: e.to_string(),
        })?;
        tracing::info!("Relocated native API docs to {}", dest.display());

        fs::remove_dir_all(&scratch).map_err(scratch_err)?;

        Ok(())
    }
}
