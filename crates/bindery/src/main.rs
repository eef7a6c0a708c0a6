//! Bindery CLI - documentation build orchestrator.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use bindery_notebook::{ExecuteMode, NotebookStager, StageConfig, StageError};
use bindery_site::{fsutil, NativeConfig, NativeDocsBuilder, SiteBuilder, SiteConfig};

mod config;

#[derive(Parser)]
#[command(name = "bindery")]
#[command(about = "Documentation build orchestrator")]
#[command(version)]
pub struct Cli {
    /// Delete previously staged notebooks before copying fresh ones
    #[arg(long = "clean_notebooks")]
    clean_notebooks: bool,

    /// Notebook execution mode, one of {auto, always}
    #[arg(
        long = "execute_notebooks",
        default_value = "auto",
        value_parser = parse_execute_mode
    )]
    execute_notebooks: ExecuteMode,

    /// Build the documentation site and the API reference
    #[arg(long)]
    sphinx: bool,

    /// Build the native API docs
    #[arg(long)]
    doxygen: bool,

    /// Stamp the release version instead of a development label
    #[arg(long = "is_release")]
    is_release: bool,

    /// Fail the run when a notebook fails to execute
    #[arg(long)]
    ci: bool,

    /// Path to bindery.toml config file
    #[arg(short, long, default_value = "bindery.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_execute_mode(s: &str) -> Result<ExecuteMode, StageError> {
    s.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    let file_config = config::load(&cli.config)?;

    let docs_dir = PathBuf::from(&file_config.docs.dir);
    let html_output_dir = PathBuf::from(&file_config.docs.output);

    // The site tree is rebuilt from scratch on every run.
    fsutil::create_or_clear_dir(&html_output_dir)
        .map_err(|e| anyhow::anyhow!("Failed to clear {}: {}", html_output_dir.display(), e))?;

    if cli.sphinx {
        tracing::info!("Sphinx build enabled");

        tracing::info!("Staging tutorial notebooks");
        let stage_config = StageConfig {
            examples_dir: PathBuf::from(&file_config.notebooks.examples_dir),
            docs_dir: docs_dir.clone(),
            output_subdir: file_config.notebooks.output_subdir.clone(),
            categories: file_config.notebooks.categories.clone(),
            helper_script: file_config.notebooks.helper_script.clone(),
            data_dir: file_config.notebooks.data_dir.as_ref().map(PathBuf::from),
            clean: cli.clean_notebooks,
            mode: cli.execute_notebooks,
            ci: cli.ci,
            timeout: Duration::from_secs(file_config.notebooks.timeout_secs),
        };
        let report = NotebookStager::new(stage_config).run().await?;
        tracing::info!(
            "Staged {} notebooks ({} copied, {} kept), {} executed",
            report.copied + report.skipped,
            report.copied,
            report.skipped,
            report.executed
        );
        if report.failed > 0 {
            tracing::warn!("{} notebooks failed to execute", report.failed);
        }

        tracing::info!("Building Sphinx docs");
        let site_config = SiteConfig {
            docs_dir: docs_dir.clone(),
            html_output_dir: html_output_dir.clone(),
            api_manifest: PathBuf::from(&file_config.docs.api_manifest),
            builder: file_config.site.builder.clone(),
            is_release: cli.is_release,
            version_file: PathBuf::from(&file_config.site.version_file),
        };
        SiteBuilder::new(site_config).run().await?;
    } else {
        tracing::info!("Sphinx build disabled, use --sphinx to enable");
    }

    if cli.doxygen {
        tracing::info!("Doxygen build enabled");
        let native_config = NativeConfig {
            docs_dir,
            html_output_dir,
            generator: file_config.native.generator.clone(),
            config_file: file_config.native.config_file.clone(),
            scratch_dir: file_config.native.scratch_dir.clone(),
            output_subdir: file_config.native.output_subdir.clone(),
        };
        NativeDocsBuilder::new(native_config).run().await?;
    } else {
        tracing::info!("Doxygen build disabled, use --doxygen to enable");
    }

    Ok(())
}
