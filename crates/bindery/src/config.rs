//! Configuration file loading (bindery.toml).

use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

/// Configuration file structure (bindery.toml).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub docs: DocsConfig,
    #[serde(default)]
    pub site: SiteSettings,
    #[serde(default)]
    pub native: NativeSettings,
    #[serde(default)]
    pub notebooks: NotebookSettings,
}

#[derive(Debug, Deserialize)]
pub struct DocsConfig {
    /// Source docs directory
    #[serde(default = "default_docs_dir")]
    pub dir: String,

    /// Final site output directory
    #[serde(default = "default_output")]
    pub output: String,

    /// API registry manifest
    #[serde(default = "default_api_manifest")]
    pub api_manifest: String,
}

#[derive(Debug, Deserialize)]
pub struct SiteSettings {
    /// Site generator binary
    #[serde(default = "default_site_builder")]
    pub builder: String,

    /// Version file consulted for release builds
    #[serde(default = "default_version_file")]
    pub version_file: String,
}

#[derive(Debug, Deserialize)]
pub struct NativeSettings {
    /// Native doc generator binary
    #[serde(default = "default_native_generator")]
    pub generator: String,

    /// Generator configuration file inside the docs dir
    #[serde(default = "default_native_config_file")]
    pub config_file: String,

    /// Scratch directory the generator writes into
    #[serde(default = "default_native_scratch_dir")]
    pub scratch_dir: String,

    /// Subdirectory of the site `html/` tree receiving the output
    #[serde(default = "default_native_output_subdir")]
    pub output_subdir: String,
}

#[derive(Debug, Deserialize)]
pub struct NotebookSettings {
    /// Directory holding the example notebooks
    #[serde(default = "default_examples_dir")]
    pub examples_dir: String,

    /// Example categories staged into the docs tree
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    /// Helper script copied next to the staged notebooks
    #[serde(default = "default_helper_script")]
    pub helper_script: String,

    /// Optional data directory copied fresh into the docs tree
    pub data_dir: Option<String>,

    /// Subdirectory of the docs dir receiving the staged categories
    #[serde(default = "default_notebook_output_subdir")]
    pub output_subdir: String,

    /// Per-notebook execution timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_docs_dir() -> String {
    "docs".to_string()
}
fn default_output() -> String {
    "docs/_out".to_string()
}
fn default_api_manifest() -> String {
    "docs/api.toml".to_string()
}
fn default_site_builder() -> String {
    "sphinx-build".to_string()
}
fn default_version_file() -> String {
    "src/version.txt".to_string()
}
fn default_native_generator() -> String {
    "doxygen".to_string()
}
fn default_native_config_file() -> String {
    "Doxyfile".to_string()
}
fn default_native_scratch_dir() -> String {
    "doxygen".to_string()
}
fn default_native_output_subdir() -> String {
    "cpp_api".to_string()
}
fn default_examples_dir() -> String {
    "examples/python".to_string()
}
fn default_categories() -> Vec<String> {
    vec!["basic".to_string(), "advanced".to_string()]
}
fn default_helper_script() -> String {
    "tutorial_helpers.py".to_string()
}
fn default_notebook_output_subdir() -> String {
    "tutorial".to_string()
}
fn default_timeout_secs() -> u64 {
    bindery_notebook::executor::DEFAULT_TIMEOUT_SECS
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            dir: default_docs_dir(),
            output: default_output(),
            api_manifest: default_api_manifest(),
        }
    }
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            builder: default_site_builder(),
            version_file: default_version_file(),
        }
    }
}

impl Default for NativeSettings {
    fn default() -> Self {
        Self {
            generator: default_native_generator(),
            config_file: default_native_config_file(),
            scratch_dir: default_native_scratch_dir(),
            output_subdir: default_native_output_subdir(),
        }
    }
}

impl Default for NotebookSettings {
    fn default() -> Self {
        Self {
            examples_dir: default_examples_dir(),
            categories: default_categories(),
            helper_script: default_helper_script(),
            data_dir: None,
            output_subdir: default_notebook_output_subdir(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load(path: &Path) -> Result<ConfigFile> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        let config: ConfigFile = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
        tracing::info!("Loaded config from {}", path.display());
        return Ok(config);
    }
    Ok(ConfigFile::default())
}
