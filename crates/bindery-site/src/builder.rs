//! Site builder: regenerates the API reference stubs, then runs the external
//! site generator over the docs tree.

use std::path::PathBuf;

use tokio::process::Command;

use bindery_reference::{ApiRegistry, EmitError, ReferenceEmitter, RegistryError};

use crate::index::{documented_modules, IndexError};
use crate::version::{release_version, VersionError};

// Other pages link into this directory by name, so the stubs cannot live in
// a scratch location.
const REFERENCE_SUBDIR: &str = "python_api";

/// Configuration for building the documentation site.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Source docs directory
    pub docs_dir: PathBuf,

    /// Output directory receiving the `html/` tree
    pub html_output_dir: PathBuf,

    /// API registry manifest
    pub api_manifest: PathBuf,

    /// Site generator binary
    pub builder: String,

    /// Stamp the release version into the build instead of a dev label
    pub is_release: bool,

    /// Version file consulted when `is_release` is set
    pub version_file: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("docs"),
            html_output_dir: PathBuf::from("docs/_out"),
            api_manifest: PathBuf::from("docs/api.toml"),
            builder: "sphinx-build".to_string(),
            is_release: false,
            version_file: PathBuf::from("src/version.txt"),
        }
    }
}

/// Errors that can occur during a site build.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error("Failed to launch {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("Site build failed ({status})")]
    BuilderFailed { status: String },
}

/// Builds the documentation site.
///
/// The reference stubs are regenerated on every build so the site always
/// reflects the current registry, then the external generator renders the
/// whole docs tree into `<output>/html`.
pub struct SiteBuilder {
    config: SiteConfig,
}

impl SiteBuilder {
    /// Create a new site builder.
    pub fn new(config: SiteConfig) -> Self {
        Self { config }
    }

    /// Generate the reference stubs, then run the site generator.
    pub async fn run(&self) -> Result<(), SiteError> {
        self.generate_reference()?;
        self.run_builder().await
    }

    fn generate_reference(&self) -> Result<(), SiteError> {
        let modules = documented_modules(&self.config.docs_dir.join("index.rst"))?;
        let registry = ApiRegistry::load(&self.config.api_manifest)?;
        let output_dir = self.config.docs_dir.join(REFERENCE_SUBDIR);

        tracing::info!(
            "Generating reference stubs in directory: {}",
            output_dir.display()
        );
        ReferenceEmitter::new(output_dir, registry).emit(&modules)?;
        Ok(())
    }

    async fn run_builder(&self) -> Result<(), SiteError> {
        let build_dir = self.config.html_output_dir.join("html");

        let mut args: Vec<String> = vec!["-b".to_string(), "html".to_string()];
        if self.config.is_release {
            let version = release_version(&self.config.version_file)?;
            tracing::info!("Building docs for release: {}", version);
            args.push("-D".to_string());
            args.push(format!("version={}", version));
            args.push("-D".to_string());
            args.push(format!("release={}", version));
        }
        args.push(self.config.docs_dir.display().to_string());
        args.push(build_dir.display().to_string());

        tracing::info!("Calling: \"{} {}\"", self.config.builder, args.join(" "));

        let status = Command::new(&self.config.builder)
            .args(&args)
            .status()
            .await
            .map_err(|e| SiteError::Spawn {
                program: self.config.builder.clone(),
                message: e.to_string(),
            })?;

        if !status.success() {
            return Err(SiteError::BuilderFailed {
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    const MANIFEST: &str = r#"
[[module]]
name = "pkg.geometry"
classes = ["PointCloud"]
functions = ["read_point_cloud"]
"#;

    fn seed_docs(root: &Path, index_lines: &str) -> SiteConfig {
        let docs = root.join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("index.rst"), index_lines).unwrap();
        fs::write(docs.join("api.toml"), MANIFEST).unwrap();

        SiteConfig {
            docs_dir: docs.clone(),
            html_output_dir: root.join("out"),
            api_manifest: docs.join("api.toml"),
            builder: "true".to_string(),
            is_release: false,
            version_file: root.join("version.txt"),
        }
    }

    #[tokio::test]
    async fn run_generates_stubs_then_invokes_the_builder() {
        let temp = tempdir().unwrap();
        let config = seed_docs(temp.path(), "    python_api/pkg.geometry\n");

        SiteBuilder::new(config.clone()).run().await.unwrap();

        let stubs = config.docs_dir.join("python_api");
        assert!(stubs.join("pkg.geometry.rst").is_file());
        assert!(stubs.join("pkg.geometry.PointCloud.rst").is_file());
        assert!(stubs.join("pkg.geometry.read_point_cloud.rst").is_file());
    }

    #[tokio::test]
    async fn failing_builder_surfaces_the_exit_status() {
        let temp = tempdir().unwrap();
        let mut config = seed_docs(temp.path(), "    python_api/pkg.geometry\n");
        config.builder = "false".to_string();

        let err = SiteBuilder::new(config).run().await.unwrap_err();
        assert!(matches!(err, SiteError::BuilderFailed { .. }));
    }

    #[tokio::test]
    async fn unregistered_index_module_aborts_the_build() {
        let temp = tempdir().unwrap();
        let config = seed_docs(temp.path(), "    python_api/pkg.missing\n");

        let err = SiteBuilder::new(config).run().await.unwrap_err();
        assert!(matches!(err, SiteError::Emit(EmitError::Registry(_))));
    }

    #[tokio::test]
    async fn release_mode_requires_a_version_file() {
        let temp = tempdir().unwrap();
        let mut config = seed_docs(temp.path(), "    python_api/pkg.geometry\n");
        config.is_release = true;

        let err = SiteBuilder::new(config).run().await.unwrap_err();
        assert!(matches!(err, SiteError::Version(_)));
    }

    #[tokio::test]
    async fn release_mode_reads_the_version_file() {
        let temp = tempdir().unwrap();
        let mut config = seed_docs(temp.path(), "    python_api/pkg.geometry\n");
        config.is_release = true;
        fs::write(&config.version_file, "header\nversion 1 2 3\n").unwrap();

        SiteBuilder::new(config).run().await.unwrap();
    }
}
