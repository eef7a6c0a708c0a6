//! Reference emitter: one descriptor stub per module, class and function.

use std::fs;
use std::path::{Path, PathBuf};

use crate::registry::{ApiRegistry, RegistryError};
use crate::templates::{MemberContext, ModuleContext, TemplateEngine};

/// Result of an emit pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitReport {
    /// Number of module stubs written
    pub modules: usize,

    /// Number of class stubs written
    pub classes: usize,

    /// Number of function stubs written
    pub functions: usize,
}

impl EmitReport {
    /// Total number of stub files written.
    pub fn total(&self) -> usize {
        self.modules + self.classes + self.functions
    }
}

/// Errors that can occur while emitting descriptor stubs.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Failed to render stub for {name}: {message}")]
    Render { name: String, message: String },

    #[error("Failed to clear output directory {path}: {message}")]
    Clear { path: String, message: String },

    #[error("Failed to write {path}: {message}")]
    Write { path: String, message: String },
}

/// Writes reference descriptor stubs for registered modules.
///
/// The output directory is wiped and fully regenerated on every emit; stub
/// files are build artifacts only and are never read back by this crate.
pub struct ReferenceEmitter {
    output_dir: PathBuf,
    registry: ApiRegistry,
    templates: TemplateEngine,
}

impl ReferenceEmitter {
    /// Create an emitter writing into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>, registry: ApiRegistry) -> Self {
        Self {
            output_dir: output_dir.into(),
            registry,
            templates: TemplateEngine::new(),
        }
    }

    /// Directory the stubs are written into.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Clear the output directory and write stubs for every named module.
    ///
    /// Names are resolved against the registry; an unresolvable name aborts
    /// the whole pass. Stub file names and directives use the requested
    /// dotted name, not the canonical one, so aliased spellings document
    /// under the name the site tree links to.
    pub fn emit(&self, module_names: &[String]) -> Result<EmitReport, EmitError> {
        self.clear_output_dir()?;

        let mut report = EmitReport {
            modules: 0,
            classes: 0,
            functions: 0,
        };

        for name in module_names {
            let module = self.registry.resolve(name)?;
            tracing::info!("Generating reference stubs for module {}", name);

            for class in &module.classes {
                let ctx = MemberContext::new(name, class);
                let rendered = self
                    .templates
                    .render_class(&ctx)
                    .map_err(|e| EmitError::Render {
                        name: ctx.title.clone(),
                        message: e.to_string(),
                    })?;
                self.write_stub(&format!("{}.{}.rst", name, class), &rendered)?;
                report.classes += 1;
            }

            for function in &module.functions {
                let ctx = MemberContext::new(name, function);
                let rendered = self
                    .templates
                    .render_function(&ctx)
                    .map_err(|e| EmitError::Render {
                        name: ctx.title.clone(),
                        message: e.to_string(),
                    })?;
                self.write_stub(&format!("{}.{}.rst", name, function), &rendered)?;
                report.functions += 1;
            }

            let ctx = ModuleContext::new(name, &module.classes, &module.functions);
            let rendered = self
                .templates
                .render_module(&ctx)
                .map_err(|e| EmitError::Render {
                    name: name.clone(),
                    message: e.to_string(),
                })?;
            self.write_stub(&format!("{}.rst", name), &rendered)?;
            report.modules += 1;
        }

        tracing::info!(
            "Wrote {} reference stubs ({} modules, {} classes, {} functions)",
            report.total(),
            report.modules,
            report.classes,
            report.functions
        );

        Ok(report)
    }

    fn clear_output_dir(&self) -> Result<(), EmitError> {
        let clear_err = |e: std::io::Error| EmitError::Clear {
            path: self.output_dir.display().to_string(),
            message: e.to_string(),
        };

        if self.output_dir.exists() {
            fs::remove_dir_all(&self.output_dir).map_err(clear_err)?;
            tracing::debug!("Removed directory {}", self.output_dir.display());
        }
        fs::create_dir_all(&self.output_dir).map_err(clear_err)?;
        tracing::debug!("Created directory {}", self.output_dir.display());

        Ok(())
    }

    fn write_stub(&self, file_name: &str, content: &str) -> Result<(), EmitError> {
        let path = self.output_dir.join(file_name);
        fs::write(&path, content).map_err(|e| EmitError::Write {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}
