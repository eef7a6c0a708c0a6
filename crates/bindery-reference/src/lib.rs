//! API reference stub generation for documentation trees.
//!
//! Resolves dotted module names against an explicit API registry and writes
//! one reStructuredText stub per module, class and function for the
//! downstream site generator to render.

pub mod emitter;
pub mod registry;
pub mod templates;

pub use emitter::{EmitError, EmitReport, ReferenceEmitter};
pub use registry::{ApiModule, ApiRegistry, RegistryError};
pub use templates::{MemberContext, ModuleContext, TemplateEngine};
