//! Site assembly: reference stub generation plus the external doc builders.
//!
//! The site builder regenerates the API reference stubs and hands the docs
//! tree to the external site generator; the native builder wraps the C++ doc
//! generator and relocates its HTML into the final site tree.

pub mod builder;
pub mod fsutil;
pub mod index;
pub mod native;
pub mod version;

pub use builder::{SiteBuilder, SiteConfig, SiteError};
pub use index::documented_modules;
pub use native::{NativeConfig, NativeDocsBuilder, NativeError};
pub use version::release_version;
