//! Explicit API registry backing the reference emitter.
//!
//! The documented API surface is declared in a TOML manifest rather than
//! discovered at runtime: one entry per module with its exposed class and
//! native-function names, plus an alias table for dotted names that are
//! reachable under a second spelling.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;

/// A registry of documentable modules.
#[derive(Debug, Default)]
pub struct ApiRegistry {
    /// Module entries keyed by canonical dotted name
    modules: BTreeMap<String, ApiModule>,

    /// Alias table: requested dotted name -> canonical module name
    aliases: BTreeMap<String, String>,
}

/// One documentable module: its exposed classes and native callables.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ApiModule {
    /// Canonical dotted module name
    pub name: String,

    /// Exposed class names
    #[serde(default)]
    pub classes: Vec<String>,

    /// Exposed native-callable names
    #[serde(default)]
    pub functions: Vec<String>,
}

/// On-disk manifest layout.
#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default, rename = "module")]
    modules: Vec<ApiModule>,

    #[serde(default)]
    aliases: BTreeMap<String, String>,
}

impl ApiRegistry {
    /// Load and validate a registry from a TOML manifest file.
    pub fn load(manifest_path: &Path) -> Result<Self, RegistryError> {
        let content = fs::read_to_string(manifest_path).map_err(|e| RegistryError::ManifestRead {
            path: manifest_path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse and validate a registry from manifest text.
    ///
    /// The alias table is checked once here, so resolution never has to
    /// deal with dangling or shadowing aliases.
    pub fn parse(content: &str) -> Result<Self, RegistryError> {
        let manifest: Manifest =
            toml::from_str(content).map_err(|e| RegistryError::ManifestParse(e.to_string()))?;

        let mut modules = BTreeMap::new();
        for module in manifest.modules {
            validate_members(&module)?;
            let name = module.name.clone();
            if modules.insert(name.clone(), module).is_some() {
                return Err(RegistryError::DuplicateModule(name));
            }
        }

        for (alias, target) in &manifest.aliases {
            if modules.contains_key(alias) {
                return Err(RegistryError::AliasShadowsModule(alias.clone()));
            }
            if !modules.contains_key(target) {
                return Err(RegistryError::DanglingAlias {
                    alias: alias.clone(),
                    target: target.clone(),
                });
            }
        }

        Ok(Self {
            modules,
            aliases: manifest.aliases,
        })
    }

    /// Resolve a requested dotted name to its module entry.
    ///
    /// Direct lookup first; names without their own entry go through the
    /// alias table. An unresolvable name is a fatal lookup error for the
    /// caller — there is no skip-and-continue.
    pub fn resolve(&self, name: &str) -> Result<&ApiModule, RegistryError> {
        if let Some(module) = self.modules.get(name) {
            return Ok(module);
        }
        if let Some(target) = self.aliases.get(name) {
            if let Some(module) = self.modules.get(target) {
                return Ok(module);
            }
        }
        Err(RegistryError::UnknownModule(name.to_string()))
    }

    /// Check if a dotted name resolves, directly or through an alias.
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }

    /// Canonical names of all registered modules.
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.keys().map(|n| n.as_str()).collect()
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the registry holds no modules.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Reject member names that appear twice within one module; a collision
/// would make two stubs race for the same output file.
fn validate_members(module: &ApiModule) -> Result<(), RegistryError> {
    let mut seen = HashSet::new();
    for member in module.classes.iter().chain(module.functions.iter()) {
        if !seen.insert(member.as_str()) {
            return Err(RegistryError::DuplicateMember {
                module: module.name.clone(),
                member: member.clone(),
            });
        }
    }
    Ok(())
}

/// Errors that can occur while loading or querying the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Failed to read API manifest {path}: {message}")]
    ManifestRead { path: String, message: String },

    #[error("Failed to parse API manifest: {0}")]
    ManifestParse(String),

    #[error("Duplicate module entry in API manifest: {0}")]
    DuplicateModule(String),

    #[error("Duplicate member '{member}' in module {module}")]
    DuplicateMember { module: String, member: String },

    #[error("Alias '{0}' shadows a registered module")]
    AliasShadowsModule(String),

    #[error("Alias '{alias}' points at unknown module {target}")]
    DanglingAlias { alias: String, target: String },

    #[error("Module not found in API registry: {0}")]
    UnknownModule(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const MANIFEST: &str = r#"
[[module]]
name = "pkg.geometry"
classes = ["TriangleMesh", "PointCloud"]
functions = ["read_point_cloud"]

[[module]]
name = "pkg.utility"
functions = ["set_verbosity_level"]

[aliases]
"pkg.native.geometry" = "pkg.geometry"
"#;

    #[test]
    fn loads_manifest_from_disk() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("api.toml");
        fs::write(&path, MANIFEST).unwrap();

        let registry = ApiRegistry::load(&path).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.module_names(), vec!["pkg.geometry", "pkg.utility"]);
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let temp = tempdir().unwrap();

        let result = ApiRegistry::load(&temp.path().join("nope.toml"));

        assert!(matches!(result, Err(RegistryError::ManifestRead { .. })));
    }

    #[test]
    fn resolves_direct_names() {
        let registry = ApiRegistry::parse(MANIFEST).unwrap();

        let module = registry.resolve("pkg.geometry").unwrap();

        assert_eq!(module.classes, vec!["TriangleMesh", "PointCloud"]);
        assert_eq!(module.functions, vec!["read_point_cloud"]);
    }

    #[test]
    fn resolves_through_alias_table() {
        let registry = ApiRegistry::parse(MANIFEST).unwrap();

        let module = registry.resolve("pkg.native.geometry").unwrap();

        assert_eq!(module.name, "pkg.geometry");
        assert!(registry.contains("pkg.native.geometry"));
    }

    #[test]
    fn unknown_module_is_a_lookup_error() {
        let registry = ApiRegistry::parse(MANIFEST).unwrap();

        let result = registry.resolve("pkg.missing");

        assert!(matches!(result, Err(RegistryError::UnknownModule(name)) if name == "pkg.missing"));
    }

    #[test]
    fn rejects_duplicate_module_entries() {
        let manifest = r#"
[[module]]
name = "pkg.core"

[[module]]
name = "pkg.core"
"#;

        let result = ApiRegistry::parse(manifest);

        assert!(matches!(result, Err(RegistryError::DuplicateModule(name)) if name == "pkg.core"));
    }

    #[test]
    fn rejects_member_collisions_within_a_module() {
        let manifest = r#"
[[module]]
name = "pkg.core"
classes = ["Image"]
functions = ["Image"]
"#;

        let result = ApiRegistry::parse(manifest);

        assert!(matches!(
            result,
            Err(RegistryError::DuplicateMember { member, .. }) if member == "Image"
        ));
    }

    #[test]
    fn rejects_dangling_aliases() {
        let manifest = r#"
[[module]]
name = "pkg.core"

[aliases]
"pkg.native.core" = "pkg.gone"
"#;

        let result = ApiRegistry::parse(manifest);

        assert!(matches!(result, Err(RegistryError::DanglingAlias { .. })));
    }

    #[test]
    fn rejects_aliases_that_shadow_modules() {
        let manifest = r#"
[[module]]
name = "pkg.core"

[[module]]
name = "pkg.io"

[aliases]
"pkg.io" = "pkg.core"
"#;

        let result = ApiRegistry::parse(manifest);

        assert!(matches!(result, Err(RegistryError::AliasShadowsModule(name)) if name == "pkg.io"));
    }

    #[test]
    fn malformed_manifest_is_a_parse_error() {
        let result = ApiRegistry::parse("[[module]\nname = broken");

        assert!(matches!(result, Err(RegistryError::ManifestParse(_))));
    }
}
