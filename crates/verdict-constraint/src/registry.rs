//! Definition registry for loading and managing constraint definitions

use crate::types::{ConstraintDef, ConstraintFile};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use verdict_core::{MessageBundle, Result, VerdictError};
use verdict_schema::toml_files;

/// Built-in definitions: `not_null`, `min`, `max` and the `range` marker
pub const BUILTIN_DEFINITIONS: &str = include_str!("builtin.toml");

/// Default messages for the built-in definitions
pub const BUILTIN_MESSAGES: &str = include_str!("messages.toml");

/// Registry that holds all loaded constraint definitions
#[derive(Debug, Default, Clone)]
pub struct DefinitionRegistry {
    definitions: HashMap<String, ConstraintDef>,
}

impl DefinitionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in definitions
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::new();
        registry
            .load_string(BUILTIN_DEFINITIONS)
            .map_err(|e| e.within("in built-in definitions"))?;
        Ok(registry)
    }

    /// Load definitions from a directory of TOML files
    ///
    /// Expects `path/constraints/*.toml` files
    pub fn load_from_directory<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut registry = Self::new();
        registry.load_directory(path)?;
        Ok(registry)
    }

    /// Load definitions from a directory into this registry (additive/override)
    pub fn load_directory<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        for file_path in toml_files(&path.as_ref().join("constraints"))? {
            self.load_file(&file_path)?;
        }
        Ok(())
    }

    /// Load definitions from a TOML file
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        self.load_string(&content)
            .map_err(|e| e.within(format!("in {}", path.display())))
    }

    /// Load definitions from a TOML string
    pub fn load_string(&mut self, content: &str) -> Result<()> {
        let file: ConstraintFile = toml::from_str(content).map_err(|e| {
            VerdictError::TomlParseError(format!("Failed to parse definition TOML: {}", e))
        })?;

        for (name, def) in file.definition {
            let def = def.to_constraint_def(name)?;
            self.register(def);
        }

        Ok(())
    }

    /// Register a definition directly
    pub fn register(&mut self, definition: ConstraintDef) {
        tracing::debug!("registered definition `{}`", definition.name);
        self.definitions.insert(definition.name.clone(), definition);
    }

    /// Get a definition by name
    pub fn get(&self, name: &str) -> Option<&ConstraintDef> {
        self.definitions.get(name)
    }

    /// Check whether a name identifies a constraint definition
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// List all definition names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.definitions.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Get the number of loaded definitions
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Message bundle with the built-in default messages
pub fn builtin_messages() -> Result<MessageBundle> {
    let mut bundle = MessageBundle::new();
    bundle.load_string(BUILTIN_MESSAGES)?;
    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_core::{MessageCatalog, ValueShape};

    #[test]
    fn test_builtin_definitions() {
        let registry = DefinitionRegistry::builtin().unwrap();
        assert_eq!(registry.names(), vec!["max", "min", "not_null", "range"]);

        let max = registry.get("max").unwrap();
        assert!(!max.is_marker());
        assert_eq!(max.attributes["value"].shape, ValueShape::I64);
        assert!(registry.get("range").unwrap().is_marker());
        assert_eq!(registry.get("range").unwrap().specifications.len(), 2);
    }

    #[test]
    fn test_load_string_overrides() {
        let mut registry = DefinitionRegistry::builtin().unwrap();
        registry
            .load_string(
                r#"
[definition.max]
handler = "max"
[definition.max.attributes]
message = "string"
groups = "list<type>"
depth = "string"
"#,
            )
            .unwrap();
        assert_eq!(registry.len(), 4);
        assert!(!registry.get("max").unwrap().attributes.contains_key("value"));
    }

    #[test]
    fn test_bad_toml() {
        let mut registry = DefinitionRegistry::new();
        let err = registry.load_string("[definition.x").unwrap_err();
        assert!(matches!(err, VerdictError::TomlParseError(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_file_without_definitions() {
        let mut registry = DefinitionRegistry::builtin().unwrap();
        registry.load_string("").unwrap();
        registry.load_string("# definitions go here\n").unwrap();
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_builtin_messages() {
        let bundle = builtin_messages().unwrap();
        assert_eq!(
            bundle.message("verdict.not_null").as_deref(),
            Some("{$p} must not be null")
        );
    }
}
