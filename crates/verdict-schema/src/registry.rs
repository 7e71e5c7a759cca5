//! Schema registry for loading and managing models and groups

use crate::groups::{GroupRegistry, GroupSchema};
use crate::model::{ModelSchema, ModelSchemaFile};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use verdict_core::{Result, VerdictError};

/// Registry that holds all loaded model schemas and validation groups
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    models: HashMap<String, ModelSchema>,
    groups: GroupRegistry,
}

impl SchemaRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Load schemas from a directory structure
    ///
    /// Expects:
    /// - `path/models/*.toml` for model schemas
    /// - `path/groups/*.toml` for validation groups
    pub fn load_from_directory<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut registry = Self::new();
        registry.load_directory(path)?;
        Ok(registry)
    }

    /// Load schemas from a single directory into this registry (additive/override)
    pub fn load_directory<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();

        for file_path in toml_files(&path.join("models"))? {
            self.load_model_file(&file_path)?;
        }
        for file_path in toml_files(&path.join("groups"))? {
            self.load_group_file(&file_path)?;
        }

        tracing::debug!(
            models = self.models.len(),
            groups = self.groups.len(),
            "loaded schemas from {}",
            path.display()
        );
        Ok(())
    }

    /// Load model schemas from a TOML file
    pub fn load_model_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        self.load_model_string(&content)
            .map_err(|e| e.within(format!("in {}", path.display())))
    }

    /// Load validation groups from a TOML file
    pub fn load_group_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        self.groups
            .load_string(&content)
            .map_err(|e| e.within(format!("in {}", path.display())))
    }

    /// Load model schemas from a TOML string
    pub fn load_model_string(&mut self, content: &str) -> Result<()> {
        let file: ModelSchemaFile = toml::from_str(content)?;

        for (name, def) in file.model {
            let schema = def.to_model_schema(name.clone())?;
            self.models.insert(name, schema);
        }

        Ok(())
    }

    /// Load validation groups from a TOML string
    pub fn load_group_string(&mut self, content: &str) -> Result<()> {
        self.groups.load_string(content)
    }

    /// Register a model schema directly
    pub fn register_model(&mut self, schema: ModelSchema) {
        self.models.insert(schema.name.clone(), schema);
    }

    /// Register a validation group directly
    pub fn register_group(&mut self, group: GroupSchema) {
        self.groups.register(group);
    }

    /// Get a model schema by name
    pub fn get_model(&self, name: &str) -> Option<&ModelSchema> {
        self.models.get(name)
    }

    /// Get a model schema by name, failing if it is unknown
    pub fn require_model(&self, name: &str) -> Result<&ModelSchema> {
        self.models
            .get(name)
            .ok_or_else(|| VerdictError::SchemaNotFound(name.to_string()))
    }

    /// List all model names, sorted
    pub fn model_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn groups(&self) -> &GroupRegistry {
        &self.groups
    }
}

/// `*.toml` files of a directory, sorted by path; none if it does not exist
pub fn toml_files(dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_path = entry.path();
        if file_path.extension().map(|e| e == "toml").unwrap_or(false) {
            files.push(file_path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_core::{Declaration, Value, ValueShape};

    #[test]
    fn test_load_model_string() {
        let toml = r#"
[model.Order]
description = "A purchase order"

[model.Order.fields]
id = "i64"

[model.Order.fields.amount]
shape = "i64"

[[model.Order.fields.amount.constraint]]
type = "max"
value = 10

[[model.Order.fields.amount.constraint]]
type = "min"
value = 1
"#;

        let mut registry = SchemaRegistry::new();
        registry.load_model_string(toml).unwrap();

        let order = registry.get_model("Order").unwrap();
        assert_eq!(order.name, "Order");
        assert_eq!(order.field_names(), vec!["amount", "id"]);
        assert_eq!(order.position("amount"), "Order.amount");

        let amount = order.get_field("amount").unwrap();
        assert_eq!(amount.shape, ValueShape::I64);
        assert_eq!(
            amount.constraints,
            vec![
                Declaration::new("max").with("value", Value::Int(10)),
                Declaration::new("min").with("value", Value::Int(1)),
            ]
        );
        assert!(order.get_field("id").unwrap().constraints.is_empty());
    }

    #[test]
    fn test_bad_shape_names_the_field() {
        let toml = r#"
[model.Order.fields]
amount = "money"
"#;
        let mut registry = SchemaRegistry::new();
        let err = registry.load_model_string(toml).unwrap_err();
        assert_eq!(err.to_string(), "in field `Order.amount`");
        assert!(matches!(err.root_cause(), VerdictError::ParseError(_)));
    }

    #[test]
    fn test_groups_and_unknown_model() {
        let mut registry = SchemaRegistry::new();
        registry
            .load_group_string("[group.Update]\nincludes = [\"A\"]\n")
            .unwrap();
        assert!(registry.groups().get("Update").is_some());
        assert!(matches!(
            registry.require_model("Missing"),
            Err(VerdictError::SchemaNotFound(_))
        ));
    }
}
