//! Model schema definitions

use crate::parse::parse_shape;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use verdict_core::{Declaration, Result, Value, ValueShape, VerdictError};

/// Schema for a single field within a model
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub shape: ValueShape,
    pub description: Option<String>,
    /// Constraint declarations attached to the field, in declaration order
    pub constraints: Vec<Declaration>,
}

/// Schema definition for a data model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSchema {
    pub name: String,
    pub description: Option<String>,
    pub fields: BTreeMap<String, FieldSchema>,
}

impl ModelSchema {
    /// Get a field schema by name
    pub fn get_field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }

    /// List all field names
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(|s| s.as_str()).collect()
    }

    /// Position label of a field, `Model.field`
    pub fn position(&self, field: &str) -> String {
        format!("{}.{}", self.name, field)
    }
}

/// TOML file format for model schemas
#[derive(Debug, Deserialize)]
pub struct ModelSchemaFile {
    pub model: HashMap<String, ModelSchemaDefinition>,
}

#[derive(Debug, Deserialize)]
pub struct ModelSchemaDefinition {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: HashMap<String, FieldSchemaDefinition>,
}

/// Field definition as it appears in TOML files
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FieldSchemaDefinition {
    Simple(String),
    Detailed(DetailedFieldSchema),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetailedFieldSchema {
    pub shape: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "constraint")]
    pub constraints: Vec<toml::Table>,
}

impl ModelSchemaDefinition {
    pub fn to_model_schema(self, name: String) -> Result<ModelSchema> {
        let mut fields = BTreeMap::new();
        for (field_name, def) in self.fields {
            let field = def
                .to_field_schema()
                .map_err(|e| e.within(format!("in field `{}.{}`", name, field_name)))?;
            fields.insert(field_name, field);
        }
        Ok(ModelSchema {
            name,
            description: self.description,
            fields,
        })
    }
}

impl FieldSchemaDefinition {
    pub fn to_field_schema(self) -> Result<FieldSchema> {
        match self {
            FieldSchemaDefinition::Simple(shape) => Ok(FieldSchema {
                shape: parse_shape(&shape)?,
                description: None,
                constraints: Vec::new(),
            }),
            FieldSchemaDefinition::Detailed(d) => Ok(FieldSchema {
                shape: parse_shape(&d.shape)?,
                description: d.description,
                constraints: d
                    .constraints
                    .into_iter()
                    .map(parse_declaration)
                    .collect::<Result<_>>()?,
            }),
        }
    }
}

/// Build a declaration from its TOML table.
///
/// `type` names the definition; an `items` array of tables makes the
/// declaration a repeatable container of those items.
pub fn parse_declaration(mut table: toml::Table) -> Result<Declaration> {
    let kind = match table.remove("type") {
        Some(toml::Value::String(kind)) => kind,
        _ => {
            return Err(VerdictError::ParseError(
                "constraint declaration needs a string `type`".to_string(),
            ))
        }
    };

    if let Some(items) = table.remove("items") {
        let toml::Value::Array(items) = items else {
            return Err(VerdictError::ParseError(format!(
                "`items` of `{}` must be an array of tables",
                kind
            )));
        };
        let items = items
            .into_iter()
            .map(|item| match item {
                toml::Value::Table(t) => parse_declaration(t),
                _ => Err(VerdictError::ParseError(format!(
                    "`items` of `{}` must be an array of tables",
                    kind
                ))),
            })
            .collect::<Result<_>>()?;
        return Ok(Declaration::repeated(kind, items));
    }

    let attrs = table
        .into_iter()
        .map(|(name, value)| (name, Value::from(value)))
        .collect();
    Ok(Declaration::Constraint { kind, attrs })
}
