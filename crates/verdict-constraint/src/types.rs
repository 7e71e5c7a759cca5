//! Constraint definition types

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use verdict_core::{Result, Value, ValueShape, VerdictError};
use verdict_schema::parse_shape;

/// Handler name of definitions that perform no check of their own
pub const MARKER: &str = "marker";

/// Attribute holding the message template
pub const MESSAGE: &str = "message";
/// Attribute holding the validation groups
pub const GROUPS: &str = "groups";
/// Attribute holding the navigation expression
pub const DEPTH: &str = "depth";
/// Attribute holding the ordering key
pub const ORDER: &str = "order";

/// Attributes every definition must declare
pub const REQUIRED_ATTRIBUTES: [&str; 3] = [MESSAGE, GROUPS, DEPTH];

/// Shape assumed for well-known attributes that carry no declared shape
pub fn implicit_shape(attribute: &str) -> Option<ValueShape> {
    match attribute {
        MESSAGE | DEPTH => Some(ValueShape::String),
        GROUPS => Some(ValueShape::list(ValueShape::Type)),
        ORDER => Some(ValueShape::I32),
        _ => None,
    }
}

/// A declared attribute slot
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDef {
    pub shape: ValueShape,
    pub default: Option<Value>,
}

/// A reference to another definition this one composes
#[derive(Debug, Clone, PartialEq)]
pub struct Specification {
    pub target: String,
    /// Ordering key; non-positive keys run before the composing definition
    pub order: i32,
    /// Attribute bindings, `name`, `name = expr` or `name > other`
    pub attrs: Vec<String>,
}

/// A complete constraint definition
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintDef {
    pub name: String,
    pub description: Option<String>,
    /// Value handlers performing the check; `None` for markers
    pub handler: Option<String>,
    pub attributes: BTreeMap<String, AttributeDef>,
    pub specifications: Vec<Specification>,
}

impl ConstraintDef {
    pub fn is_marker(&self) -> bool {
        is_marker_handler(self.handler.as_deref())
    }
}

pub(crate) fn is_marker_handler(handler: Option<&str>) -> bool {
    handler.map(|h| h == MARKER).unwrap_or(true)
}

/// TOML file format for constraint definitions
#[derive(Debug, Deserialize)]
pub struct ConstraintFile {
    #[serde(default)]
    pub definition: HashMap<String, ConstraintDefinition>,
}

#[derive(Debug, Deserialize)]
pub struct ConstraintDefinition {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub handler: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeDefinition>,
    #[serde(default)]
    pub specify: Vec<SpecificationDefinition>,
}

/// Attribute definition as it appears in TOML files
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AttributeDefinition {
    Simple(String),
    Detailed(DetailedAttributeDefinition),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetailedAttributeDefinition {
    #[serde(rename = "type")]
    pub shape: String,
    #[serde(default)]
    pub default: Option<toml::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpecificationDefinition {
    pub target: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub attrs: Vec<String>,
}

impl ConstraintDefinition {
    pub fn to_constraint_def(self, name: String) -> Result<ConstraintDef> {
        let mut attributes = BTreeMap::new();
        for (attr_name, def) in self.attributes {
            let attr = def.to_attribute_def().map_err(|e| {
                e.within(format!("in attribute `{}` of `{}`", attr_name, name))
            })?;
            attributes.insert(attr_name, attr);
        }

        let specifications = self
            .specify
            .into_iter()
            .map(|s| Specification {
                target: s.target,
                order: s.order,
                attrs: s.attrs,
            })
            .collect();

        Ok(ConstraintDef {
            name,
            description: self.description,
            handler: self.handler,
            attributes,
            specifications,
        })
    }
}

impl AttributeDefinition {
    pub fn to_attribute_def(self) -> Result<AttributeDef> {
        match self {
            AttributeDefinition::Simple(shape) => Ok(AttributeDef {
                shape: parse_shape(&shape)?,
                default: None,
            }),
            AttributeDefinition::Detailed(d) => {
                let shape = parse_shape(&d.shape)?;
                let default = match d.default {
                    Some(value) => Some(shape.coerce(Value::from(value)).map_err(|e| {
                        VerdictError::Conversion(format!("bad default: {}", e))
                    })?),
                    None => None,
                };
                Ok(AttributeDef { shape, default })
            }
        }
    }
}
