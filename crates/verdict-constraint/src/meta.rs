//! Resolved definition metadata

use std::collections::BTreeMap;
use std::fmt;
use verdict_core::{Result, Value, ValueShape, VerdictError};

/// Where a meta-attribute's value comes from
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// Fixed when the definition was resolved
    Const(Value),
    /// Read from the declaration's attribute `name`, falling back to `default`
    Deferred {
        name: String,
        shape: Option<ValueShape>,
        default: Option<Value>,
    },
}

/// One attribute slot and the definition that owns it
#[derive(Debug, Clone, PartialEq)]
pub struct MetaAttr {
    pub owner: String,
    pub slot: Slot,
}

impl MetaAttr {
    pub fn constant(owner: impl Into<String>, value: Value) -> Self {
        Self {
            owner: owner.into(),
            slot: Slot::Const(value),
        }
    }

    pub fn deferred(
        owner: impl Into<String>,
        name: impl Into<String>,
        shape: Option<ValueShape>,
        default: Option<Value>,
    ) -> Self {
        Self {
            owner: owner.into(),
            slot: Slot::Deferred {
                name: name.into(),
                shape,
                default,
            },
        }
    }

    pub fn is_const(&self) -> bool {
        matches!(self.slot, Slot::Const(_))
    }

    /// Name of the declaration attribute a deferred slot reads
    pub fn slot_name(&self) -> Option<&str> {
        match &self.slot {
            Slot::Deferred { name, .. } => Some(name),
            Slot::Const(_) => None,
        }
    }

    pub fn shape(&self) -> Option<&ValueShape> {
        match &self.slot {
            Slot::Deferred { shape, .. } => shape.as_ref(),
            Slot::Const(_) => None,
        }
    }

    /// Default of a deferred slot, or the value of a constant
    pub fn default_value(&self) -> Option<&Value> {
        match &self.slot {
            Slot::Const(value) => Some(value),
            Slot::Deferred { default, .. } => default.as_ref(),
        }
    }

    /// Value of this attribute for a concrete declaration
    pub fn value_for(&self, declared: &BTreeMap<String, Value>) -> Result<Value> {
        match &self.slot {
            Slot::Const(value) => Ok(value.clone()),
            Slot::Deferred {
                name,
                shape,
                default,
            } => match (declared.get(name), default) {
                (Some(value), _) => match shape {
                    Some(shape) => shape.coerce(value.clone()).map_err(|e| {
                        e.within(format!("attribute `{}` of `{}`", name, self.owner))
                    }),
                    None => Ok(value.clone()),
                },
                (None, Some(default)) => Ok(default.clone()),
                (None, None) => Err(VerdictError::MissingValue {
                    definition: self.owner.clone(),
                    attribute: name.clone(),
                }),
            },
        }
    }
}

impl fmt::Display for MetaAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.slot {
            Slot::Const(value) => write!(f, "{} (const, {})", value.stringify(), self.owner),
            Slot::Deferred { name, default, .. } => {
                write!(f, "<{}.{}>", self.owner, name)?;
                if let Some(default) = default {
                    write!(f, " default {}", default.stringify())?;
                }
                Ok(())
            }
        }
    }
}

/// The attribute set of one path node
#[derive(Debug, Clone, PartialEq)]
pub struct MetaAttrs {
    pub owner: String,
    pub attrs: BTreeMap<String, MetaAttr>,
}

impl MetaAttrs {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            attrs: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&MetaAttr> {
        self.attrs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, attr: MetaAttr) {
        self.attrs.insert(name.into(), attr);
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

impl fmt::Display for MetaAttrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {}:", self.owner)?;
        for (name, attr) in &self.attrs {
            writeln!(f, "    {} = {}", name, attr)?;
        }
        Ok(())
    }
}

/// A fully resolved constraint definition
#[derive(Debug, Clone, PartialEq)]
pub struct MetaData {
    pub name: String,
    pub handler: Option<String>,
    /// The definition's own attributes, including self overrides
    pub attrs: MetaAttrs,
    /// Execution path; every node is self-sufficient
    pub path: Vec<MetaAttrs>,
}

impl MetaData {
    pub fn is_marker(&self) -> bool {
        crate::types::is_marker_handler(self.handler.as_deref())
    }

    /// Owners of the path nodes, in order
    pub fn path_owners(&self) -> Vec<&str> {
        self.path.iter().map(|node| node.owner.as_str()).collect()
    }
}

impl fmt::Display for MetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "root: {}", self.name)?;
        writeln!(f, "path: {}", self.path_owners().join(" -> "))?;
        writeln!(f, "self:")?;
        write!(f, "{}", self.attrs)?;
        writeln!(f, "details:")?;
        for node in &self.path {
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}
