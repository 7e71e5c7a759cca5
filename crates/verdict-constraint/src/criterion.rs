//! Executable criteria

use crate::handlers::{Converter, Predicate, Stringifier};
use crate::report::Violation;
use crate::template::Template;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use verdict_core::{Result, Value, VerdictError};

/// Resolved attributes of one criterion
#[derive(Debug, Clone, PartialEq)]
pub struct Attributes {
    /// Definition of the declaration the criterion was built from
    pub root_owner: String,
    /// Normalized navigation expression
    pub depth: String,
    /// Flattened validation groups
    pub groups: Vec<String>,
    pub order: i64,
    /// Remaining attributes, excluding message, groups, depth and order
    pub data: BTreeMap<String, Value>,
}

impl Attributes {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&Value> {
        self.data.get(name).ok_or_else(|| VerdictError::MissingValue {
            definition: self.root_owner.clone(),
            attribute: name.to_string(),
        })
    }

    pub fn require_i64(&self, name: &str) -> Result<i64> {
        let value = self.require(name)?;
        value.as_i64().ok_or_else(|| VerdictError::InvalidFieldType {
            expected: "integer".to_string(),
            got: value.type_name().to_string(),
        })
    }

    pub fn require_str(&self, name: &str) -> Result<&str> {
        let value = self.require(name)?;
        value.as_str().ok_or_else(|| VerdictError::InvalidFieldType {
            expected: "string".to_string(),
            got: value.type_name().to_string(),
        })
    }
}

/// Value handling obtained from a definition's handlers
pub struct CriterionHandlers {
    pub converter: Option<Converter>,
    pub predicate: Predicate,
    pub stringifier: Option<Stringifier>,
    pub accepts_null: bool,
}

/// One executable check bound to a declaration site
pub struct Criterion {
    kind: String,
    position: String,
    attrs: Attributes,
    /// `None` for marker definitions
    handlers: Option<CriterionHandlers>,
    template: Arc<Template>,
}

impl Criterion {
    pub(crate) fn new(
        kind: String,
        position: String,
        attrs: Attributes,
        handlers: Option<CriterionHandlers>,
        template: Arc<Template>,
    ) -> Self {
        Self {
            kind,
            position,
            attrs,
            handlers,
            template,
        }
    }

    /// Definition performing the check
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn position(&self) -> &str {
        &self.position
    }

    pub fn root_owner(&self) -> &str {
        &self.attrs.root_owner
    }

    pub fn groups(&self) -> &[String] {
        &self.attrs.groups
    }

    pub fn order(&self) -> i64 {
        self.attrs.order
    }

    pub fn depth(&self) -> &str {
        &self.attrs.depth
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attrs
    }

    pub fn is_marker(&self) -> bool {
        self.handlers.is_none()
    }

    pub(crate) fn template(&self) -> &Arc<Template> {
        &self.template
    }

    /// Check whether the criterion belongs to any of `groups`
    pub fn in_groups(&self, groups: &[String]) -> bool {
        self.attrs.groups.iter().any(|g| groups.contains(g))
    }

    /// Test a value. `Ok(None)` means it passed.
    ///
    /// Markers always pass, as does null for handlers that do not test it.
    pub fn test(&self, value: &Value) -> Result<Option<Violation>> {
        let Some(handlers) = &self.handlers else {
            return Ok(None);
        };
        if value.is_null() && !handlers.accepts_null {
            return Ok(None);
        }

        let converted;
        let value = match &handlers.converter {
            Some(convert) => {
                converted = convert(value).map_err(|e| e.within(self.failure_context()))?;
                &converted
            }
            None => value,
        };

        if (handlers.predicate)(value).map_err(|e| e.within(self.failure_context()))? {
            return Ok(None);
        }

        let text = match &handlers.stringifier {
            Some(stringify) => stringify(value).map_err(|e| e.within(self.failure_context()))?,
            None => value.stringify(),
        };
        Ok(Some(self.template.render(&text)))
    }

    fn failure_context(&self) -> String {
        format!("criterion `{}` at {}", self.kind, self.position)
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (root {}) at {}", self.kind, self.attrs.root_owner, self.position)?;
        if self.is_marker() {
            write!(f, " [marker]")?;
        }
        writeln!(f)?;
        writeln!(f, "  depth: {:?}", self.attrs.depth)?;
        writeln!(f, "  groups: {}", self.attrs.groups.join(", "))?;
        writeln!(f, "  order: {}", self.attrs.order)?;
        for (name, value) in &self.attrs.data {
            writeln!(f, "  {} = {}", name, value.stringify())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Criterion")
            .field("kind", &self.kind)
            .field("position", &self.position)
            .field("attrs", &self.attrs)
            .field("marker", &self.is_marker())
            .finish()
    }
}
