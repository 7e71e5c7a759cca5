//! Declaration records attached to data-model members

use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;

/// One raw declaration at a declaration site.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// A constraint declaration: the definition it instantiates and its
    /// concrete attribute values
    Constraint {
        kind: String,
        attrs: BTreeMap<String, Value>,
    },
    /// A repeatable container wrapping several declarations
    Repeated {
        container: String,
        items: Vec<Declaration>,
    },
}

impl Declaration {
    pub fn new(kind: impl Into<String>) -> Self {
        Declaration::Constraint {
            kind: kind.into(),
            attrs: BTreeMap::new(),
        }
    }

    /// Set an attribute value. No effect on repeatable containers.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Declaration::Constraint { attrs, .. } = &mut self {
            attrs.insert(name.into(), value.into());
        }
        self
    }

    pub fn repeated(container: impl Into<String>, items: Vec<Declaration>) -> Self {
        Declaration::Repeated {
            container: container.into(),
            items,
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Declaration::Constraint { kind, .. } => kind,
            Declaration::Repeated { container, .. } => container,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        match self {
            Declaration::Constraint { attrs, .. } => attrs.get(name),
            Declaration::Repeated { .. } => None,
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Declaration::Constraint { kind, attrs } => {
                write!(f, "{}(", kind)?;
                for (i, (name, value)) in attrs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {}", name, value.stringify())?;
                }
                write!(f, ")")
            }
            Declaration::Repeated { container, items } => {
                write!(f, "{}[", container)?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_display() {
        let decl = Declaration::new("max")
            .with("value", 10i64)
            .with("message", "too big");
        assert_eq!(decl.kind(), "max");
        assert_eq!(decl.attr("value"), Some(&Value::Int(10)));
        assert_eq!(decl.to_string(), "max(message = \"too big\", value = 10)");
    }

    #[test]
    fn test_repeated_display() {
        let decl = Declaration::repeated(
            "max_list",
            vec![Declaration::new("max").with("value", 1i64)],
        );
        assert_eq!(decl.to_string(), "max_list[max(value = 1)]");
        assert!(decl.attr("value").is_none());
    }
}
