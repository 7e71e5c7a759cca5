//! Value-handling capabilities of leaf definitions

use crate::criterion::Attributes;
use std::collections::HashMap;
use std::sync::Arc;
use verdict_core::{Result, Value, ValueShape, VerdictError};

/// Converts a value before it is tested
pub type Converter = Box<dyn Fn(&Value) -> Result<Value> + Send + Sync>;
/// Decides whether a (converted) value passes
pub type Predicate = Box<dyn Fn(&Value) -> Result<bool> + Send + Sync>;
/// Renders a failing value for the message
pub type Stringifier = Box<dyn Fn(&Value) -> Result<String> + Send + Sync>;

/// The check performed by a leaf definition
pub trait ValueHandlers: Send + Sync {
    /// Converter for values of `shape`; `None` tests values unchanged.
    ///
    /// Fails with `UnsupportedConversion` when the check makes no sense for
    /// the shape.
    fn converter(&self, shape: &ValueShape) -> Result<Option<Converter>>;

    fn predicate(&self, attrs: &Attributes) -> Result<Predicate>;

    fn stringifier(&self, _attrs: &Attributes) -> Result<Option<Stringifier>> {
        Ok(None)
    }

    /// Whether null values are tested; otherwise they pass
    fn accepts_null(&self) -> bool {
        false
    }
}

/// Value handlers by name
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn ValueHandlers>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the handlers of the built-in definitions
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("not_null", NotNullHandlers);
        registry.register("min", BoundHandlers::Min);
        registry.register("max", BoundHandlers::Max);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, handlers: impl ValueHandlers + 'static) {
        self.handlers.insert(name.into(), Arc::new(handlers));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ValueHandlers>> {
        self.handlers.get(name).cloned()
    }

    pub fn require(&self, name: &str) -> Result<Arc<dyn ValueHandlers>> {
        self.get(name)
            .ok_or_else(|| VerdictError::UnknownHandler(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}

/// Fails for null values
#[derive(Debug, Clone, Copy)]
pub struct NotNullHandlers;

impl ValueHandlers for NotNullHandlers {
    fn converter(&self, shape: &ValueShape) -> Result<Option<Converter>> {
        if shape.is_nullable() {
            Ok(None)
        } else {
            Err(VerdictError::UnsupportedConversion {
                shape: shape.to_string(),
                expected: "nullable value".to_string(),
            })
        }
    }

    fn predicate(&self, _attrs: &Attributes) -> Result<Predicate> {
        Ok(Box::new(|value: &Value| Ok(!value.is_null())))
    }

    fn accepts_null(&self) -> bool {
        true
    }
}

/// Integer lower and upper bounds, read from the `value` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundHandlers {
    Min,
    Max,
}

impl ValueHandlers for BoundHandlers {
    fn converter(&self, shape: &ValueShape) -> Result<Option<Converter>> {
        integer_converter(shape)
    }

    fn predicate(&self, attrs: &Attributes) -> Result<Predicate> {
        let limit = attrs.require_i64("value")?;
        let bound = *self;
        Ok(Box::new(move |value: &Value| -> Result<bool> {
            let n = value.as_i64().ok_or_else(|| {
                VerdictError::Conversion(format!("expected an integer, got {}", value.type_name()))
            })?;
            Ok(match bound {
                BoundHandlers::Min => n >= limit,
                BoundHandlers::Max => n <= limit,
            })
        }))
    }
}

/// Integers pass unchanged, floats are truncated, anything else is rejected
fn integer_converter(shape: &ValueShape) -> Result<Option<Converter>> {
    match shape {
        ValueShape::Optional(inner) => integer_converter(inner),
        shape if shape.is_integer() => Ok(None),
        shape if shape.is_float() || *shape == ValueShape::Any => {
            Ok(Some(Box::new(|value: &Value| match value {
                Value::Int(n) => Ok(Value::Int(*n)),
                Value::Float(f) => Ok(Value::Int(f.trunc() as i64)),
                other => Err(VerdictError::Conversion(format!(
                    "expected a number, got {}",
                    other.type_name()
                ))),
            })))
        }
        other => Err(VerdictError::UnsupportedConversion {
            shape: other.to_string(),
            expected: "integer".to_string(),
        }),
    }
}
