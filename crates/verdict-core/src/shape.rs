//! Static value shapes

use crate::error::{Result, VerdictError};
use crate::value::Value;
use std::fmt;

/// The declared shape of a value: a scalar, or a container carrying the
/// shape of its elements, keys/values or components.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueShape {
    Bool,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Char,
    String,
    /// A type reference, such as a validation group
    Type,
    /// Any value, left unchecked
    Any,
    Optional(Box<ValueShape>),
    List { element: Box<ValueShape> },
    Map { key: Box<ValueShape>, value: Box<ValueShape> },
    Array { component: Box<ValueShape> },
}

impl ValueShape {
    pub fn list(element: ValueShape) -> Self {
        ValueShape::List {
            element: Box::new(element),
        }
    }

    pub fn map(key: ValueShape, value: ValueShape) -> Self {
        ValueShape::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn array(component: ValueShape) -> Self {
        ValueShape::Array {
            component: Box::new(component),
        }
    }

    pub fn optional(inner: ValueShape) -> Self {
        ValueShape::Optional(Box::new(inner))
    }

    /// Look up a scalar shape by its descriptor name.
    pub fn from_scalar_name(name: &str) -> Option<Self> {
        let shape = match name.to_lowercase().as_str() {
            "bool" | "boolean" => ValueShape::Bool,
            "i8" => ValueShape::I8,
            "i16" => ValueShape::I16,
            "i32" => ValueShape::I32,
            "i64" | "int" | "integer" => ValueShape::I64,
            "f32" => ValueShape::F32,
            "f64" | "float" => ValueShape::F64,
            "char" => ValueShape::Char,
            "string" | "str" => ValueShape::String,
            "type" => ValueShape::Type,
            "any" => ValueShape::Any,
            _ => return None,
        };
        Some(shape)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ValueShape::Bool => "bool",
            ValueShape::I8 => "i8",
            ValueShape::I16 => "i16",
            ValueShape::I32 => "i32",
            ValueShape::I64 => "i64",
            ValueShape::F32 => "f32",
            ValueShape::F64 => "f64",
            ValueShape::Char => "char",
            ValueShape::String => "string",
            ValueShape::Type => "type",
            ValueShape::Any => "any",
            ValueShape::Optional(_) => "option",
            ValueShape::List { .. } => "list",
            ValueShape::Map { .. } => "map",
            ValueShape::Array { .. } => "array",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ValueShape::I8 | ValueShape::I16 | ValueShape::I32 | ValueShape::I64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ValueShape::F32 | ValueShape::F64)
    }

    /// Whether a null value is a legal instance of this shape
    pub fn is_nullable(&self) -> bool {
        matches!(self, ValueShape::Optional(_) | ValueShape::Any)
    }

    /// Coerce a value to this shape, failing when it cannot be represented.
    pub fn coerce(&self, value: Value) -> Result<Value> {
        match (self, value) {
            (ValueShape::Any, value) => Ok(value),
            (ValueShape::Optional(_), Value::Null) => Ok(Value::Null),
            (ValueShape::Optional(inner), value) => inner.coerce(value),

            (ValueShape::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),

            (shape, Value::Int(n)) if shape.is_integer() => {
                let (min, max) = shape.integer_bounds();
                if n < min || n > max {
                    return Err(VerdictError::Conversion(format!(
                        "{} is out of range for {}",
                        n,
                        shape.type_name()
                    )));
                }
                Ok(Value::Int(n))
            }
            (shape, Value::Int(n)) if shape.is_float() => Ok(Value::Float(n as f64)),
            (shape, Value::Float(n)) if shape.is_float() => Ok(Value::Float(n)),

            (ValueShape::Char, Value::Char(c)) => Ok(Value::Char(c)),
            (ValueShape::Char, Value::Str(s)) if s.chars().count() == 1 => {
                Ok(Value::Char(s.chars().next().unwrap_or_default()))
            }

            (ValueShape::String, Value::Str(s)) => Ok(Value::Str(s)),
            (ValueShape::Type, Value::Type(s)) | (ValueShape::Type, Value::Str(s)) => {
                Ok(Value::Type(s))
            }

            (ValueShape::List { element }, Value::List(items)) => Ok(Value::List(
                items
                    .into_iter()
                    .map(|item| element.coerce(item))
                    .collect::<Result<_>>()?,
            )),
            (ValueShape::Array { component }, Value::List(items)) => Ok(Value::List(
                items
                    .into_iter()
                    .map(|item| component.coerce(item))
                    .collect::<Result<_>>()?,
            )),
            (ValueShape::Map { key, value }, Value::Map(entries)) => Ok(Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| Ok((key.coerce(k)?, value.coerce(v)?)))
                    .collect::<Result<_>>()?,
            )),

            (shape, other) => Err(VerdictError::InvalidFieldType {
                expected: shape.to_string(),
                got: other.type_name().to_string(),
            }),
        }
    }

    fn integer_bounds(&self) -> (i64, i64) {
        match self {
            ValueShape::I8 => (i8::MIN as i64, i8::MAX as i64),
            ValueShape::I16 => (i16::MIN as i64, i16::MAX as i64),
            ValueShape::I32 => (i32::MIN as i64, i32::MAX as i64),
            _ => (i64::MIN, i64::MAX),
        }
    }
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueShape::Optional(inner) => write!(f, "option<{}>", inner),
            ValueShape::List { element } => write!(f, "list<{}>", element),
            ValueShape::Map { key, value } => write!(f, "map<{}, {}>", key, value),
            ValueShape::Array { component } => write!(f, "[{}]", component),
            scalar => write!(f, "{}", scalar.type_name()),
        }
    }
}
