//! Navigation of nested value shapes
//!
//! A navigation expression is a sequence of operators applied left to
//! right, each descending one level into the current shape:
//!
//! - `e` - element of a list
//! - `k` - key of a map
//! - `v` - value of a map
//! - `c` - component of an array

use verdict_core::{Result, ValueShape, VerdictError};

/// Lower-case a navigation expression and check its operators.
pub fn normalize_depth(expr: &str) -> Result<String> {
    let normalized = expr.to_lowercase();
    if normalized.chars().all(|c| matches!(c, 'e' | 'k' | 'v' | 'c')) {
        Ok(normalized)
    } else {
        Err(VerdictError::InvalidExpression(expr.to_string()))
    }
}

/// Compute the shape reached by applying `expr` to `shape`.
///
/// Optional shapes are transparent: an operator applies to the shape they
/// wrap.
pub fn navigate(shape: &ValueShape, expr: &str) -> Result<ValueShape> {
    let normalized = normalize_depth(expr)?;

    let mut current = shape;
    for op in normalized.chars() {
        current = peel_optional(current);
        current = match (op, current) {
            ('e', ValueShape::List { element }) => element.as_ref(),
            ('k', ValueShape::Map { key, .. }) => key.as_ref(),
            ('v', ValueShape::Map { value, .. }) => value.as_ref(),
            ('c', ValueShape::Array { component }) => component.as_ref(),
            _ => {
                return Err(VerdictError::ShapeMismatch {
                    op,
                    expr: expr.to_string(),
                    shape: shape.to_string(),
                })
            }
        };
    }

    Ok(current.clone())
}

fn peel_optional(mut shape: &ValueShape) -> &ValueShape {
    while let ValueShape::Optional(inner) = shape {
        shape = inner.as_ref();
    }
    shape
}
