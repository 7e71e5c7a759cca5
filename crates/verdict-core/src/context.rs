//! Expression evaluation capability and its shared context

use crate::error::{Result, VerdictError};
use crate::shape::ValueShape;
use crate::value::Value;
use std::collections::BTreeMap;

/// Variables visible to every expression evaluated during resolution.
///
/// Callers build and own the context and hand it to the resolver; it is
/// not mutated while definitions are being resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalContext {
    variables: BTreeMap<String, Value>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Evaluates a textual expression against a context, optionally coercing the
/// result to a target shape.
pub trait ExpressionEvaluator: Send + Sync {
    fn evaluate(
        &self,
        context: &EvalContext,
        expr: &str,
        target: Option<&ValueShape>,
    ) -> Result<Value>;
}

/// Evaluator for plain literals.
///
/// An expression is either the name of a context variable or a TOML
/// literal (`10`, `"text"`, `["A", "B"]`).
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralEvaluator;

impl ExpressionEvaluator for LiteralEvaluator {
    fn evaluate(
        &self,
        context: &EvalContext,
        expr: &str,
        target: Option<&ValueShape>,
    ) -> Result<Value> {
        let expr = expr.trim();
        let value = match context.get(expr) {
            Some(value) => value.clone(),
            None => {
                let mut table: toml::Table = toml::from_str(&format!("value = {}", expr))
                    .map_err(|e| VerdictError::ExpressionError {
                        expr: expr.to_string(),
                        reason: e.message().to_string(),
                    })?;
                table
                    .remove("value")
                    .map(Value::from)
                    .unwrap_or(Value::Null)
            }
        };

        match target {
            Some(shape) => shape.coerce(value).map_err(|e| VerdictError::ExpressionError {
                expr: expr.to_string(),
                reason: e.to_string(),
            }),
            None => Ok(value),
        }
    }
}
