//! Rhai-backed expression evaluation

use crate::convert::{dynamic_to_value, value_to_dynamic};
use rhai::{Dynamic, Engine, Scope, AST};
use std::sync::Arc;
use verdict_core::{EvalContext, ExpressionEvaluator, Result, Value, ValueShape, VerdictError};

/// Limits applied to every expression
const MAX_OPERATIONS: u64 = 100_000;
const MAX_EXPR_DEPTH: usize = 64;

/// Evaluates binding expressions with Rhai.
///
/// Context variables are visible as constants.
#[derive(Clone)]
pub struct RhaiEvaluator {
    engine: Arc<Engine>,
}

impl RhaiEvaluator {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        engine.set_max_operations(MAX_OPERATIONS);
        engine.set_max_expr_depths(MAX_EXPR_DEPTH, MAX_EXPR_DEPTH);
        Self {
            engine: Arc::new(engine),
        }
    }

    pub(crate) fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Compile an expression for repeated evaluation
    pub fn compile(&self, expr: &str) -> Result<AST> {
        self.engine
            .compile_expression(expr)
            .map_err(|e| VerdictError::ExpressionError {
                expr: expr.to_string(),
                reason: e.to_string(),
            })
    }
}

impl Default for RhaiEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionEvaluator for RhaiEvaluator {
    fn evaluate(
        &self,
        context: &EvalContext,
        expr: &str,
        target: Option<&ValueShape>,
    ) -> Result<Value> {
        let mut scope = context_scope(context);
        let result = self
            .engine
            .eval_expression_with_scope::<Dynamic>(&mut scope, expr)
            .map_err(|e| VerdictError::ExpressionError {
                expr: expr.to_string(),
                reason: e.to_string(),
            })?;

        let value = dynamic_to_value(&result)?;
        match target {
            Some(shape) => shape.coerce(value).map_err(|e| VerdictError::ExpressionError {
                expr: expr.to_string(),
                reason: e.to_string(),
            }),
            None => Ok(value),
        }
    }
}

/// A scope holding every context variable as a constant
pub(crate) fn context_scope(context: &EvalContext) -> Scope<'static> {
    let mut scope = Scope::new();
    for (name, value) in context.iter() {
        scope.push_constant_dynamic(name.clone(), value_to_dynamic(value));
    }
    scope
}
