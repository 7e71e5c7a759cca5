//! Expression-backed value handlers

use crate::convert::{dynamic_to_value, value_to_dynamic};
use crate::evaluator::{context_scope, RhaiEvaluator};
use rhai::{Dynamic, Engine, AST};
use std::sync::Arc;
use verdict_constraint::{
    Attributes, Converter, DefinitionRegistry, HandlerRegistry, Predicate, Stringifier,
    ValueHandlers,
};
use verdict_core::{EvalContext, Result, Value, ValueShape, VerdictError};

/// Definitions shipped with this crate
pub const EXPR_DEFINITIONS: &str = include_str!("expr.toml");

/// Name the expression handlers are registered under
pub const EXPR_HANDLER: &str = "expr";

/// Name of the variable holding the tested value
const VALUE_VARIABLE: &str = "v";

/// Handlers whose predicate is the `expr` attribute and whose optional
/// stringifier is the `stringifier` attribute
pub struct ExprHandlers {
    evaluator: RhaiEvaluator,
    context: EvalContext,
}

impl ExprHandlers {
    pub fn new(evaluator: &RhaiEvaluator, context: EvalContext) -> Self {
        Self {
            evaluator: evaluator.clone(),
            context,
        }
    }

    /// Evaluate a compiled expression with `v` bound to `value`
    fn run(engine: &Engine, context: &EvalContext, ast: &AST, value: &Value) -> Result<Dynamic> {
        let mut scope = context_scope(context);
        scope.push_constant_dynamic(VALUE_VARIABLE, value_to_dynamic(value));
        engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, ast)
            .map_err(|e| VerdictError::ExpressionError {
                expr: ast.source().unwrap_or_default().to_string(),
                reason: e.to_string(),
            })
    }
}

impl ValueHandlers for ExprHandlers {
    fn converter(&self, _shape: &ValueShape) -> Result<Option<Converter>> {
        Ok(None)
    }

    fn predicate(&self, attrs: &Attributes) -> Result<Predicate> {
        let expr = attrs.require_str("expr")?;
        let mut ast = self.evaluator.compile(expr)?;
        ast.set_source(expr);
        tracing::debug!("compiled predicate `{}` of `{}`", expr, attrs.root_owner);

        let engine = Arc::clone(self.evaluator.engine());
        let context = self.context.clone();
        Ok(Box::new(move |value: &Value| -> Result<bool> {
            let result = Self::run(&engine, &context, &ast, value)?;
            result.as_bool().map_err(|got| VerdictError::ExpressionError {
                expr: ast.source().unwrap_or_default().to_string(),
                reason: format!("expected a bool, got {}", got),
            })
        }))
    }

    fn stringifier(&self, attrs: &Attributes) -> Result<Option<Stringifier>> {
        let expr = match attrs.get("stringifier").and_then(Value::as_str) {
            Some(expr) if !expr.trim().is_empty() => expr,
            _ => return Ok(None),
        };
        let mut ast = self.evaluator.compile(expr)?;
        ast.set_source(expr);

        let engine = Arc::clone(self.evaluator.engine());
        let context = self.context.clone();
        Ok(Some(Box::new(move |value: &Value| -> Result<String> {
            let result = Self::run(&engine, &context, &ast, value)?;
            if result.is_string() {
                return Ok(result.to_string());
            }
            Ok(dynamic_to_value(&result)?.stringify())
        })))
    }
}

/// Add the expression definitions and their handlers to the registries
pub fn register(
    definitions: &mut DefinitionRegistry,
    handlers: &mut HandlerRegistry,
    evaluator: &RhaiEvaluator,
    context: EvalContext,
) -> Result<()> {
    definitions.load_string(EXPR_DEFINITIONS)?;
    handlers.register(EXPR_HANDLER, ExprHandlers::new(evaluator, context));
    Ok(())
}
