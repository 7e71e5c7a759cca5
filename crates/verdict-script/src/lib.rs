//! Verdict Script - Rhai expressions for Verdict
//!
//! - `RhaiEvaluator` - evaluates expression-mode attribute bindings
//! - `ExprHandlers` - value handlers of the `by_expr` definition, whose
//!   predicate and stringifier are Rhai expressions over the value `v`
//!
//! Expressions see the shared evaluation context as read-only constants.

mod convert;
mod evaluator;
mod handlers;

pub use convert::{dynamic_to_value, value_to_dynamic};
pub use evaluator::RhaiEvaluator;
pub use handlers::{register, ExprHandlers, EXPR_DEFINITIONS, EXPR_HANDLER};
