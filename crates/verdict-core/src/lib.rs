//! Verdict Core - Foundational types for the Verdict engine
//!
//! This crate provides the types that all other Verdict crates depend on:
//! - `Value` and `ValueShape` - Boxed values and their static shapes
//! - `Declaration` - Raw constraint declarations at a declaration site
//! - `ExpressionEvaluator` and `MessageCatalog` - Injected capabilities
//! - Error types and Result alias

mod catalog;
mod context;
mod declaration;
mod error;
mod shape;
mod value;

pub use catalog::{MessageBundle, MessageCatalog};
pub use context::{EvalContext, ExpressionEvaluator, LiteralEvaluator};
pub use declaration::Declaration;
pub use error::{Result, VerdictError};
pub use shape::ValueShape;
pub use value::Value;
