//! Verdict Constraint - Constraint composition and validation
//!
//! This crate resolves composed constraint definitions into linear
//! execution paths, assembles executable criteria for declaration sites,
//! and validates model instances against them.

mod analyzer;
mod binding;
mod criterion;
mod handlers;
mod meta;
mod policy;
mod registry;
mod report;
mod resolver;
mod template;
mod types;
mod validator;

pub use analyzer::Analyzer;
pub use binding::{Binding, BindingMode};
pub use criterion::{Attributes, Criterion, CriterionHandlers};
pub use handlers::{
    BoundHandlers, Converter, HandlerRegistry, NotNullHandlers, Predicate, Stringifier,
    ValueHandlers,
};
pub use meta::{MetaAttr, MetaAttrs, MetaData, Slot};
pub use policy::{DepthPolicy, OrderPolicy};
pub use registry::{builtin_messages, DefinitionRegistry};
pub use report::{ValidationReport, Violation};
pub use resolver::Resolver;
pub use template::{resolve_to_fixed_point, Template, MAX_RESOLUTION_PASSES};
pub use types::{
    AttributeDef, ConstraintDef, ConstraintFile, Specification, DEPTH, GROUPS, MARKER, MESSAGE,
    ORDER, REQUIRED_ATTRIBUTES,
};
pub use validator::{CompiledField, CompiledModel, ModelValidator};
