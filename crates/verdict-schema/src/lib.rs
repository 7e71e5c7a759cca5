//! Verdict Schema - Value shapes, validation groups and data-model schemas
//!
//! This crate parses shape descriptors, navigates nested shapes, flattens
//! validation groups and loads the model schemas that constraints are
//! declared on.

mod groups;
mod model;
mod navigate;
mod parse;
mod registry;

pub use groups::{GroupRegistry, GroupSchema, DEFAULT_GROUP};
pub use model::{parse_declaration, FieldSchema, ModelSchema};
pub use navigate::{navigate, normalize_depth};
pub use parse::parse_shape;
pub use registry::{toml_files, SchemaRegistry};
