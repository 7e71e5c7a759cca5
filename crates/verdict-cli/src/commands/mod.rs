//! CLI command implementations

pub mod criteria;
pub mod inspect;
pub mod session;
pub mod validate;
