//! Composition policies

/// How the `order` attribute crosses a specification boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderPolicy {
    /// Composed nodes take the composing definition's order; explicit
    /// `order` bindings are rejected
    #[default]
    Locked,
    /// Explicit `order` bindings win, otherwise the order is inherited
    Bindable,
}

/// How a composed criterion's navigation expression relates to its root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthPolicy {
    /// The root's expression followed by the criterion's own
    #[default]
    Relative,
    /// The criterion's own expression only
    Absolute,
}
