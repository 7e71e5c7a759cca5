//! Error types for Verdict

use thiserror::Error;

/// The main error type for Verdict operations
#[derive(Debug, Error)]
pub enum VerdictError {
    #[error("circular composition: {}", format_chain(.chain))]
    CircularComposition { chain: Vec<String> },

    #[error("attribute `{attribute}` of `{definition}` is defined more than once")]
    DuplicateAttribute {
        definition: String,
        attribute: String,
    },

    #[error("`{definition}` is missing required attributes: {}", .missing.join(", "))]
    MissingRequiredAttributes {
        definition: String,
        missing: Vec<String>,
    },

    #[error("marker `{0}` must specify at least one other constraint")]
    MarkerWithoutSpecification(String),

    #[error("attribute `{attribute}` of `{definition}` is not bound by the specification")]
    MissingSpecification {
        definition: String,
        attribute: String,
    },

    #[error("`{definition}` has no attribute `{attribute}`")]
    MissingAttribute {
        definition: String,
        attribute: String,
    },

    #[error("attribute `{attribute}` of `{definition}` is already bound to {value}")]
    AttributeAlreadyBound {
        definition: String,
        attribute: String,
        value: String,
    },

    #[error("attribute `{attribute}` of `{definition}` has no default value")]
    NoDefaultValue {
        definition: String,
        attribute: String,
    },

    #[error("the `order` of `{0}` cannot be bound; use the specification's own order instead")]
    OrderingAttributeLocked(String),

    #[error("self attributes of `{definition}` can only be set by expression (`name = expr`), got `{binding}`")]
    SelfOverrideNotExpression { definition: String, binding: String },

    #[error("invalid attribute binding: `{0}`")]
    InvalidBinding(String),

    #[error("invalid navigation expression `{0}`: only e, k, v and c are allowed")]
    InvalidExpression(String),

    #[error("navigation operator `{op}` of `{expr}` does not apply to {shape}")]
    ShapeMismatch {
        op: char,
        expr: String,
        shape: String,
    },

    #[error("unsupported conversion: {shape} cannot be handled as {expected}")]
    UnsupportedConversion { shape: String, expected: String },

    #[error("cannot evaluate expression `{expr}`: {reason}")]
    ExpressionError { expr: String, reason: String },

    #[error("unknown constraint definition: {0}")]
    UnknownDefinition(String),

    #[error("unknown value handlers: {0}")]
    UnknownHandler(String),

    #[error("no value for `{attribute}` of `{definition}`")]
    MissingValue {
        definition: String,
        attribute: String,
    },

    #[error("Invalid field type: expected {expected}, got {got}")]
    InvalidFieldType { expected: String, got: String },

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Schema not found: {0}")]
    SchemaNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("{context}")]
    Context {
        context: String,
        #[source]
        source: Box<VerdictError>,
    },
}

impl VerdictError {
    /// Wrap this error with a description of what was being done.
    pub fn within(self, context: impl Into<String>) -> Self {
        VerdictError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error of a context chain.
    pub fn root_cause(&self) -> &VerdictError {
        let mut current = self;
        while let VerdictError::Context { source, .. } = current {
            current = source;
        }
        current
    }
}

/// Result type alias for Verdict operations
pub type Result<T> = std::result::Result<T, VerdictError>;

impl From<toml::de::Error> for VerdictError {
    fn from(err: toml::de::Error) -> Self {
        VerdictError::TomlParseError(err.to_string())
    }
}

/// Render a traversal chain, bracketing the segment that closes the cycle.
fn format_chain(chain: &[String]) -> String {
    let Some(repeated) = chain.last() else {
        return String::new();
    };
    let start = chain.iter().position(|node| node == repeated).unwrap_or(0);

    let mut out = String::new();
    for (i, node) in chain.iter().enumerate() {
        if i == start {
            out.push_str("((( ");
        }
        out.push_str(node);
        if i + 1 < chain.len() {
            out.push_str(" -> ");
        }
    }
    out.push_str(" )))");
    out
}
