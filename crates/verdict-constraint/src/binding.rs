//! Attribute binding expressions

use std::fmt;
use verdict_core::{Result, VerdictError};

/// How a binding produces its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingMode {
    /// `name`: reuse the target's default
    Default,
    /// `name = expr`: evaluate an expression
    Expression,
    /// `name > other`: alias an attribute of the composing definition
    Reference,
}

/// One parsed `name MODE value` binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub mode: BindingMode,
    pub value: String,
}

impl Binding {
    /// Parse a binding. The name runs up to the first `=` or `>`.
    pub fn parse(text: &str) -> Result<Self> {
        let (name, mode, value) = match text.find(|c: char| c == '=' || c == '>') {
            None => (text, BindingMode::Default, ""),
            Some(i) => {
                let mode = if text[i..].starts_with('=') {
                    BindingMode::Expression
                } else {
                    BindingMode::Reference
                };
                (&text[..i], mode, &text[i + 1..])
            }
        };

        let name = name.trim();
        let value = value.trim();
        let valid_name = !name.is_empty()
            && name.chars().all(|c| c.is_alphanumeric() || c == '_');
        if !valid_name || (mode != BindingMode::Default && value.is_empty()) {
            return Err(VerdictError::InvalidBinding(text.to_string()));
        }

        Ok(Binding {
            name: name.to_string(),
            mode,
            value: value.to_string(),
        })
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            BindingMode::Default => write!(f, "{}", self.name),
            BindingMode::Expression => write!(f, "{} = {}", self.name, self.value),
            BindingMode::Reference => write!(f, "{} > {}", self.name, self.value),
        }
    }
}
