//! Violation message templates
//!
//! Placeholders:
//! - `{$p}` - position of the failing value, resolved through the catalog
//! - `{$v}` - the stringified failing value
//! - `{#name}` - the stringified data attribute `name`
//! - `{key}` - a catalog message, in catalog mode only

use crate::report::Violation;
use std::collections::BTreeMap;
use std::sync::Arc;
use verdict_core::{MessageCatalog, Value};

/// Upper bound on catalog expansion passes
pub const MAX_RESOLUTION_PASSES: usize = 16;

#[derive(Clone)]
enum TemplateMode {
    /// Final text with data already filled in
    Direct(String),
    /// A catalog key, expanded on every render
    Catalog {
        text: String,
        data: Vec<(String, String)>,
    },
}

/// Renders the message of a failing criterion
pub struct Template {
    cause: String,
    position: String,
    mode: TemplateMode,
    catalog: Option<Arc<dyn MessageCatalog>>,
}

impl Template {
    /// Build a template. Catalog mode is used when a catalog is configured
    /// and `message` is a bare `{key}`.
    pub fn new(
        cause: impl Into<String>,
        position: impl Into<String>,
        message: &str,
        data: &BTreeMap<String, Value>,
        catalog: Option<Arc<dyn MessageCatalog>>,
    ) -> Self {
        let mode = if catalog.is_some() && is_catalog_key(message) {
            TemplateMode::Catalog {
                text: message.to_string(),
                data: data
                    .iter()
                    .map(|(name, value)| (name.clone(), value.stringify()))
                    .collect(),
            }
        } else {
            let mut text = message.to_string();
            for (name, value) in data {
                text = text.replace(&format!("{{#{}}}", name), &value.stringify());
            }
            TemplateMode::Direct(text)
        };

        Self {
            cause: cause.into(),
            position: position.into(),
            mode,
            catalog,
        }
    }

    pub fn is_catalog(&self) -> bool {
        matches!(self.mode, TemplateMode::Catalog { .. })
    }

    pub fn position(&self) -> &str {
        &self.position
    }

    /// The same message and cause, reported at `position`
    pub fn at(&self, position: impl Into<String>) -> Self {
        Self {
            cause: self.cause.clone(),
            position: position.into(),
            mode: self.mode.clone(),
            catalog: self.catalog.clone(),
        }
    }

    /// Render a violation for the stringified failing value
    pub fn render(&self, value: &str) -> Violation {
        let text = match (&self.mode, &self.catalog) {
            (TemplateMode::Catalog { text, data }, Some(catalog)) => {
                let mut text = resolve_to_fixed_point(text, catalog.as_ref());
                for (name, value) in data {
                    text = text.replace(&format!("{{#{}}}", name), value);
                }
                text
            }
            (TemplateMode::Catalog { text, .. }, None) => text.clone(),
            (TemplateMode::Direct(text), _) => text.clone(),
        };

        let position = match &self.catalog {
            Some(catalog) => catalog.resolve(&self.position),
            None => self.position.clone(),
        };

        Violation {
            constraint: self.cause.clone(),
            position: self.position.clone(),
            message: text.replace("{$p}", &position).replace("{$v}", value),
        }
    }
}

/// A bare `{key}` with no `$`/`#` markers or nested braces
fn is_catalog_key(message: &str) -> bool {
    message
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .map(|key| !key.contains(|c: char| matches!(c, '$' | '#' | '{' | '}')))
        .unwrap_or(false)
}

/// Expand `{key}` placeholders through the catalog until the text stops
/// changing or the pass bound is reached
pub fn resolve_to_fixed_point(text: &str, catalog: &dyn MessageCatalog) -> String {
    let mut current = text.to_string();
    for _ in 0..MAX_RESOLUTION_PASSES {
        let expanded = expand_once(&current, catalog);
        if expanded == current {
            return current;
        }
        current = expanded;
    }
    tracing::warn!(
        "message `{}` did not settle after {} passes",
        text,
        MAX_RESOLUTION_PASSES
    );
    current
}

/// Replace every catalog placeholder in `text` once
fn expand_once(text: &str, catalog: &dyn MessageCatalog) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find('}');
        let nested = after.find('{');

        match close {
            Some(close) if nested.map(|n| n > close).unwrap_or(true) => {
                let key = &after[..close];
                let is_placeholder = !key.is_empty() && !key.starts_with(|c: char| c == '$' || c == '#');
                match catalog.message(key) {
                    Some(message) if is_placeholder => out.push_str(&message),
                    _ => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use verdict_core::MessageBundle;

    fn bundle(entries: &[(&str, &str)]) -> Arc<dyn MessageCatalog> {
        let mut bundle = MessageBundle::new();
        for (key, text) in entries {
            bundle.insert(*key, *text);
        }
        Arc::new(bundle)
    }

    fn data(entries: &[(&str, Value)]) -> BTreeMap<String, Value> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_direct_without_catalog() {
        let template = Template::new("not_null", "User.name", "{v.not_null}", &BTreeMap::new(), None);
        assert!(!template.is_catalog());
        assert_eq!(template.render("null").message, "{v.not_null}");
    }

    #[test]
    fn test_direct_fills_data() {
        let template = Template::new(
            "max",
            "Order.amount",
            "{$p} must be at most {#value}, got {$v}",
            &data(&[("value", Value::Int(10))]),
            None,
        );
        let violation = template.render("15");
        assert_eq!(violation.position, "Order.amount");
        assert_eq!(violation.constraint, "max");
        assert_eq!(violation.message, "Order.amount must be at most 10, got 15");
    }

    #[test]
    fn test_direct_with_catalog_localizes_position() {
        let catalog = bundle(&[("Order.amount", "amount")]);
        let template = Template::new("max", "Order.amount", "{$p} too big", &BTreeMap::new(), Some(catalog));
        assert!(!template.is_catalog());
        assert_eq!(template.render("15").message, "amount too big");
    }

    #[test]
    fn test_catalog_resolves_nested_keys() {
        let catalog = bundle(&[
            ("v.range", "{$p} must lie within {v.bounds}, got {$v}"),
            ("v.bounds", "[{#min}, {#max}]"),
        ]);
        let template = Template::new(
            "range",
            "Order.amount",
            "{v.range}",
            &data(&[("min", Value::Int(1)), ("max", Value::Int(9))]),
            Some(catalog),
        );
        assert!(template.is_catalog());
        assert_eq!(
            template.render("15").message,
            "Order.amount must lie within [1, 9], got 15"
        );
    }

    #[test]
    fn test_unknown_keys_are_kept() {
        let catalog = bundle(&[]);
        let template = Template::new("max", "p", "{v.unknown}", &BTreeMap::new(), Some(catalog));
        assert!(template.is_catalog());
        assert_eq!(template.render("1").message, "{v.unknown}");
    }

    #[test]
    fn test_catalog_key_detection() {
        assert!(is_catalog_key("{v.max}"));
        assert!(!is_catalog_key("{$p} too big"));
        assert!(!is_catalog_key("{#value}"));
        assert!(!is_catalog_key("plain"));
        assert!(!is_catalog_key("{a}{b}"));
    }

    #[test]
    fn test_self_reference_is_bounded() {
        let catalog = bundle(&[("loop", "again {loop}")]);
        let text = resolve_to_fixed_point("{loop}", catalog.as_ref());
        assert_eq!(text.matches("again").count(), MAX_RESOLUTION_PASSES);
    }

    #[test]
    fn test_unbalanced_braces() {
        let catalog = bundle(&[("a", "A")]);
        assert_eq!(expand_once("{ {a} }", catalog.as_ref()), "{ A }");
        assert_eq!(expand_once("tail {a", catalog.as_ref()), "tail {a");
    }

    proptest! {
        #[test]
        fn chain_of_keys_settles(len in 1usize..12) {
            let mut bundle = MessageBundle::new();
            for i in 0..len {
                bundle.insert(format!("k{}", i), format!("{{k{}}}", i + 1));
            }
            bundle.insert(format!("k{}", len), "end");
            prop_assert_eq!(resolve_to_fixed_point("{k0}", &bundle), "end");
        }

        #[test]
        fn cycles_terminate(len in 1usize..6) {
            let mut bundle = MessageBundle::new();
            for i in 0..len {
                bundle.insert(format!("k{}", i), format!("x{{k{}}}", (i + 1) % len));
            }
            let text = resolve_to_fixed_point("{k0}", &bundle);
            prop_assert!(text.len() <= 2 * (MAX_RESOLUTION_PASSES + 4));
        }
    }
}
