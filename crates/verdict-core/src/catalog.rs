//! Message catalog capability

use crate::error::Result;
use std::collections::HashMap;
use std::path::Path;

/// Looks up localized message text by key.
pub trait MessageCatalog: Send + Sync {
    fn message(&self, key: &str) -> Option<String>;

    /// Resolve a key, falling back to the key itself when absent.
    fn resolve(&self, key: &str) -> String {
        self.message(key).unwrap_or_else(|| key.to_string())
    }
}

/// A message catalog loaded from TOML.
///
/// Nested tables flatten to dotted keys, so `[v] max = "..."` is found
/// under `v.max`.
#[derive(Debug, Clone, Default)]
pub struct MessageBundle {
    messages: HashMap<String, String>,
}

impl MessageBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        self.load_string(&content)
    }

    pub fn load_string(&mut self, content: &str) -> Result<()> {
        let table: toml::Table = toml::from_str(content)?;
        self.flatten("", table);
        Ok(())
    }

    fn flatten(&mut self, prefix: &str, table: toml::Table) {
        for (key, value) in table {
            let full = if prefix.is_empty() {
                key
            } else {
                format!("{}.{}", prefix, key)
            };
            match value {
                toml::Value::Table(inner) => self.flatten(&full, inner),
                toml::Value::String(text) => {
                    self.messages.insert(full, text);
                }
                other => {
                    self.messages.insert(full, other.to_string());
                }
            }
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.messages.insert(key.into(), text.into());
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl MessageCatalog for MessageBundle {
    fn message(&self, key: &str) -> Option<String> {
        self.messages.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_tables_flatten() {
        let mut bundle = MessageBundle::new();
        bundle
            .load_string(
                r#"
                greeting = "hello"

                [v]
                max = "must be at most {#value}"
                "#,
            )
            .unwrap();
        assert_eq!(bundle.len(), 2);
        assert_eq!(
            bundle.message("v.max").as_deref(),
            Some("must be at most {#value}")
        );
    }

    #[test]
    fn test_resolve_falls_back_to_key() {
        let bundle = MessageBundle::new();
        assert_eq!(bundle.resolve("{v.missing}"), "{v.missing}");
    }
}
