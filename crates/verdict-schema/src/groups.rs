//! Validation groups

use serde::Deserialize;
use std::collections::{HashMap, HashSet, VecDeque};
use verdict_core::Result;

/// Group applied to criteria that name no group
pub const DEFAULT_GROUP: &str = "Default";

/// Schema definition for a validation group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSchema {
    pub name: String,
    pub description: Option<String>,
    /// Groups this group is composed of. A group with no includes is a leaf.
    pub includes: Vec<String>,
}

impl GroupSchema {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            includes: Vec::new(),
        }
    }

    pub fn composite(name: impl Into<String>, includes: &[&str]) -> Self {
        Self {
            name: name.into(),
            description: None,
            includes: includes.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn is_composite(&self) -> bool {
        !self.includes.is_empty()
    }
}

/// TOML file format for group schemas
#[derive(Debug, Deserialize)]
pub struct GroupSchemaFile {
    #[serde(default)]
    pub group: HashMap<String, GroupSchemaDefinition>,
}

#[derive(Debug, Deserialize)]
pub struct GroupSchemaDefinition {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub includes: Vec<String>,
}

/// Registry of known validation groups
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    groups: HashMap<String, GroupSchema>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_string(&mut self, content: &str) -> Result<()> {
        let file: GroupSchemaFile = toml::from_str(content)?;
        for (name, def) in file.group {
            self.register(GroupSchema {
                name,
                description: def.description,
                includes: def.includes,
            });
        }
        Ok(())
    }

    pub fn register(&mut self, group: GroupSchema) {
        self.groups.insert(group.name.clone(), group);
    }

    pub fn get(&self, name: &str) -> Option<&GroupSchema> {
        self.groups.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.groups.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Replace composite groups with their constituents, recursively.
    ///
    /// Leaves keep their first-seen order and appear once. Unknown groups
    /// are leaves. A composite group is expanded at most once, so include
    /// cycles terminate. An empty result becomes the default group.
    pub fn flatten(&self, groups: &[String]) -> Vec<String> {
        let mut queue: VecDeque<&str> = groups.iter().map(|s| s.as_str()).collect();
        let mut expanded = HashSet::new();
        let mut seen = HashSet::new();
        let mut leaves = Vec::new();

        while let Some(name) = queue.pop_front() {
            match self.groups.get(name) {
                Some(group) if group.is_composite() => {
                    if expanded.insert(name) {
                        queue.extend(group.includes.iter().map(|s| s.as_str()));
                    }
                }
                _ => {
                    if seen.insert(name) {
                        leaves.push(name.to_string());
                    }
                }
            }
        }

        if leaves.is_empty() {
            leaves.push(DEFAULT_GROUP.to_string());
        }
        leaves
    }
}
