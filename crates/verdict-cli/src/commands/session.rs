//! Registries shared by every command

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use verdict_constraint::{
    builtin_messages, Analyzer, DefinitionRegistry, HandlerRegistry, ModelValidator, Resolver,
};
use verdict_core::{EvalContext, MessageCatalog};
use verdict_schema::SchemaRegistry;
use verdict_script::RhaiEvaluator;

/// Everything loaded from a schemas directory
pub struct Session {
    pub schemas: SchemaRegistry,
    pub resolver: Resolver,
    pub handlers: HandlerRegistry,
    pub catalog: Arc<dyn MessageCatalog>,
}

impl Session {
    /// Load built-in and expression definitions, then the contents of
    /// `schemas_path`
    pub fn load(schemas_path: &str) -> Result<Self> {
        let root = Path::new(schemas_path);
        if !root.exists() {
            anyhow::bail!("Schemas directory not found: {}", schemas_path);
        }

        let evaluator = RhaiEvaluator::new();
        let context = EvalContext::new();

        let mut definitions = DefinitionRegistry::builtin()?;
        let mut handlers = HandlerRegistry::builtin();
        verdict_script::register(&mut definitions, &mut handlers, &evaluator, context.clone())?;
        definitions
            .load_directory(root)
            .context("Failed to load constraint definitions")?;

        let schemas =
            SchemaRegistry::load_from_directory(root).context("Failed to load schemas")?;

        let mut messages = builtin_messages()?;
        let messages_path = root.join("messages.toml");
        if messages_path.exists() {
            messages
                .load_file(&messages_path)
                .with_context(|| format!("Failed to load {}", messages_path.display()))?;
        }

        tracing::debug!(
            definitions = definitions.len(),
            models = schemas.model_names().len(),
            messages = messages.len(),
            "loaded session from {}",
            schemas_path
        );

        Ok(Self {
            schemas,
            resolver: Resolver::new(definitions, Arc::new(evaluator)).with_context(context),
            handlers,
            catalog: Arc::new(messages),
        })
    }

    pub fn analyzer(&self) -> Analyzer<'_> {
        Analyzer::new(&self.resolver, &self.handlers, self.schemas.groups())
            .with_catalog(Arc::clone(&self.catalog))
    }

    pub fn validator(&self) -> Result<ModelValidator> {
        ModelValidator::compile(&self.analyzer(), &self.schemas)
            .context("Failed to compile model criteria")
    }
}
