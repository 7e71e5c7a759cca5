//! Model validation engine

use crate::analyzer::Analyzer;
use crate::criterion::Criterion;
use crate::report::ValidationReport;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use verdict_core::{Result, Value, ValueShape, VerdictError};
use verdict_schema::{GroupRegistry, SchemaRegistry};

/// Criteria of one model field, sorted by order
#[derive(Debug)]
pub struct CompiledField {
    pub name: String,
    pub position: String,
    pub shape: ValueShape,
    pub criteria: Vec<Arc<Criterion>>,
}

/// All compiled fields of a model
#[derive(Debug)]
pub struct CompiledModel {
    pub name: String,
    pub fields: Vec<CompiledField>,
}

impl CompiledModel {
    pub fn field(&self, name: &str) -> Option<&CompiledField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Validates model instances against their compiled criteria
#[derive(Debug)]
pub struct ModelValidator {
    models: HashMap<String, CompiledModel>,
    groups: GroupRegistry,
}

impl ModelValidator {
    /// Compile the criteria of every model in `schemas`
    pub fn compile(analyzer: &Analyzer<'_>, schemas: &SchemaRegistry) -> Result<Self> {
        let mut models = HashMap::new();

        for model_name in schemas.model_names() {
            let model = schemas.require_model(model_name)?;
            let mut fields = Vec::with_capacity(model.fields.len());

            for (field_name, field) in &model.fields {
                let position = model.position(field_name);
                let mut criteria = analyzer.analyze(&position, &field.shape, &field.constraints)?;
                criteria.sort_by_key(|c| c.order());
                fields.push(CompiledField {
                    name: field_name.clone(),
                    position,
                    shape: field.shape.clone(),
                    criteria,
                });
            }

            tracing::debug!("compiled model `{}` ({} fields)", model.name, fields.len());
            models.insert(
                model.name.clone(),
                CompiledModel {
                    name: model.name.clone(),
                    fields,
                },
            );
        }

        Ok(Self {
            models,
            groups: analyzer.groups().clone(),
        })
    }

    pub fn model(&self, name: &str) -> Option<&CompiledModel> {
        self.models.get(name)
    }

    pub fn model_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Validate one instance of `model`.
    ///
    /// Only criteria in one of `groups` run; no groups means the default
    /// group. Missing fields are null.
    pub fn validate(
        &self,
        model: &str,
        instance: &BTreeMap<String, Value>,
        groups: &[String],
    ) -> Result<ValidationReport> {
        let compiled = self
            .models
            .get(model)
            .ok_or_else(|| VerdictError::SchemaNotFound(model.to_string()))?;
        let groups = self.groups.flatten(groups);
        let mut report = ValidationReport::new();

        for name in instance.keys() {
            if compiled.field(name).is_none() {
                tracing::warn!("ignoring unknown field `{}` of model `{}`", name, model);
            }
        }

        for field in &compiled.fields {
            let value = match instance.get(&field.name) {
                None | Some(Value::Null) => Value::Null,
                Some(value) => field
                    .shape
                    .coerce(value.clone())
                    .map_err(|e| e.within(format!("at {}", field.position)))?,
            };

            for criterion in field.criteria.iter().filter(|c| c.in_groups(&groups)) {
                for item in walk(&value, criterion.depth()) {
                    if let Some(violation) = criterion.test(item)? {
                        report.push(violation);
                    }
                }
            }
        }

        Ok(report)
    }
}

/// Values reached by following a navigation expression
fn walk<'v>(value: &'v Value, depth: &str) -> Vec<&'v Value> {
    let mut current = vec![value];
    for op in depth.chars() {
        current = current
            .into_iter()
            .flat_map(|value| -> Vec<&'v Value> {
                match (op, value) {
                    ('e' | 'c', Value::List(items)) => items.iter().collect(),
                    ('k', Value::Map(entries)) => entries.iter().map(|(k, _)| k).collect(),
                    ('v', Value::Map(entries)) => entries.iter().map(|(_, v)| v).collect(),
                    _ => Vec::new(),
                }
            })
            .collect();
    }
    current
}
