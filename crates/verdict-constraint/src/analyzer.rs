//! Criterion assembly
//!
//! Turns the declarations attached to one position into executable
//! criteria, following the resolved path of each declaration.

use crate::criterion::{Attributes, Criterion, CriterionHandlers};
use crate::handlers::HandlerRegistry;
use crate::meta::MetaAttrs;
use crate::policy::DepthPolicy;
use crate::resolver::Resolver;
use crate::template::Template;
use crate::types::{DEPTH, GROUPS, MESSAGE, ORDER};
use std::collections::BTreeMap;
use std::sync::Arc;
use verdict_core::{Declaration, MessageCatalog, Result, Value, ValueShape, VerdictError};
use verdict_schema::{navigate, normalize_depth, GroupRegistry};

/// Builds criteria from declarations
pub struct Analyzer<'a> {
    resolver: &'a Resolver,
    handlers: &'a HandlerRegistry,
    groups: &'a GroupRegistry,
    catalog: Option<Arc<dyn MessageCatalog>>,
    depth_policy: DepthPolicy,
}

impl<'a> Analyzer<'a> {
    pub fn new(
        resolver: &'a Resolver,
        handlers: &'a HandlerRegistry,
        groups: &'a GroupRegistry,
    ) -> Self {
        Self {
            resolver,
            handlers,
            groups,
            catalog: None,
            depth_policy: DepthPolicy::default(),
        }
    }

    /// Render messages through `catalog`
    pub fn with_catalog(mut self, catalog: Arc<dyn MessageCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_depth_policy(mut self, policy: DepthPolicy) -> Self {
        self.depth_policy = policy;
        self
    }

    pub fn groups(&self) -> &GroupRegistry {
        self.groups
    }

    /// Analyze every declaration at `position`, in declaration order
    pub fn analyze(
        &self,
        position: &str,
        shape: &ValueShape,
        declarations: &[Declaration],
    ) -> Result<Vec<Arc<Criterion>>> {
        let mut criteria = Vec::new();
        for declaration in declarations {
            self.analyze_declaration(position, shape, declaration, &mut criteria)
                .map_err(|e| e.within(format!("failed to initialize {} at {}", declaration, position)))?;
        }
        Ok(criteria)
    }

    fn analyze_declaration(
        &self,
        position: &str,
        shape: &ValueShape,
        declaration: &Declaration,
        criteria: &mut Vec<Arc<Criterion>>,
    ) -> Result<()> {
        let (kind, declared) = match declaration {
            Declaration::Repeated { items, .. } => {
                for item in items {
                    self.analyze_declaration(position, shape, item, criteria)?;
                }
                return Ok(());
            }
            Declaration::Constraint { kind, attrs } => (kind, attrs),
        };

        if !self.resolver.is_definition(kind) {
            tracing::warn!("ignoring `{}` at {}: not a constraint definition", kind, position);
            return Ok(());
        }

        let md = self.resolver.resolve(kind)?;
        tracing::debug!("analyzing `{}` at {} ({} path nodes)", kind, position, md.path.len());

        let root = Arc::new(self.new_criterion(position, shape, declared, &md.attrs, None)?);
        for node in &md.path {
            if node.owner == root.kind() {
                criteria.push(Arc::clone(&root));
            } else {
                let criterion = self.new_criterion(position, shape, declared, node, Some(&root))?;
                criteria.push(Arc::new(criterion));
            }
        }
        Ok(())
    }

    fn new_criterion(
        &self,
        base: &str,
        shape: &ValueShape,
        declared: &BTreeMap<String, Value>,
        node: &MetaAttrs,
        root: Option<&Arc<Criterion>>,
    ) -> Result<Criterion> {
        let mut data = BTreeMap::new();
        for (name, attr) in &node.attrs {
            data.insert(name.clone(), attr.value_for(declared)?);
        }

        let message = take_string(&mut data, MESSAGE, &node.owner)?;
        let groups = match data.remove(GROUPS) {
            Some(Value::List(items)) => items
                .iter()
                .map(|g| {
                    g.as_str().map(str::to_string).ok_or_else(|| VerdictError::InvalidFieldType {
                        expected: "group name".to_string(),
                        got: g.type_name().to_string(),
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                return Err(VerdictError::InvalidFieldType {
                    expected: "list of groups".to_string(),
                    got: other.type_name().to_string(),
                })
            }
        };
        let own_depth = normalize_depth(&take_string(&mut data, DEPTH, &node.owner)?)?;
        let depth = match (root, self.depth_policy) {
            (Some(root), DepthPolicy::Relative) => format!("{}{}", root.depth(), own_depth),
            _ => own_depth,
        };
        let order = data.remove(ORDER).and_then(|v| v.as_i64()).unwrap_or(0);

        let position = if depth.is_empty() {
            base.to_string()
        } else {
            format!("{}.{}", base, depth)
        };

        let shared = root.filter(|root| {
            node.get(MESSAGE)
                .map(|attr| attr.owner == root.kind())
                .unwrap_or(false)
        });
        let template = match shared {
            Some(root) if root.position() == position => Arc::clone(root.template()),
            Some(root) => Arc::new(root.template().at(position.clone())),
            None => Arc::new(Template::new(
                node.owner.clone(),
                position.clone(),
                &message,
                &data,
                self.catalog.clone(),
            )),
        };

        let attrs = Attributes {
            root_owner: root
                .map(|r| r.kind().to_string())
                .unwrap_or_else(|| node.owner.clone()),
            depth,
            groups: self.groups.flatten(&groups),
            order,
            data,
        };
        let handlers = self.criterion_handlers(&node.owner, shape, &attrs)?;

        Ok(Criterion::new(node.owner.clone(), position, attrs, handlers, template))
    }

    /// Handlers of a leaf definition, `None` for markers
    fn criterion_handlers(
        &self,
        owner: &str,
        shape: &ValueShape,
        attrs: &Attributes,
    ) -> Result<Option<CriterionHandlers>> {
        let definition = self
            .resolver
            .definitions()
            .get(owner)
            .ok_or_else(|| VerdictError::UnknownDefinition(owner.to_string()))?;
        let handler = match &definition.handler {
            Some(handler) if !definition.is_marker() => handler,
            _ => return Ok(None),
        };

        let context = || format!("handler `{}` of `{}`", handler, owner);
        let handlers = self.handlers.require(handler).map_err(|e| e.within(context()))?;
        let target = navigate(shape, &attrs.depth)?;

        Ok(Some(CriterionHandlers {
            converter: handlers.converter(&target).map_err(|e| e.within(context()))?,
            predicate: handlers.predicate(attrs).map_err(|e| e.within(context()))?,
            stringifier: handlers.stringifier(attrs).map_err(|e| e.within(context()))?,
            accepts_null: handlers.accepts_null(),
        }))
    }
}

fn take_string(data: &mut BTreeMap<String, Value>, name: &str, owner: &str) -> Result<String> {
    match data.remove(name) {
        Some(Value::Str(text)) => Ok(text),
        Some(Value::Null) | None => Ok(String::new()),
        Some(other) => Err(VerdictError::InvalidFieldType {
            expected: "string".to_string(),
            got: other.type_name().to_string(),
        }
        .within(format!("attribute `{}` of `{}`", name, owner))),
    }
}
