//! Constraint graph resolution
//!
//! Turns a constraint definition and the definitions it specifies into a
//! linear execution path of self-sufficient attribute sets. Results are
//! cached for the lifetime of the resolver.

use crate::binding::{Binding, BindingMode};
use crate::meta::{MetaAttr, MetaAttrs, MetaData, Slot};
use crate::policy::OrderPolicy;
use crate::registry::DefinitionRegistry;
use crate::types::{
    implicit_shape, ConstraintDef, Specification, DEPTH, GROUPS, MESSAGE, ORDER,
    REQUIRED_ATTRIBUTES,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use verdict_core::{
    EvalContext, ExpressionEvaluator, Result, Value, ValueShape, VerdictError,
};

/// Resolves constraint definitions into [`MetaData`], memoized by name
pub struct Resolver {
    definitions: DefinitionRegistry,
    evaluator: Arc<dyn ExpressionEvaluator>,
    context: EvalContext,
    policy: OrderPolicy,
    cache: RwLock<HashMap<String, Arc<MetaData>>>,
    build_lock: Mutex<()>,
}

impl Resolver {
    pub fn new(definitions: DefinitionRegistry, evaluator: Arc<dyn ExpressionEvaluator>) -> Self {
        Self {
            definitions,
            evaluator,
            context: EvalContext::new(),
            policy: OrderPolicy::default(),
            cache: RwLock::new(HashMap::new()),
            build_lock: Mutex::new(()),
        }
    }

    /// Use `context` for expression-mode bindings
    pub fn with_context(mut self, context: EvalContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_policy(mut self, policy: OrderPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn definitions(&self) -> &DefinitionRegistry {
        &self.definitions
    }

    pub fn policy(&self) -> OrderPolicy {
        self.policy
    }

    /// Check whether a declaration kind names a constraint definition
    pub fn is_definition(&self, name: &str) -> bool {
        self.definitions.contains(name)
    }

    /// Resolve a definition, building and caching it on first use.
    ///
    /// Definitions built along the way are published together once the
    /// whole build succeeds; a failed build publishes nothing.
    pub fn resolve(&self, name: &str) -> Result<Arc<MetaData>> {
        if let Some(md) = self.cached(name) {
            return Ok(md);
        }

        let _guard = self
            .build_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(md) = self.cached(name) {
            return Ok(md);
        }

        let mut build = Build {
            resolver: self,
            staged: HashMap::new(),
            chain: Vec::new(),
        };
        let md = build.resolve(name)?;

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        for (staged_name, staged) in build.staged {
            tracing::debug!("published definition `{}`", staged_name);
            cache.insert(staged_name, staged);
        }
        Ok(md)
    }

    /// Number of cached definitions
    pub fn cached_len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drop every cached definition
    pub fn reset(&self) {
        let _guard = self
            .build_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn cached(&self, name: &str) -> Option<Arc<MetaData>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn evaluate(&self, expr: &str, shape: Option<&ValueShape>) -> Result<Value> {
        self.evaluator.evaluate(&self.context, expr, shape)
    }
}

/// State of one resolution: definitions built so far and the chain of
/// definitions currently being resolved
struct Build<'r> {
    resolver: &'r Resolver,
    staged: HashMap<String, Arc<MetaData>>,
    chain: Vec<String>,
}

impl Build<'_> {
    fn resolve(&mut self, name: &str) -> Result<Arc<MetaData>> {
        if self.chain.iter().any(|n| n == name) {
            let mut chain = self.chain.clone();
            chain.push(name.to_string());
            return Err(VerdictError::CircularComposition { chain });
        }
        if let Some(md) = self.staged.get(name) {
            return Ok(md.clone());
        }
        if let Some(md) = self.resolver.cached(name) {
            return Ok(md);
        }

        let resolver = self.resolver;
        let def = resolver
            .definitions
            .get(name)
            .ok_or_else(|| VerdictError::UnknownDefinition(name.to_string()))?;

        self.chain.push(name.to_string());
        let built = self.build(def);
        self.chain.pop();

        let md = Arc::new(
            built.map_err(|e| e.within(format!("failed to initialize constraint `{}`", name)))?,
        );
        tracing::debug!(
            "resolved definition `{}`: {}",
            name,
            md.path_owners().join(" -> ")
        );
        self.staged.insert(name.to_string(), md.clone());
        Ok(md)
    }

    fn build(&mut self, def: &ConstraintDef) -> Result<MetaData> {
        let name = def.name.as_str();
        let attrs = self.own_attributes(def)?;

        let missing: Vec<String> = REQUIRED_ATTRIBUTES
            .iter()
            .filter(|required| !attrs.contains(required))
            .map(|required| required.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(VerdictError::MissingRequiredAttributes {
                definition: name.to_string(),
                missing,
            });
        }

        let mut specs: Vec<&Specification> = def
            .specifications
            .iter()
            .filter(|spec| spec.target != name)
            .collect();
        specs.sort_by_key(|spec| spec.order);

        let marker = def.is_marker();
        if marker && specs.is_empty() {
            return Err(VerdictError::MarkerWithoutSpecification(name.to_string()));
        }

        let split = specs.partition_point(|spec| spec.order <= 0);
        let mut path = Vec::new();
        for spec in &specs[..split] {
            self.append_specification(name, &attrs, spec, &mut path)?;
        }
        if !marker {
            path.push(attrs.clone());
        }
        for spec in &specs[split..] {
            self.append_specification(name, &attrs, spec, &mut path)?;
        }

        Ok(MetaData {
            name: name.to_string(),
            handler: def.handler.clone(),
            attrs,
            path,
        })
    }

    /// Declared attributes as deferred slots, plus self overrides
    fn own_attributes(&self, def: &ConstraintDef) -> Result<MetaAttrs> {
        let name = def.name.as_str();
        let mut attrs = MetaAttrs::new(name);
        for (attr_name, attr) in &def.attributes {
            attrs.insert(
                attr_name.clone(),
                MetaAttr::deferred(name, attr_name.clone(), Some(attr.shape.clone()), attr.default.clone()),
            );
        }

        let overrides = def.specifications.iter().filter(|spec| spec.target == name);
        for text in overrides.flat_map(|spec| spec.attrs.iter()) {
            let binding = Binding::parse(text)?;
            if binding.mode != BindingMode::Expression {
                return Err(VerdictError::SelfOverrideNotExpression {
                    definition: name.to_string(),
                    binding: text.clone(),
                });
            }
            if attrs.contains(&binding.name) {
                return Err(VerdictError::DuplicateAttribute {
                    definition: name.to_string(),
                    attribute: binding.name,
                });
            }
            let shape = implicit_shape(&binding.name);
            let value = self.resolver.evaluate(&binding.value, shape.as_ref())?;
            attrs.insert(binding.name, MetaAttr::constant(name, value));
        }

        Ok(attrs)
    }

    /// Resolve a specification's target and append its nodes to `path`
    fn append_specification(
        &mut self,
        name: &str,
        attrs: &MetaAttrs,
        spec: &Specification,
        path: &mut Vec<MetaAttrs>,
    ) -> Result<()> {
        let target = self.resolve(&spec.target)?;
        let node = self.bind(name, attrs, spec, &target).map_err(|e| {
            e.within(format!("in specification of `{}` by `{}`", spec.target, name))
        })?;

        for entry in &target.path {
            if entry.owner == target.name {
                path.push(node.clone());
            } else {
                path.push(rematerialize(entry, &node)?);
            }
        }
        Ok(())
    }

    /// Bind every attribute of `target` for one specification
    fn bind(
        &self,
        name: &str,
        attrs: &MetaAttrs,
        spec: &Specification,
        target: &MetaData,
    ) -> Result<MetaAttrs> {
        let policy = self.resolver.policy;
        let mut node = MetaAttrs::new(target.name.clone());

        for text in &spec.attrs {
            let binding = Binding::parse(text)?;
            if binding.name == ORDER && policy == OrderPolicy::Locked {
                return Err(VerdictError::OrderingAttributeLocked(name.to_string()));
            }
            let target_attr = target.attrs.get(&binding.name).ok_or_else(|| {
                VerdictError::MissingAttribute {
                    definition: target.name.clone(),
                    attribute: binding.name.clone(),
                }
            })?;
            if node.contains(&binding.name) {
                return Err(VerdictError::DuplicateAttribute {
                    definition: target.name.clone(),
                    attribute: binding.name,
                });
            }

            let attr = match binding.mode {
                BindingMode::Reference if binding.name == DEPTH => {
                    MetaAttr::constant(name, Value::from(""))
                }
                BindingMode::Reference => attrs.get(&binding.value).cloned().ok_or_else(|| {
                    VerdictError::MissingAttribute {
                        definition: name.to_string(),
                        attribute: binding.value.clone(),
                    }
                })?,
                BindingMode::Default => match &target_attr.slot {
                    Slot::Const(value) => MetaAttr::constant(name, value.clone()),
                    Slot::Deferred {
                        default: Some(default),
                        ..
                    } => MetaAttr::constant(name, default.clone()),
                    Slot::Deferred { default: None, .. } => {
                        return Err(VerdictError::NoDefaultValue {
                            definition: target.name.clone(),
                            attribute: binding.name,
                        })
                    }
                },
                BindingMode::Expression => {
                    if let Slot::Const(value) = &target_attr.slot {
                        return Err(VerdictError::AttributeAlreadyBound {
                            definition: target.name.clone(),
                            attribute: binding.name,
                            value: value.stringify(),
                        });
                    }
                    let shape = target_attr
                        .shape()
                        .cloned()
                        .or_else(|| implicit_shape(&binding.name));
                    let value = self.resolver.evaluate(&binding.value, shape.as_ref())?;
                    MetaAttr::constant(name, value)
                }
            };
            node.insert(binding.name, attr);
        }

        for inherited in [MESSAGE, GROUPS] {
            if !node.contains(inherited) {
                if let Some(attr) = attrs.get(inherited) {
                    node.insert(inherited, attr.clone());
                }
            }
        }
        if !node.contains(DEPTH) {
            node.insert(DEPTH, MetaAttr::constant(name, Value::from("")));
        }
        if !node.contains(ORDER) {
            let order = attrs
                .get(ORDER)
                .cloned()
                .unwrap_or_else(|| MetaAttr::constant(name, Value::Int(0)));
            node.insert(ORDER, order);
        }

        for (attr_name, attr) in &target.attrs.attrs {
            if node.contains(attr_name) {
                continue;
            }
            if attr.is_const() {
                node.insert(attr_name.clone(), attr.clone());
            } else {
                return Err(VerdictError::MissingSpecification {
                    definition: target.name.clone(),
                    attribute: attr_name.clone(),
                });
            }
        }

        Ok(node)
    }
}

/// Rewrite a node of a composed definition's path in terms of the
/// bindings made for that definition
fn rematerialize(entry: &MetaAttrs, bindings: &MetaAttrs) -> Result<MetaAttrs> {
    let mut node = MetaAttrs::new(entry.owner.clone());
    for (attr_name, attr) in &entry.attrs {
        let attr = match attr.slot_name() {
            None => attr.clone(),
            Some(slot) => bindings.get(slot).cloned().ok_or_else(|| {
                VerdictError::MissingSpecification {
                    definition: bindings.owner.clone(),
                    attribute: slot.to_string(),
                }
            })?,
        };
        node.insert(attr_name.clone(), attr);
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_core::LiteralEvaluator;

    const BASE_ATTRS: &str = r#"
message = { type = "string", default = "{m}" }
groups = { type = "list<type>", default = [] }
depth = { type = "string", default = "" }
order = { type = "i32", default = 0 }
"#;

    fn resolver(extra: &str) -> Resolver {
        let mut definitions = DefinitionRegistry::builtin().unwrap();
        definitions.load_string(extra).unwrap();
        Resolver::new(definitions, Arc::new(LiteralEvaluator))
    }

    fn definition(name: &str, handler: &str, extra_attrs: &str, specs: &str) -> String {
        format!(
            "[definition.{name}]\nhandler = \"{handler}\"\n[definition.{name}.attributes]\n{BASE_ATTRS}{extra_attrs}\n{specs}\n"
        )
    }

    fn root_cause(err: VerdictError) -> VerdictError {
        match err {
            VerdictError::Context { source, .. } => root_cause(*source),
            other => other,
        }
    }

    #[test]
    fn test_leaf_path_is_self() {
        let resolver = resolver("");
        let md = resolver.resolve("max").unwrap();
        assert_eq!(md.path_owners(), vec!["max"]);
        assert_eq!(md.path[0], md.attrs);
        assert!(!md.is_marker());
    }

    #[test]
    fn test_marker_orders_specifications() {
        let resolver = resolver("");
        let md = resolver.resolve("range").unwrap();
        assert!(md.is_marker());
        assert_eq!(md.path_owners(), vec!["min", "max"]);

        let min = &md.path[0];
        assert_eq!(
            min.get("value").unwrap(),
            &MetaAttr::deferred("range", "min", Some(ValueShape::I64), None)
        );
        assert_eq!(min.get(MESSAGE).unwrap().owner, "range");
        assert_eq!(
            min.get(DEPTH).unwrap(),
            &MetaAttr::constant("range", Value::from(""))
        );
        assert_eq!(min.get(ORDER).unwrap().slot_name(), Some("order"));
    }

    #[test]
    fn test_self_between_specifications() {
        let extra = definition(
            "bounded",
            "max",
            "value = \"i64\"",
            r#"
[[definition.bounded.specify]]
target = "max"
order = 3
attrs = ["value = 100"]

[[definition.bounded.specify]]
target = "not_null"
order = 0
"#,
        );
        let resolver = resolver(&extra);
        let md = resolver.resolve("bounded").unwrap();
        assert_eq!(md.path_owners(), vec!["not_null", "bounded", "max"]);
        assert_eq!(
            md.path[2].get("value").unwrap(),
            &MetaAttr::constant("bounded", Value::Int(100))
        );
    }

    #[test]
    fn test_nested_marker_is_rematerialized() {
        let extra = definition(
            "percent",
            "marker",
            "",
            r#"
[[definition.percent.specify]]
target = "range"
attrs = ["min = 0", "max = 100"]
"#,
        );
        let resolver = resolver(&extra);
        let md = resolver.resolve("percent").unwrap();
        assert_eq!(md.path_owners(), vec!["min", "max"]);
        assert_eq!(
            md.path[0].get("value").unwrap(),
            &MetaAttr::constant("percent", Value::Int(0))
        );
        assert_eq!(
            md.path[1].get("value").unwrap(),
            &MetaAttr::constant("percent", Value::Int(100))
        );
        assert_eq!(md.path[1].get(MESSAGE).unwrap().owner, "percent");
    }

    #[test]
    fn test_circular_composition() {
        let mut extra = definition(
            "a",
            "marker",
            "",
            "[[definition.a.specify]]\ntarget = \"b\"\n",
        );
        extra.push_str(&definition(
            "b",
            "marker",
            "",
            "[[definition.b.specify]]\ntarget = \"a\"\n",
        ));
        let resolver = resolver(&extra);
        match root_cause(resolver.resolve("a").unwrap_err()) {
            VerdictError::CircularComposition { chain } => {
                assert_eq!(chain, vec!["a", "b", "a"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(resolver.cached_len(), 0);
    }

    #[test]
    fn test_marker_without_specification() {
        let resolver = resolver(&definition("empty", "marker", "", ""));
        assert!(matches!(
            root_cause(resolver.resolve("empty").unwrap_err()),
            VerdictError::MarkerWithoutSpecification(name) if name == "empty"
        ));
    }

    #[test]
    fn test_missing_required_attributes() {
        let resolver = resolver("[definition.bare]\nhandler = \"max\"\n[definition.bare.attributes]\nmessage = \"string\"\n");
        match root_cause(resolver.resolve("bare").unwrap_err()) {
            VerdictError::MissingRequiredAttributes { missing, .. } => {
                assert_eq!(missing, vec!["groups", "depth"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_specification() {
        let resolver = resolver(&definition(
            "loose",
            "marker",
            "",
            "[[definition.loose.specify]]\ntarget = \"max\"\n",
        ));
        assert!(matches!(
            root_cause(resolver.resolve("loose").unwrap_err()),
            VerdictError::MissingSpecification { definition, attribute }
                if definition == "max" && attribute == "value"
        ));
    }

    #[test]
    fn test_default_mode() {
        let resolver = resolver(&definition(
            "defaults",
            "marker",
            "",
            "[[definition.defaults.specify]]\ntarget = \"max\"\nattrs = [\"value\"]\n",
        ));
        assert!(matches!(
            root_cause(resolver.resolve("defaults").unwrap_err()),
            VerdictError::NoDefaultValue { attribute, .. } if attribute == "value"
        ));

        let resolver = self::resolver(&definition(
            "depths",
            "marker",
            "",
            "[[definition.depths.specify]]\ntarget = \"not_null\"\nattrs = [\"depth\"]\n",
        ));
        let md = resolver.resolve("depths").unwrap();
        assert_eq!(
            md.path[0].get(DEPTH).unwrap(),
            &MetaAttr::constant("depths", Value::from(""))
        );
    }

    #[test]
    fn test_expression_on_constant_is_rejected() {
        let resolver = resolver(&definition(
            "rebind",
            "marker",
            "",
            "[[definition.rebind.specify]]\ntarget = \"not_null\"\nattrs = [\"order = 3\"]\n",
        ));
        resolver.resolve("not_null").unwrap();
        let err = root_cause(resolver.resolve("rebind").unwrap_err());
        assert!(matches!(err, VerdictError::OrderingAttributeLocked(name) if name == "rebind"));

        let resolver = self::resolver(&definition(
            "rebind",
            "marker",
            "",
            "[[definition.rebind.specify]]\ntarget = \"not_null\"\nattrs = [\"order = 3\"]\n",
        ))
        .with_policy(OrderPolicy::Bindable);
        let err = root_cause(resolver.resolve("rebind").unwrap_err());
        assert!(matches!(err, VerdictError::AttributeAlreadyBound { attribute, .. } if attribute == "order"));
    }

    #[test]
    fn test_bindable_order() {
        let resolver = resolver(&definition(
            "ordered",
            "marker",
            "",
            "[[definition.ordered.specify]]\ntarget = \"max\"\nattrs = [\"value = 1\", \"order = 5\"]\n",
        ))
        .with_policy(OrderPolicy::Bindable);
        let md = resolver.resolve("ordered").unwrap();
        assert_eq!(
            md.path[0].get(ORDER).unwrap(),
            &MetaAttr::constant("ordered", Value::Int(5))
        );
    }

    #[test]
    fn test_self_override() {
        let resolver = resolver("");
        let md = resolver.resolve("not_null").unwrap();
        assert_eq!(
            md.attrs.get(ORDER).unwrap(),
            &MetaAttr::constant("not_null", Value::Int(i32::MIN as i64))
        );

        let resolver = self::resolver(&definition(
            "twice",
            "max",
            "",
            "[[definition.twice.specify]]\ntarget = \"twice\"\nattrs = [\"order = 1\"]\n",
        ));
        assert!(matches!(
            root_cause(resolver.resolve("twice").unwrap_err()),
            VerdictError::DuplicateAttribute { attribute, .. } if attribute == "order"
        ));

        let resolver = self::resolver(&definition(
            "aliased",
            "max",
            "",
            "[[definition.aliased.specify]]\ntarget = \"aliased\"\nattrs = [\"limit > order\"]\n",
        ));
        assert!(matches!(
            root_cause(resolver.resolve("aliased").unwrap_err()),
            VerdictError::SelfOverrideNotExpression { .. }
        ));
    }

    #[test]
    fn test_unknown_binding_and_target() {
        let resolver = resolver(&definition(
            "typo",
            "marker",
            "",
            "[[definition.typo.specify]]\ntarget = \"max\"\nattrs = [\"valu = 1\"]\n",
        ));
        assert!(matches!(
            root_cause(resolver.resolve("typo").unwrap_err()),
            VerdictError::MissingAttribute { definition, attribute }
                if definition == "max" && attribute == "valu"
        ));
        assert!(matches!(
            resolver.resolve("nope"),
            Err(VerdictError::UnknownDefinition(_))
        ));
    }

    #[test]
    fn test_reference_to_undeclared_attribute() {
        let resolver = resolver(&definition(
            "dangling",
            "marker",
            "",
            "[[definition.dangling.specify]]\ntarget = \"max\"\nattrs = [\"value > nope\"]\n",
        ));
        assert!(matches!(
            root_cause(resolver.resolve("dangling").unwrap_err()),
            VerdictError::MissingAttribute { definition, attribute }
                if definition == "dangling" && attribute == "nope"
        ));
    }

    #[test]
    fn test_failed_expression_names_specification() {
        let resolver = resolver(&definition(
            "broken",
            "marker",
            "",
            "[[definition.broken.specify]]\ntarget = \"max\"\nattrs = [\"value = 1 +\"]\n",
        ));
        let err = resolver.resolve("broken").unwrap_err();

        let mut contexts = Vec::new();
        let mut current = &err;
        while let VerdictError::Context { context, source } = current {
            contexts.push(context.clone());
            current = source;
        }
        assert!(contexts.contains(&"in specification of `max` by `broken`".to_string()));
        assert!(matches!(current, VerdictError::ExpressionError { expr, .. } if expr == "1 +"));
        assert_eq!(resolver.cached_len(), 0);
    }

    #[test]
    fn test_default_binding_of_constant_is_owned_by_composer() {
        let resolver = resolver(&definition(
            "early",
            "marker",
            "",
            "[[definition.early.specify]]\ntarget = \"not_null\"\nattrs = [\"order\"]\n",
        ))
        .with_policy(OrderPolicy::Bindable);
        let md = resolver.resolve("early").unwrap();
        assert_eq!(
            md.path[0].get(ORDER).unwrap(),
            &MetaAttr::constant("early", Value::Int(i32::MIN as i64))
        );
    }

    #[test]
    fn test_resolution_is_cached_and_resettable() {
        let resolver = resolver("");
        let first = resolver.resolve("range").unwrap();
        assert_eq!(resolver.cached_len(), 3);
        assert!(Arc::ptr_eq(&first, &resolver.resolve("range").unwrap()));

        resolver.reset();
        assert_eq!(resolver.cached_len(), 0);
        let second = resolver.resolve("range").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }
}
