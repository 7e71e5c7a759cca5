//! End-to-end scenarios over the public API

use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use verdict_constraint::{
    builtin_messages, Analyzer, DefinitionRegistry, HandlerRegistry, ModelValidator, OrderPolicy,
    Resolver, ORDER,
};
use verdict_core::{Declaration, LiteralEvaluator, MessageCatalog, Value, ValueShape, VerdictError};
use verdict_schema::{GroupRegistry, SchemaRegistry};

const COMMON_ATTRS: &str = r#"
message = { type = "string", default = "{v.composed}" }
groups = { type = "list<type>", default = [] }
depth = { type = "string", default = "" }
order = { type = "i32", default = 0 }
"#;

fn resolver_with(extra: &str) -> Resolver {
    let mut definitions = DefinitionRegistry::builtin().unwrap();
    definitions.load_string(extra).unwrap();
    Resolver::new(definitions, Arc::new(LiteralEvaluator))
}

fn positive_max() -> String {
    format!(
        r#"
[definition.positive_max]
handler = "marker"

[definition.positive_max.attributes]
{COMMON_ATTRS}

[[definition.positive_max.specify]]
target = "max"
order = 1
attrs = ["value = 100"]

[[definition.positive_max.specify]]
target = "min"
order = -1
attrs = ["value = 1"]
"#
    )
}

#[test]
fn not_null_without_catalog_keeps_raw_message() {
    let resolver = resolver_with("");
    let handlers = HandlerRegistry::builtin();
    let groups = GroupRegistry::new();
    let analyzer = Analyzer::new(&resolver, &handlers, &groups);

    let criteria = analyzer
        .analyze(
            "User.email",
            &ValueShape::optional(ValueShape::String),
            &[Declaration::new("not_null").with("message", "{v.not_null}")],
        )
        .unwrap();
    assert_eq!(criteria.len(), 1);
    assert_eq!(criteria[0].groups(), ["Default".to_string()]);

    let violation = criteria[0].test(&Value::Null).unwrap().unwrap();
    assert_eq!(violation.message, "{v.not_null}");
    assert_eq!(violation.position, "User.email");
}

#[test]
fn max_violation_reports_position_and_value() {
    let resolver = resolver_with("");
    let handlers = HandlerRegistry::builtin();
    let groups = GroupRegistry::new();
    let catalog: Arc<dyn MessageCatalog> = Arc::new(builtin_messages().unwrap());
    let analyzer = Analyzer::new(&resolver, &handlers, &groups).with_catalog(catalog);

    let criteria = analyzer
        .analyze(
            "Order.amount",
            &ValueShape::I64,
            &[Declaration::new("max").with("value", 10i64)],
        )
        .unwrap();
    let violation = criteria[0].test(&Value::Int(15)).unwrap().unwrap();
    assert_eq!(violation.position, "Order.amount");
    assert!(violation.message.contains("15"));
    assert_eq!(violation.message, "Order.amount must be at most 10, got 15");
}

#[test]
fn marker_path_follows_specification_order() {
    let resolver = resolver_with(&positive_max());
    let md = resolver.resolve("positive_max").unwrap();
    assert!(md.is_marker());
    assert_eq!(md.path_owners(), vec!["min", "max"]);
    assert_eq!(md.path[0].get("value").unwrap().default_value(), Some(&Value::Int(1)));
    assert_eq!(md.path[1].get("value").unwrap().default_value(), Some(&Value::Int(100)));

    let handlers = HandlerRegistry::builtin();
    let groups = GroupRegistry::new();
    let analyzer = Analyzer::new(&resolver, &handlers, &groups);
    let criteria = analyzer
        .analyze("Order.amount", &ValueShape::I32, &[Declaration::new("positive_max")])
        .unwrap();
    assert_eq!(criteria.len(), 2);
    assert!(criteria[0].test(&Value::Int(0)).unwrap().is_some());
    assert!(criteria[1].test(&Value::Int(0)).unwrap().is_none());
    assert!(criteria[1].test(&Value::Int(101)).unwrap().is_some());
}

#[test]
fn cycle_reports_repeated_definition_at_both_ends() {
    let extra = format!(
        r#"
[definition.outer]
handler = "marker"
[definition.outer.attributes]
{COMMON_ATTRS}
[[definition.outer.specify]]
target = "ping"

[definition.ping]
handler = "marker"
[definition.ping.attributes]
{COMMON_ATTRS}
[[definition.ping.specify]]
target = "pong"

[definition.pong]
handler = "marker"
[definition.pong.attributes]
{COMMON_ATTRS}
[[definition.pong.specify]]
target = "ping"
"#
    );
    let resolver = resolver_with(&extra);

    for (name, start) in [("ping", "ping"), ("outer", "ping")] {
        let err = resolver.resolve(name).unwrap_err();
        match err.root_cause() {
            VerdictError::CircularComposition { chain } => {
                let first = chain.iter().position(|n| n == start).unwrap();
                assert_eq!(chain.last().map(String::as_str), Some(start));
                assert_ne!(first, chain.len() - 1);
            }
            other => panic!("expected a cycle, got {other}"),
        }
    }
    assert_eq!(resolver.cached_len(), 0);
}

#[test]
fn resolution_is_idempotent_across_reset() {
    let resolver = resolver_with(&positive_max());
    let first = resolver.resolve("positive_max").unwrap();
    let again = resolver.resolve("positive_max").unwrap();
    assert!(Arc::ptr_eq(&first, &again));

    resolver.reset();
    assert_eq!(resolver.cached_len(), 0);
    let rebuilt = resolver.resolve("positive_max").unwrap();
    assert!(!Arc::ptr_eq(&first, &rebuilt));
    assert_eq!(*first, *rebuilt);
}

#[test]
fn concurrent_first_resolution_publishes_once() {
    let resolver = resolver_with(&positive_max());

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| resolver.resolve("positive_max").unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for md in &results[1..] {
        assert!(Arc::ptr_eq(&results[0], md));
    }
    // positive_max, min and max
    assert_eq!(resolver.cached_len(), 3);
}

#[test]
fn order_policy_controls_explicit_order_bindings() {
    let extra = format!(
        r#"
[definition.late_max]
handler = "marker"
[definition.late_max.attributes]
{COMMON_ATTRS}
[[definition.late_max.specify]]
target = "max"
attrs = ["value = 3", "order = 5"]
"#
    );

    let locked = resolver_with(&extra);
    let err = locked.resolve("late_max").unwrap_err();
    assert!(matches!(err.root_cause(), VerdictError::OrderingAttributeLocked(_)));

    let bindable = resolver_with(&extra).with_policy(OrderPolicy::Bindable);
    let md = bindable.resolve("late_max").unwrap();
    assert_eq!(md.path[0].get(ORDER).unwrap().default_value(), Some(&Value::Int(5)));
}

#[test]
fn validator_reports_nested_violations() {
    let mut schemas = SchemaRegistry::new();
    schemas
        .load_model_string(
            r#"
[model.Inventory.fields.stock]
shape = "option<map<string, i32>>"

[[model.Inventory.fields.stock.constraint]]
type = "min"
value = 0
depth = "v"

[[model.Inventory.fields.stock.constraint]]
type = "not_null"
"#,
        )
        .unwrap();

    let resolver = resolver_with("");
    let handlers = HandlerRegistry::builtin();
    let catalog: Arc<dyn MessageCatalog> = Arc::new(builtin_messages().unwrap());
    let analyzer = Analyzer::new(&resolver, &handlers, schemas.groups()).with_catalog(catalog);
    let validator = ModelValidator::compile(&analyzer, &schemas).unwrap();

    let stock = Value::Map(vec![
        (Value::from("bolts"), Value::Int(4)),
        (Value::from("nuts"), Value::Int(-2)),
    ]);
    let instance: BTreeMap<String, Value> = [("stock".to_string(), stock)].into_iter().collect();
    let report = validator.validate("Inventory", &instance, &[]).unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report.violations[0].position, "Inventory.stock.v");
    assert_eq!(
        report.violations[0].message,
        "Inventory.stock.v must be at least 0, got -2"
    );

    let report = validator.validate("Inventory", &BTreeMap::new(), &[]).unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report.violations[0].constraint, "not_null");
}

proptest! {
    #[test]
    fn path_length_counts_self_and_specifications(
        inner_specs in 0usize..4,
        outer_specs in 1usize..4,
        inner_marker in any::<bool>(),
    ) {
        prop_assume!(!(inner_marker && inner_specs == 0));

        let mut extra = format!(
            "[definition.inner]\nhandler = \"{}\"\n[definition.inner.attributes]\n{}value = {{ type = \"i64\", default = 1 }}\n",
            if inner_marker { "marker" } else { "max" },
            COMMON_ATTRS,
        );
        for i in 0..inner_specs {
            let target = if i % 2 == 0 { "min" } else { "max" };
            extra.push_str(&format!(
                "[[definition.inner.specify]]\ntarget = \"{}\"\norder = {}\nattrs = [\"value = {}\"]\n",
                target,
                i as i64 - 1,
                i
            ));
        }
        extra.push_str(&format!("[definition.outer]\nhandler = \"marker\"\n[definition.outer.attributes]\n{}", COMMON_ATTRS));
        for _ in 0..outer_specs {
            extra.push_str("[[definition.outer.specify]]\ntarget = \"inner\"\nattrs = [\"value\"]\n");
        }

        let resolver = resolver_with(&extra);
        let inner = resolver.resolve("inner").unwrap();
        let own = usize::from(!inner_marker);
        prop_assert_eq!(inner.path.len(), own + inner_specs);

        let outer = resolver.resolve("outer").unwrap();
        prop_assert_eq!(outer.path.len(), outer_specs * inner.path.len());
    }
}
