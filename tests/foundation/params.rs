//! Integration tests for keyword-parameter overlays
//!
//! Tests declared defaults, persistence, equality, and collection membership.

use std::sync::Arc;

use termcore_foundation::{
    ConstructorType, ErrorKind, FactoryConfig, Type, Value, ValueFactory,
};

fn call() -> Arc<ConstructorType> {
    Arc::new(
        ConstructorType::new("Expr", "call", vec![Type::Str])
            .with_keyword_parameter("src", Type::Str, Value::from("unknown"))
            .with_keyword_parameter("pure", Type::Bool, Value::Bool(false)),
    )
}

#[test]
fn defaults_come_from_declaration() {
    let factory = ValueFactory::new();
    let value = factory.constructor(&call(), vec![Value::from("f")]).unwrap();
    let overlay = value.keyword_parameters();
    assert_eq!(overlay.get_parameter("pure").unwrap(), Value::Bool(false));
    assert!(!overlay.has_parameters());

    let names: Vec<String> = overlay.parameter_names().iter().map(|n| n.to_string()).collect();
    assert_eq!(names, vec!["pure", "src"]);
}

#[test]
fn undeclared_label_is_missing() {
    let factory = ValueFactory::new();
    let value = factory.constructor(&call(), vec![Value::from("f")]).unwrap();
    let err = value.keyword_parameters().get_parameter("nope").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MissingParameter(_)));
}

#[test]
fn updates_are_persistent() {
    let factory = ValueFactory::new();
    let base = factory.overlay(factory.node("f", vec![]));
    let one = base.set_parameter("a", Value::Int(1));
    let two = one.set_parameter("a", Value::Int(2));
    let none = two.unset_parameter("a");

    assert!(!base.has_parameter("a"));
    assert_eq!(one.get_parameter("a").unwrap(), Value::Int(1));
    assert_eq!(two.get_parameter("a").unwrap(), Value::Int(2));
    assert!(!none.has_parameters());
    assert_eq!(none.into_value(), factory.node("f", vec![]));
}

#[test]
fn overlaid_values_as_set_elements() {
    let strict = ValueFactory::new();
    let semantic = ValueFactory::from_config(&FactoryConfig::semantic());
    let annotate = |factory: &ValueFactory, n: i64| {
        factory
            .overlay(factory.node("leaf", vec![Value::Int(n)]))
            .set_parameter("line", Value::Int(n * 10))
            .into_value()
    };

    let values = [annotate(&strict, 1), strict.node("leaf", vec![Value::Int(1)])];
    assert_eq!(strict.set(values.clone()).len(), 2);
    assert_eq!(semantic.set(values).len(), 1);
}

#[test]
fn rendering_shows_parameters() {
    let factory = ValueFactory::new();
    let value = factory
        .overlay(factory.node("f", vec![Value::Int(1)]))
        .set_parameters([("z", Value::Int(3)), ("a", Value::Int(1))])
        .into_value();
    assert_eq!(value.to_string(), "f(1,a=1,z=3)");
}
