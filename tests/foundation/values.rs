//! Integration tests for the Value type
//!
//! Tests value construction, typing, equality, hashing, and rendering.

use std::collections::HashSet;
use std::sync::Arc;

use termcore_foundation::{ConstructorType, ErrorKind, Type, Value, ValueFactory};

fn circle() -> Arc<ConstructorType> {
    Arc::new(ConstructorType::new("Shape", "circle", vec![Type::Int]))
}

fn square() -> Arc<ConstructorType> {
    Arc::new(ConstructorType::new("Shape", "square", vec![Type::Int, Type::Int]))
}

// =============================================================================
// Construction and Types
// =============================================================================

#[test]
fn scalar_types() {
    assert_eq!(Value::Bool(true).value_type(), Type::Bool);
    assert_eq!(Value::Int(1).value_type(), Type::Int);
    assert_eq!(Value::Real(1.0).value_type(), Type::Real);
    assert_eq!(Value::from("s").value_type(), Type::Str);
}

#[test]
fn tuple_type_follows_fields() {
    let factory = ValueFactory::new();
    let tuple = factory.tuple(vec![Value::Int(1), Value::from("a")]);
    assert_eq!(tuple.value_type(), Type::tuple(vec![Type::Int, Type::Str]));
    assert_eq!(tuple.as_tuple().map(<[Value]>::len), Some(2));
}

#[test]
fn constructor_checks_arity_and_fields() {
    let factory = ValueFactory::new();
    let ok = factory.constructor(&circle(), vec![Value::Int(3)]).unwrap();
    assert_eq!(ok.as_node().unwrap().name(), "circle");

    let err = factory.constructor(&circle(), vec![]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ArityMismatch { expected: 1, actual: 0 }));

    let err = factory
        .constructor(&square(), vec![Value::Int(1), Value::from("x")])
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
    assert_eq!(err.context.unwrap().index, Some(1));
}

#[test]
fn sets_of_constructors_infer_adt() {
    let factory = ValueFactory::new();
    let shapes = factory.set([
        factory.constructor(&circle(), vec![Value::Int(1)]).unwrap(),
        factory.constructor(&square(), vec![Value::Int(1), Value::Int(2)]).unwrap(),
    ]);
    assert_eq!(shapes.element_type(), &Type::adt("Shape"));

    let with_node = shapes.insert(factory.node("other", vec![])).unwrap();
    assert_eq!(with_node.element_type(), &Type::Node);
}

// =============================================================================
// Equality and Hashing
// =============================================================================

#[test]
fn reals_compare_bitwise() {
    assert_eq!(Value::Real(f64::NAN), Value::Real(f64::NAN));
    assert_ne!(Value::Real(0.0), Value::Real(-0.0));
    assert_ne!(Value::Int(1), Value::Real(1.0));
}

#[test]
fn nested_collections_hash_consistently() {
    let factory = ValueFactory::new();
    let a = Value::Set(factory.set([
        Value::Set(factory.set([Value::Int(1), Value::Int(2)])),
        Value::Int(3),
    ]));
    let b = Value::Set(factory.set([
        Value::Int(3),
        Value::Set(factory.set([Value::Int(2), Value::Int(1)])),
    ]));
    assert_eq!(a, b);

    let mut seen = HashSet::new();
    seen.insert(a);
    assert!(seen.contains(&b));
}

#[test]
fn overlays_count_in_strict_equality() {
    let factory = ValueFactory::new();
    let plain = factory.node("f", vec![Value::Int(1)]);
    let tagged = factory
        .overlay(plain.clone())
        .set_parameter("x", Value::Int(2))
        .into_value();
    assert_ne!(plain, tagged);
    assert_eq!(tagged.content(), &plain);
    assert_eq!(tagged.value_type(), Type::Node);
    assert_eq!(tagged.as_node().map(|n| n.arity()), Some(1));
}

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn display_nested_values() {
    let factory = ValueFactory::new();
    let value = factory.node(
        "call",
        vec![
            factory.tuple(vec![Value::Int(1), Value::Bool(false)]),
            Value::Set(factory.set([Value::from("a")])),
        ],
    );
    assert_eq!(value.to_string(), r#"call(<1,false>,{"a"})"#);
    assert_eq!(format!("{value:?}"), value.to_string());
}
