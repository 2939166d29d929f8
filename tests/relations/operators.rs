//! Integration tests for relational operators
//!
//! Tests domain, range, inverse, composition, closure, and projection.

use termcore_foundation::{ErrorKind, TcSet, Value, ValueFactory};
use termcore_relations::{
    arity, closure, compose, domain, image, inverse, project, range, reflexive_closure,
};

fn rel(factory: &ValueFactory, pairs: &[(&str, &str)]) -> TcSet {
    factory.set(
        pairs
            .iter()
            .map(|&(a, b)| factory.tuple(vec![Value::from(a), Value::from(b)])),
    )
}

fn strs(factory: &ValueFactory, values: &[&str]) -> TcSet {
    factory.set(values.iter().map(|&s| Value::from(s)))
}

// =============================================================================
// Call Graph
// =============================================================================

fn calls(factory: &ValueFactory) -> TcSet {
    rel(
        factory,
        &[("main", "parse"), ("parse", "lex"), ("main", "eval"), ("eval", "eval")],
    )
}

#[test]
fn callers_and_callees() {
    let factory = ValueFactory::new();
    let graph = calls(&factory);
    assert_eq!(
        domain(&factory, &graph).unwrap(),
        strs(&factory, &["main", "parse", "eval"])
    );
    assert_eq!(
        range(&factory, &graph).unwrap(),
        strs(&factory, &["parse", "lex", "eval"])
    );
    assert_eq!(arity(&graph).unwrap(), Some(2));
}

#[test]
fn reachability() {
    let factory = ValueFactory::new();
    let graph = calls(&factory);
    let reach = closure(&factory, &graph).unwrap();
    assert_eq!(
        image(&factory, &reach, &Value::from("main")).unwrap(),
        strs(&factory, &["parse", "lex", "eval"])
    );

    let reflexive = reflexive_closure(&factory, &graph).unwrap();
    assert!(reflexive.contains(&factory.tuple(vec![Value::from("lex"), Value::from("lex")])));
    assert!(reach.is_subset(&reflexive));
}

#[test]
fn callers_of_via_inverse() {
    let factory = ValueFactory::new();
    let callers = inverse(&factory, &calls(&factory)).unwrap();
    assert_eq!(
        image(&factory, &callers, &Value::from("eval")).unwrap(),
        strs(&factory, &["main", "eval"])
    );
}

#[test]
fn two_step_calls() {
    let factory = ValueFactory::new();
    let graph = calls(&factory);
    let two = compose(&factory, &graph, &graph).unwrap();
    assert_eq!(
        two,
        rel(&factory, &[("main", "lex"), ("main", "eval"), ("eval", "eval")])
    );
}

// =============================================================================
// Projection and Errors
// =============================================================================

#[test]
fn project_ternary() {
    let factory = ValueFactory::new();
    let facts = factory.set([
        factory.tuple(vec![Value::from("a"), Value::Int(1), Value::Bool(true)]),
        factory.tuple(vec![Value::from("b"), Value::Int(1), Value::Bool(false)]),
    ]);
    assert_eq!(arity(&facts).unwrap(), Some(3));
    assert_eq!(project(&factory, &facts, &[1]).unwrap().len(), 1);
    assert_eq!(project(&factory, &facts, &[0, 2]).unwrap().len(), 2);
}

#[test]
fn ternary_is_not_binary() {
    let factory = ValueFactory::new();
    let facts = factory.set([factory.tuple(vec![Value::Int(1), Value::Int(2), Value::Int(3)])]);
    let err = compose(&factory, &facts, &facts).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ArityMismatch { expected: 2, actual: 3 }));
    assert_eq!(err.context.unwrap().operation.as_deref(), Some("compose"));
}

#[test]
fn empty_relations() {
    let factory = ValueFactory::new();
    let empty = factory.empty_set();
    assert!(closure(&factory, &empty).unwrap().is_empty());
    assert!(domain(&factory, &empty).unwrap().is_empty());
    assert!(project(&factory, &empty, &[5]).unwrap().is_empty());
    assert_eq!(arity(&empty).unwrap(), None);
}
