//! Integration tests for transient builders
//!
//! Tests finalize memoization, snapshots, atomic batches, and build stats.

use termcore_foundation::{ErrorKind, FactoryConfig, Type, Value, ValueFactory};

// =============================================================================
// SetBuilder
// =============================================================================

#[test]
fn set_builder_basic() {
    let factory = ValueFactory::new();
    let mut builder = factory.set_builder();
    assert!(builder.is_empty());
    assert!(builder.insert(Value::Int(1)).unwrap());
    assert!(!builder.insert(Value::Int(1)).unwrap());
    assert!(builder.insert(Value::Int(2)).unwrap());
    assert_eq!(builder.len(), 2);
    assert!(builder.contains(&Value::Int(2)));

    let set = builder.build();
    assert_eq!(set.len(), 2);
    assert_eq!(set.element_type(), &Type::Int);
}

#[test]
fn finalize_is_memoized() {
    let factory = ValueFactory::new();
    let mut builder = factory.set_builder();
    builder.insert(Value::Int(1)).unwrap();

    let first = builder.finalize();
    let second = builder.finalize();
    assert!(first.ptr_eq(&second));
    assert!(builder.is_finalized());
}

#[test]
fn finalized_builder_rejects_mutation() {
    let factory = ValueFactory::new();
    let mut builder = factory.set_builder();
    builder.insert(Value::Int(1)).unwrap();
    let set = builder.finalize();

    for err in [
        builder.insert(Value::Int(2)).unwrap_err(),
        builder.remove(&Value::Int(1)).unwrap_err(),
        builder.insert_all([Value::Int(3)]).unwrap_err(),
    ] {
        assert!(matches!(err.kind, ErrorKind::FinalizedMutation));
    }
    assert_eq!(set.len(), 1);
    assert_eq!(builder.len(), 1);
}

#[test]
fn snapshot_is_isolated() {
    let factory = ValueFactory::new();
    let mut builder = factory.set_builder();
    for i in 0..100 {
        builder.insert(Value::Int(i)).unwrap();
    }
    let snapshot = builder.snapshot();
    for i in 100..200 {
        builder.insert(Value::Int(i)).unwrap();
    }
    builder.remove(&Value::Int(0)).unwrap();

    assert_eq!(snapshot.len(), 100);
    assert!(snapshot.contains(&Value::Int(0)));
    assert!(!snapshot.contains(&Value::Int(150)));
    assert_eq!(builder.len(), 199);
}

#[test]
fn builder_from_set_leaves_source_intact() {
    let factory = ValueFactory::new();
    let source = factory.set((0..64).map(Value::Int));
    let mut builder = source.to_builder();
    builder.insert(Value::Int(1000)).unwrap();
    builder.remove(&Value::Int(5)).unwrap();

    let derived = builder.build();
    assert_eq!(source.len(), 64);
    assert!(source.contains(&Value::Int(5)));
    assert!(!derived.contains(&Value::Int(5)));
    assert!(derived.contains(&Value::Int(1000)));
}

#[test]
fn insert_all_is_atomic() {
    let factory = ValueFactory::new();
    let mut builder = factory.set_builder_of(Type::Int);
    builder.insert(Value::Int(0)).unwrap();

    let err = builder
        .insert_all([Value::Int(1), Value::Int(2), Value::from("three")])
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
    let context = err.context.unwrap();
    assert_eq!(context.index, Some(2));
    assert_eq!(context.operation.as_deref(), Some("insert_all"));

    assert_eq!(builder.len(), 1);
    assert!(!builder.contains(&Value::Int(1)));
}

#[test]
fn insert_all_counts_new_elements() {
    let factory = ValueFactory::new();
    let mut builder = factory.set_builder();
    builder.insert(Value::Int(1)).unwrap();
    let added = builder
        .insert_all([Value::Int(1), Value::Int(2), Value::Int(3)])
        .unwrap();
    assert_eq!(added, 2);
}

#[test]
fn rejected_insert_keeps_inferred_type() {
    let factory = ValueFactory::new();
    let mut builder = factory.set_builder_of(Type::Num);
    builder.insert(Value::Int(1)).unwrap();
    builder.insert(Value::Real(1.5)).unwrap();
    assert!(builder.insert(Value::Bool(true)).is_err());
    assert_eq!(builder.element_type(), &Type::Num);
}

// =============================================================================
// Build stats
// =============================================================================

#[test]
fn stats_are_opt_in() {
    let factory = ValueFactory::new();
    let builder = factory.set_builder();
    assert!(builder.stats().is_none());

    let debug = ValueFactory::from_config(&FactoryConfig::debug());
    assert!(debug.set_builder().stats().is_some());
}

#[test]
fn exclusive_nodes_are_updated_in_place() {
    let factory = ValueFactory::from_config(&FactoryConfig::debug());
    let mut builder = factory.set_builder();
    for i in 0..500 {
        builder.insert(Value::Int(i)).unwrap();
    }
    let stats = builder.stats().unwrap();
    assert_eq!(stats.inserted, 500);
    assert_eq!(stats.copied, 0);
    assert!(stats.in_place > 0);
}

#[test]
fn shared_nodes_are_copied_once() {
    let factory = ValueFactory::from_config(&FactoryConfig::debug());
    let source = factory.set((0..500).map(Value::Int));
    let mut builder = source.to_builder();
    builder.insert(Value::Int(1000)).unwrap();
    let after_first = builder.stats().unwrap();
    assert!(after_first.copied > 0);

    builder.insert(Value::Int(1000)).unwrap();
    builder.insert(Value::Int(1001)).unwrap();
    let after_more = builder.stats().unwrap();
    assert!(after_more.in_place > after_first.in_place);
    assert!(after_more.to_string().contains("inserted"));
}

#[test]
fn rejected_elements_are_counted() {
    let factory = ValueFactory::from_config(&FactoryConfig::debug());
    let mut builder = factory.set_builder_of(Type::Str);
    assert!(builder.insert(Value::Int(1)).is_err());
    assert_eq!(builder.stats().unwrap().rejected, 1);
}

// =============================================================================
// MapBuilder
// =============================================================================

#[test]
fn map_builder_overwrites() {
    let factory = ValueFactory::new();
    let mut builder = factory.map_builder();
    assert_eq!(builder.insert(Value::from("k"), Value::Int(1)).unwrap(), None);
    assert_eq!(
        builder.insert(Value::from("k"), Value::Int(2)).unwrap(),
        Some(Value::Int(1))
    );
    assert_eq!(builder.get(&Value::from("k")), Some(&Value::Int(2)));
    assert_eq!(builder.len(), 1);

    let map = builder.build();
    assert_eq!(map.get(&Value::from("k")), Some(&Value::Int(2)));
}

#[test]
fn map_builder_insert_all_is_atomic() {
    let factory = ValueFactory::new();
    let mut builder = factory.map_builder_of(Type::Str, Type::Int);
    let err = builder
        .insert_all([
            (Value::from("a"), Value::Int(1)),
            (Value::from("b"), Value::from("not an int")),
        ])
        .unwrap_err();
    assert_eq!(err.context.unwrap().index, Some(1));
    assert!(builder.is_empty());
}

#[test]
fn map_builder_finalize() {
    let factory = ValueFactory::new();
    let mut builder = factory.map_builder();
    builder.insert(Value::Int(1), Value::Int(2)).unwrap();
    let first = builder.finalize();
    assert!(first.ptr_eq(&builder.finalize()));
    assert!(builder.insert(Value::Int(3), Value::Int(4)).is_err());
    assert!(builder.remove(&Value::Int(1)).is_err());
}

#[test]
fn map_builder_remove_resets_inferred_types() {
    let factory = ValueFactory::new();
    let mut builder = factory.map_builder();
    builder.insert(Value::Int(1), Value::from("x")).unwrap();
    assert_eq!(builder.remove(&Value::Int(1)).unwrap(), Some(Value::from("x")));
    let map = builder.build();
    assert!(map.is_empty());
    assert_eq!(map.key_type(), &Type::Void);
    assert_eq!(map.value_type(), &Type::Void);
}
