//! Integration tests for persistent collections
//!
//! Tests TcSet and TcMap persistence, merges, type inference, and policies.

use std::sync::Arc;

use termcore_foundation::{
    Equivalence, ErrorKind, FactoryConfig, TcMap, TcSet, Type, Value, ValueFactory,
};

/// Equality with every value hashing to the same bucket.
#[derive(Debug)]
struct OneBucket;

impl Equivalence for OneBucket {
    fn equivalent(&self, a: &Value, b: &Value) -> bool {
        a == b
    }

    fn hash(&self, _value: &Value) -> u64 {
        0
    }

    fn name(&self) -> &'static str {
        "one-bucket"
    }
}

fn ints(factory: &ValueFactory, range: std::ops::Range<i64>) -> TcSet {
    factory.set(range.map(Value::Int))
}

// =============================================================================
// TcSet
// =============================================================================

#[test]
fn set_empty() {
    let factory = ValueFactory::new();
    let set = factory.empty_set();
    assert!(set.is_empty());
    assert_eq!(set.len(), 0);
    assert_eq!(set.element_type(), &Type::Void);
    assert!(!set.contains(&Value::Int(1)));
}

#[test]
fn set_insert_is_persistent() {
    let factory = ValueFactory::new();
    let s1 = factory.set([Value::Int(1)]);
    let s2 = s1.insert(Value::Int(2)).unwrap();

    assert_eq!(s1.len(), 1);
    assert_eq!(s2.len(), 2);
    assert!(!s1.contains(&Value::Int(2)));
    assert!(s2.contains(&Value::Int(2)));
}

#[test]
fn set_duplicate_insert_is_noop() {
    let factory = ValueFactory::new();
    let s1 = factory.set([Value::Int(1)]);
    let s2 = s1.insert(Value::Int(1)).unwrap();
    assert!(s1.ptr_eq(&s2));
}

#[test]
fn set_remove_absent_is_noop() {
    let factory = ValueFactory::new();
    let s1 = ints(&factory, 0..10);
    let s2 = s1.remove(&Value::Int(99));
    assert!(s1.ptr_eq(&s2));
}

#[test]
fn set_large_insert_and_remove() {
    let factory = ValueFactory::new();
    let mut set = factory.empty_set();
    for i in 0..5000 {
        set = set.insert(Value::Int(i)).unwrap();
    }
    assert_eq!(set.len(), 5000);
    assert_eq!(set.iter().count(), 5000);

    for i in (0..5000).step_by(2) {
        set = set.remove(&Value::Int(i));
    }
    assert_eq!(set.len(), 2500);
    assert!(set.contains(&Value::Int(1)));
    assert!(!set.contains(&Value::Int(2)));
}

#[test]
fn set_element_type_widens() {
    let factory = ValueFactory::new();
    let set = factory.set([Value::Int(1)]);
    assert_eq!(set.element_type(), &Type::Int);
    let set = set.insert(Value::Real(2.0)).unwrap();
    assert_eq!(set.element_type(), &Type::Num);
    let set = set.insert(Value::from("x")).unwrap();
    assert_eq!(set.element_type(), &Type::Value);
}

#[test]
fn set_inferred_type_resets_when_emptied() {
    let factory = ValueFactory::new();
    let set = factory.set([Value::Int(1)]).remove(&Value::Int(1));
    assert!(set.is_empty());
    assert_eq!(set.element_type(), &Type::Void);
}

#[test]
fn set_declared_type_rejects() {
    let factory = ValueFactory::new();
    let set = factory.empty_set_of(Type::Int);
    let err = set.insert(Value::from("x")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
    assert!(set.is_type_declared());
    assert!(set.remove(&Value::Int(1)).is_type_declared());
}

#[test]
fn set_union_intersection_difference() {
    let factory = ValueFactory::new();
    let a = ints(&factory, 0..100);
    let b = ints(&factory, 50..150);

    let union = a.union(&b).unwrap();
    assert_eq!(union, ints(&factory, 0..150));

    let both = a.intersection(&b);
    assert_eq!(both, ints(&factory, 50..100));

    let only_a = a.difference(&b);
    assert_eq!(only_a, ints(&factory, 0..50));

    assert!(both.is_subset(&a));
    assert!(both.is_subset(&b));
    assert!(!a.is_subset(&b));
}

#[test]
fn set_union_with_self_is_shared() {
    let factory = ValueFactory::new();
    let a = ints(&factory, 0..100);
    assert!(a.union(&a).unwrap().ptr_eq(&a));
}

#[test]
fn set_union_declared_rejects_wider() {
    let factory = ValueFactory::new();
    let declared = factory.set_of(Type::Int, [Value::Int(1)]).unwrap();
    let strings = factory.set([Value::from("a")]);
    assert!(declared.union(&strings).is_err());
    assert!(strings.union(&declared).is_ok());
}

#[test]
fn set_colliding_hashes() {
    let factory = ValueFactory::new().with_equivalence(Arc::new(OneBucket));
    let mut set = factory.empty_set();
    for i in 0..50 {
        set = set.insert(Value::Int(i)).unwrap();
    }
    assert_eq!(set.len(), 50);
    for i in 0..50 {
        assert!(set.contains(&Value::Int(i)));
    }
    let set = set.remove(&Value::Int(7));
    assert_eq!(set.len(), 49);
    assert!(!set.contains(&Value::Int(7)));
}

#[test]
fn set_merge_across_policies() {
    let strict = ValueFactory::new();
    let bucket = ValueFactory::new().with_equivalence(Arc::new(OneBucket));
    let a = ints(&strict, 0..20);
    let b = ints(&bucket, 10..30);

    let union = a.union(&b).unwrap();
    assert_eq!(union.len(), 30);
    assert_eq!(a.intersection(&b).len(), 10);
    assert_eq!(a.difference(&b).len(), 10);
    assert_eq!(union.factory().equivalence().name(), "strict");
}

#[test]
fn set_equality_ignores_insertion_order() {
    let factory = ValueFactory::new();
    let forward = factory.set((0..200).map(Value::Int));
    let backward = factory.set((0..200).rev().map(Value::Int));
    assert_eq!(forward, backward);
    assert_eq!(Value::Set(forward), Value::Set(backward));
}

#[test]
fn semantic_set_merges_annotated_values() {
    let factory = ValueFactory::from_config(&FactoryConfig::semantic());
    let plain = Value::Int(1);
    let tagged = factory
        .overlay(Value::Int(1))
        .set_parameter("origin", Value::from("parser"))
        .into_value();

    let set = factory.set([plain.clone()]);
    let same = set.insert(tagged.clone()).unwrap();
    assert_eq!(same.len(), 1);
    assert!(same.contains(&tagged));

    let strict = ValueFactory::new().set([plain, tagged]);
    assert_eq!(strict.len(), 2);
}

#[test]
fn semantic_set_collapses_sets_with_repeated_classes() {
    let strict = ValueFactory::new();
    let semantic = ValueFactory::from_config(&FactoryConfig::semantic());
    let tag = |text: &str, n: i64| {
        strict
            .overlay(Value::from(text))
            .set_parameter("t", Value::Int(n))
            .into_value()
    };
    let x = strict.set([tag("a", 1), tag("a", 2), Value::from("b")]);
    let y = strict.set([Value::from("a"), tag("b", 1), tag("b", 2)]);
    let outer = semantic.set([Value::Set(x), Value::Set(y)]);
    assert_eq!(outer.len(), 1);
}

#[test]
fn semantic_set_remove_finds_annotated_element() {
    let factory = ValueFactory::from_config(&FactoryConfig::semantic());
    let tagged = factory
        .overlay(Value::Int(1))
        .set_parameter("origin", Value::from("parser"))
        .into_value();
    let set = factory.set([tagged, Value::Int(2)]);
    let smaller = set.remove(&Value::Int(1));
    assert_eq!(smaller.len(), 1);
    assert!(!smaller.contains(&Value::Int(1)));
    assert_eq!(set.len(), 2);
}

// =============================================================================
// TcMap
// =============================================================================

#[test]
fn map_insert_and_get() {
    let factory = ValueFactory::new();
    let m1 = factory.empty_map();
    let m2 = m1.insert(Value::from("a"), Value::Int(1)).unwrap();
    let m3 = m2.insert(Value::from("a"), Value::Int(2)).unwrap();

    assert!(m1.is_empty());
    assert_eq!(m2.get(&Value::from("a")), Some(&Value::Int(1)));
    assert_eq!(m3.get(&Value::from("a")), Some(&Value::Int(2)));
    assert_eq!(m3.len(), 1);
}

#[test]
fn map_remove() {
    let factory = ValueFactory::new();
    let map = factory.map([(Value::Int(1), Value::Int(10)), (Value::Int(2), Value::Int(20))]);
    let smaller = map.remove(&Value::Int(1));
    assert_eq!(smaller.len(), 1);
    assert!(!smaller.contains_key(&Value::Int(1)));
    assert!(map.contains_key(&Value::Int(1)));
}

#[test]
fn map_union_prefers_right() {
    let factory = ValueFactory::new();
    let left = factory.map([(Value::Int(1), Value::from("left")), (Value::Int(2), Value::from("left"))]);
    let right = factory.map([(Value::Int(2), Value::from("right")), (Value::Int(3), Value::from("right"))]);
    let merged = left.union(&right).unwrap();
    assert_eq!(merged.len(), 3);
    assert_eq!(merged.get(&Value::Int(1)), Some(&Value::from("left")));
    assert_eq!(merged.get(&Value::Int(2)), Some(&Value::from("right")));
}

#[test]
fn map_types_are_inferred() {
    let factory = ValueFactory::new();
    let map: TcMap = factory.map([(Value::Int(1), Value::from("a"))]);
    assert_eq!(map.key_type(), &Type::Int);
    assert_eq!(map.value_type(), &Type::Str);
    assert_eq!(
        Value::Map(map).value_type(),
        Type::map(Type::Int, Type::Str)
    );
}

#[test]
fn map_declared_types_reject() {
    let factory = ValueFactory::new();
    let map = factory.empty_map_of(Type::Str, Type::Int);
    assert!(map.insert(Value::from("a"), Value::Int(1)).is_ok());
    assert!(map.insert(Value::Int(1), Value::Int(1)).is_err());
    assert!(map.insert(Value::from("a"), Value::from("b")).is_err());
}

#[test]
fn map_keys_and_values() {
    let factory = ValueFactory::new();
    let map = factory.map((0..10).map(|i| (Value::Int(i), Value::Int(i * i))));
    let mut keys: Vec<i64> = map.keys().filter_map(Value::as_int).collect();
    keys.sort_unstable();
    assert_eq!(keys, (0..10).collect::<Vec<_>>());
    let total: i64 = map.values().filter_map(Value::as_int).sum();
    assert_eq!(total, 285);
}

#[test]
fn map_equality_is_order_independent() {
    let factory = ValueFactory::new();
    let a = factory.map((0..50).map(|i| (Value::Int(i), Value::Int(-i))));
    let b = factory.map((0..50).rev().map(|i| (Value::Int(i), Value::Int(-i))));
    assert_eq!(a, b);
    let c = b.insert(Value::Int(0), Value::Int(1)).unwrap();
    assert_ne!(a, c);
}

#[test]
fn semantic_map_matches_annotated_keys() {
    let factory = ValueFactory::from_config(&FactoryConfig::semantic());
    let tagged = factory
        .overlay(Value::from("k"))
        .set_parameter("origin", Value::from("parser"))
        .into_value();

    let map = factory.map([(Value::from("k"), Value::Int(1))]);
    assert_eq!(map.get(&tagged), Some(&Value::Int(1)));
    assert!(map.contains_key(&tagged));

    let overwritten = map.insert(tagged.clone(), Value::Int(2)).unwrap();
    assert_eq!(overwritten.len(), 1);
    assert_eq!(overwritten.get(&Value::from("k")), Some(&Value::Int(2)));
    assert_eq!(map.get(&Value::from("k")), Some(&Value::Int(1)));

    let removed = overwritten.remove(&Value::from("k"));
    assert!(removed.is_empty());

    let strict = ValueFactory::new().map([(Value::from("k"), Value::Int(1))]);
    assert_eq!(strict.get(&tagged), None);
    assert_eq!(strict.insert(tagged, Value::Int(2)).unwrap().len(), 2);
}
