//! Pluggable equality and equivalence policies.
//!
//! A collection keys its trie with one [`Equivalence`]: the policy decides
//! which elements collapse into one entry and supplies the digest used for
//! navigation. Two policies ship with the crate:
//!
//! - [`StrictEquality`]: full structural equality (the `==` of [`Value`]).
//! - [`SemanticEquivalence`]: equality that ignores keyword-parameter
//!   overlays at every depth.
//!
//! Every policy must be coarser than strict equality: strictly equal values
//! are always equivalent and always produce the same digest.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};

use crate::collections::{TcMap, TcSet};
use crate::value::Value;

/// An equivalence relation with a compatible digest.
///
/// `equivalent(a, b)` implies `hash(a) == hash(b)`.
pub trait Equivalence: Debug + Send + Sync {
    /// Returns true if the two values are the same element under this policy.
    fn equivalent(&self, a: &Value, b: &Value) -> bool;

    /// Digest of a value, consistent with [`equivalent`](Self::equivalent).
    fn hash(&self, value: &Value) -> u64;

    /// Identifies the digest function.
    ///
    /// Collections whose policies share a name are assumed to lay out their
    /// tries identically, which enables structural merges.
    fn name(&self) -> &'static str;
}

/// Structural equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictEquality;

impl Equivalence for StrictEquality {
    fn equivalent(&self, a: &Value, b: &Value) -> bool {
        a == b
    }

    fn hash(&self, value: &Value) -> u64 {
        strict_hash(value)
    }

    fn name(&self) -> &'static str {
        "strict"
    }
}

/// Equality modulo keyword parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemanticEquivalence;

impl Equivalence for SemanticEquivalence {
    fn equivalent(&self, a: &Value, b: &Value) -> bool {
        semantically_equivalent(a, b)
    }

    fn hash(&self, value: &Value) -> u64 {
        semantic_hash(value)
    }

    fn name(&self) -> &'static str {
        "semantic"
    }
}

/// Digest of a value under strict equality.
#[must_use]
pub fn strict_hash(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Digest of a value with all keyword parameters ignored.
#[must_use]
pub fn semantic_hash(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    semantic_hash_into(value, &mut hasher);
    hasher.finish()
}

fn semantic_hash_into<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Overlay(overlay) => semantic_hash_into(overlay.content(), state),
        Value::Tuple(items) => {
            std::mem::discriminant(value).hash(state);
            items.len().hash(state);
            for item in items.iter() {
                semantic_hash_into(item, state);
            }
        }
        Value::Node(node) => {
            std::mem::discriminant(value).hash(state);
            node.name().hash(state);
            node.node_type().hash(state);
            node.arity().hash(state);
            for child in node.children() {
                semantic_hash_into(child, state);
            }
        }
        Value::Set(set) => {
            std::mem::discriminant(value).hash(state);
            state.write_u64(element_classes(set).digest());
        }
        Value::Map(map) => {
            std::mem::discriminant(value).hash(state);
            state.write_u64(entry_classes(map).digest());
        }
        _ => value.hash(state),
    }
}

/// Structural comparison that looks through keyword-parameter overlays.
#[must_use]
pub fn semantically_equivalent(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Overlay(x), _) => semantically_equivalent(x.content(), b),
        (_, Value::Overlay(y)) => semantically_equivalent(a, y.content()),
        (Value::Tuple(x), Value::Tuple(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(p, q)| semantically_equivalent(p, q))
        }
        (Value::Node(x), Value::Node(y)) => {
            x.name() == y.name()
                && x.node_type() == y.node_type()
                && x.arity() == y.arity()
                && x
                    .children()
                    .iter()
                    .zip(y.children())
                    .all(|(p, q)| semantically_equivalent(p, q))
        }
        (Value::Set(x), Value::Set(y)) => sets_equivalent(x, y),
        (Value::Map(x), Value::Map(y)) => maps_equivalent(x, y),
        _ => a == b,
    }
}

/// One representative per semantic class, bucketed by digest.
///
/// A strict collection may hold several members of one class; they collapse
/// here so that digests and comparisons see each class once.
struct Classes<T> {
    buckets: HashMap<u64, Vec<T>>,
    count: usize,
}

impl<T: Copy> Classes<T> {
    fn collect(
        items: impl Iterator<Item = T>,
        digest: impl Fn(T) -> u64,
        same: impl Fn(T, T) -> bool,
    ) -> Self {
        let mut classes = Self {
            buckets: HashMap::new(),
            count: 0,
        };
        for item in items {
            let bucket = classes.buckets.entry(digest(item)).or_default();
            if !bucket.iter().any(|&rep| same(rep, item)) {
                bucket.push(item);
                classes.count += 1;
            }
        }
        classes
    }

    /// Order-independent sum of the class digests.
    fn digest(&self) -> u64 {
        self.buckets.iter().fold(0u64, |acc, (&hash, bucket)| {
            bucket.iter().fold(acc, |acc, _| acc.wrapping_add(hash))
        })
    }

    /// True if both hold the same classes.
    ///
    /// Classes are disjoint, so matching every class of `self` in `other`
    /// with equal counts is a bijection.
    fn same_as(&self, other: &Self, same: impl Fn(T, T) -> bool) -> bool {
        self.count == other.count
            && self.buckets.iter().all(|(hash, bucket)| {
                other.buckets.get(hash).is_some_and(|theirs| {
                    bucket
                        .iter()
                        .all(|&mine| theirs.iter().any(|&rep| same(rep, mine)))
                })
            })
    }
}

type Entry<'a> = (&'a Value, &'a Value);

fn entry_digest((k, v): Entry<'_>) -> u64 {
    semantic_hash(k)
        .wrapping_mul(31)
        .wrapping_add(semantic_hash(v))
}

fn same_entry((ak, av): Entry<'_>, (bk, bv): Entry<'_>) -> bool {
    semantically_equivalent(ak, bk) && semantically_equivalent(av, bv)
}

fn element_classes(set: &TcSet) -> Classes<&Value> {
    Classes::collect(set.iter(), semantic_hash, semantically_equivalent)
}

fn entry_classes(map: &TcMap) -> Classes<Entry<'_>> {
    Classes::collect(map.iter(), entry_digest, same_entry)
}

fn sets_equivalent(x: &TcSet, y: &TcSet) -> bool {
    x.ptr_eq(y) || element_classes(x).same_as(&element_classes(y), semantically_equivalent)
}

fn maps_equivalent(x: &TcMap, y: &TcMap) -> bool {
    x.ptr_eq(y) || entry_classes(x).same_as(&entry_classes(y), same_entry)
}
