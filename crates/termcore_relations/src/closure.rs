//! Composition and transitive closure of binary relations.

use termcore_foundation::{Result, TcMap, TcSet, Value, ValueFactory};

use crate::relation::pairs;

/// Indexes a binary relation by its first field.
///
/// Each key maps to the set of second fields it relates to.
fn successors(factory: &ValueFactory, relation: &TcSet, operation: &str) -> Result<TcMap> {
    let mut index = factory.map_builder();
    for pair in pairs(relation, operation) {
        let (left, right) = pair?;
        let targets = match index.get(left).and_then(Value::as_set) {
            Some(existing) => existing.insert(right.clone())?,
            None => factory.set([right.clone()]),
        };
        index.insert(left.clone(), Value::Set(targets))?;
    }
    Ok(index.build())
}

/// Returns `{(a, c) | (a, b) in r, (b, c) in s}`.
///
/// # Errors
///
/// Fails if an element of either relation is not a pair.
pub fn compose(factory: &ValueFactory, r: &TcSet, s: &TcSet) -> Result<TcSet> {
    let index = successors(factory, s, "compose")?;
    let mut builder = factory.set_builder();
    for pair in pairs(r, "compose") {
        let (a, b) = pair?;
        let Some(targets) = index.get(b).and_then(Value::as_set) else {
            continue;
        };
        for c in targets.iter() {
            builder.insert(factory.tuple(vec![a.clone(), c.clone()]))?;
        }
    }
    Ok(builder.build())
}

/// Returns the transitive closure of a binary relation.
///
/// Only pairs discovered in the previous round are extended, so each pair is
/// joined against the index once.
///
/// # Errors
///
/// Fails if an element is not a pair.
pub fn closure(factory: &ValueFactory, relation: &TcSet) -> Result<TcSet> {
    let index = successors(factory, relation, "closure")?;
    let mut result = factory.set_builder();
    let mut frontier = Vec::with_capacity(relation.len());
    for pair in pairs(relation, "closure") {
        let (a, b) = pair?;
        result.insert(factory.tuple(vec![a.clone(), b.clone()]))?;
        frontier.push((a.clone(), b.clone()));
    }

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for (a, b) in &frontier {
            let Some(targets) = index.get(b).and_then(Value::as_set) else {
                continue;
            };
            for c in targets.iter() {
                if result.insert(factory.tuple(vec![a.clone(), c.clone()]))? {
                    next.push((a.clone(), c.clone()));
                }
            }
        }
        frontier = next;
    }
    Ok(result.build())
}

/// Returns the transitive closure plus `(x, x)` for every `x` in the
/// relation's domain or range.
///
/// # Errors
///
/// Fails if an element is not a pair.
pub fn reflexive_closure(factory: &ValueFactory, relation: &TcSet) -> Result<TcSet> {
    let transitive = closure(factory, relation).map_err(|e| e.in_frame("reflexive closure"))?;
    let mut result = transitive.to_builder();
    for pair in pairs(relation, "reflexive closure") {
        let (a, b) = pair?;
        result.insert(factory.tuple(vec![a.clone(), a.clone()]))?;
        result.insert(factory.tuple(vec![b.clone(), b.clone()]))?;
    }
    Ok(result.build())
}
