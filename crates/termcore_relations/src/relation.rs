//! Shape checks and per-tuple operators.

use termcore_foundation::{Error, ErrorContext, Result, TcSet, Type, Value, ValueFactory};

/// Returns the fields of a relation element, or a type mismatch naming the
/// operation and the element's position in iteration order.
pub(crate) fn fields<'a>(
    element: &'a Value,
    expected: usize,
    operation: &str,
    index: usize,
) -> Result<&'a [Value]> {
    let context = || ErrorContext::new().with_operation(operation).with_index(index);
    let Some(fields) = element.content().as_tuple() else {
        let expected = Type::tuple(vec![Type::Value; expected]);
        return Err(Error::type_mismatch(expected, element.value_type()).with_context(context()));
    };
    if fields.len() != expected {
        return Err(Error::arity_mismatch(expected, fields.len()).with_context(context()));
    }
    Ok(fields)
}

/// Iterates the pairs of a binary relation.
pub(crate) fn pairs<'a>(
    relation: &'a TcSet,
    operation: &'a str,
) -> impl Iterator<Item = Result<(&'a Value, &'a Value)>> + 'a {
    relation
        .iter()
        .enumerate()
        .map(move |(i, element)| fields(element, 2, operation, i).map(|f| (&f[0], &f[1])))
}

/// Returns the common arity of a relation's tuples, or `None` if it is empty.
///
/// # Errors
///
/// Returns a type mismatch for a non-tuple element and an arity mismatch if
/// two tuples differ in length.
pub fn arity(relation: &TcSet) -> Result<Option<usize>> {
    let mut elements = relation.iter().enumerate();
    let Some((_, first)) = elements.next() else {
        return Ok(None);
    };
    let width = match first.content().as_tuple() {
        Some(fields) => fields.len(),
        None => fields(first, 0, "arity", 0)?.len(),
    };
    for (i, element) in elements {
        fields(element, width, "arity", i)?;
    }
    Ok(Some(width))
}

/// Returns the set of first fields of a binary relation.
///
/// # Errors
///
/// Fails if an element is not a pair.
pub fn domain(factory: &ValueFactory, relation: &TcSet) -> Result<TcSet> {
    let mut builder = factory.set_builder();
    for pair in pairs(relation, "domain") {
        let (left, _) = pair?;
        builder.insert(left.clone())?;
    }
    Ok(builder.build())
}

/// Returns the set of second fields of a binary relation.
///
/// # Errors
///
/// Fails if an element is not a pair.
pub fn range(factory: &ValueFactory, relation: &TcSet) -> Result<TcSet> {
    let mut builder = factory.set_builder();
    for pair in pairs(relation, "range") {
        let (_, right) = pair?;
        builder.insert(right.clone())?;
    }
    Ok(builder.build())
}

/// Swaps the fields of every pair.
///
/// # Errors
///
/// Fails if an element is not a pair.
pub fn inverse(factory: &ValueFactory, relation: &TcSet) -> Result<TcSet> {
    let mut builder = factory.set_builder();
    for pair in pairs(relation, "inverse") {
        let (left, right) = pair?;
        builder.insert(factory.tuple(vec![right.clone(), left.clone()]))?;
    }
    Ok(builder.build())
}

/// Keeps the given fields of every tuple, in the given order.
///
/// Projecting onto a single field yields the bare field values rather than
/// one-element tuples.
///
/// # Errors
///
/// Returns an invalid argument error if a field index is out of range for the
/// relation's arity, and the shape errors of [`arity`].
pub fn project(factory: &ValueFactory, relation: &TcSet, indices: &[usize]) -> Result<TcSet> {
    let Some(width) = arity(relation).map_err(|e| e.in_frame("project"))? else {
        return Ok(factory.empty_set());
    };
    if let Some(bad) = indices.iter().find(|&&i| i >= width) {
        return Err(Error::invalid_argument(format!(
            "field {bad} out of range for arity {width}"
        ))
        .with_context(ErrorContext::new().with_operation("project")));
    }

    let mut builder = factory.set_builder();
    for (i, element) in relation.iter().enumerate() {
        let fields = fields(element, width, "project", i)?;
        let projected = match indices {
            [single] => fields[*single].clone(),
            _ => factory.tuple(indices.iter().map(|&f| fields[f].clone()).collect()),
        };
        builder.insert(projected)?;
    }
    Ok(builder.build())
}

/// Returns every `b` such that `(key, b)` is in the relation.
///
/// # Errors
///
/// Fails if an element is not a pair.
pub fn image(factory: &ValueFactory, relation: &TcSet, key: &Value) -> Result<TcSet> {
    let wanted = factory.set([key.clone()]);
    let mut builder = factory.set_builder();
    for pair in pairs(relation, "image") {
        let (left, right) = pair?;
        if wanted.contains(left) {
            builder.insert(right.clone())?;
        }
    }
    Ok(builder.build())
}
