//! Keyword-parameter overlays.
//!
//! An overlay attaches named parameters to a value without changing the value
//! itself. Parameters live in a persistent map, so every update returns a new
//! overlay and leaves the old one intact. A constructor type may declare a
//! parameter schema with defaults; lookups fall back to those defaults.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::Result;
use crate::equivalence::strict_hash;
use crate::error::Error;
use crate::types::{KeywordParameter, StructuralTypes, TypeService};
use crate::value::Value;

/// A value together with its stored keyword parameters.
#[derive(Clone)]
pub struct KeywordOverlay {
    content: Value,
    params: im::HashMap<Arc<str>, Value>,
    types: Arc<dyn TypeService>,
}

impl KeywordOverlay {
    /// Wraps a value. An existing overlay is reopened rather than nested.
    pub(crate) fn new(value: Value, types: Arc<dyn TypeService>) -> Self {
        match value {
            Value::Overlay(existing) => Self {
                types,
                ..Arc::unwrap_or_clone(existing)
            },
            content => Self {
                content,
                params: im::HashMap::new(),
                types,
            },
        }
    }

    /// Returns the wrapped value.
    #[must_use]
    pub const fn content(&self) -> &Value {
        &self.content
    }

    fn declared(&self) -> Option<&[KeywordParameter]> {
        match &self.content {
            Value::Node(node) => self.types.declared_parameters(node.node_type()),
            _ => None,
        }
    }

    /// Returns the stored value of a parameter, or its declared default.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::MissingParameter`](crate::ErrorKind) if the label
    /// is neither stored nor declared.
    pub fn get_parameter(&self, label: &str) -> Result<Value> {
        if let Some(value) = self.params.get(label) {
            return Ok(value.clone());
        }
        self.declared()
            .and_then(|declared| declared.iter().find(|p| &*p.label == label))
            .map(|p| p.default.clone())
            .ok_or_else(|| Error::missing_parameter(label))
    }

    /// Returns a new overlay with the parameter set.
    #[must_use]
    pub fn set_parameter(&self, label: &str, value: Value) -> Self {
        Self {
            params: self.params.update(label.into(), value),
            ..self.clone()
        }
    }

    /// Returns a new overlay with every given parameter set.
    #[must_use]
    pub fn set_parameters<I, S>(&self, params: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<Arc<str>>,
    {
        let mut stored = self.params.clone();
        for (label, value) in params {
            stored.insert(label.into(), value);
        }
        Self {
            params: stored,
            ..self.clone()
        }
    }

    /// Returns a new overlay without the stored parameter.
    #[must_use]
    pub fn unset_parameter(&self, label: &str) -> Self {
        Self {
            params: self.params.without(label),
            ..self.clone()
        }
    }

    /// Returns true if a value is stored for the label. Declared defaults do
    /// not count.
    #[must_use]
    pub fn has_parameter(&self, label: &str) -> bool {
        self.params.contains_key(label)
    }

    /// Returns true if any parameter is stored.
    #[must_use]
    pub fn has_parameters(&self) -> bool {
        !self.params.is_empty()
    }

    /// Returns the declared parameter names if the content's type declares a
    /// schema, otherwise the stored labels.
    #[must_use]
    pub fn parameter_names(&self) -> BTreeSet<Arc<str>> {
        match self.declared() {
            Some(declared) => declared.iter().map(|p| Arc::clone(&p.label)).collect(),
            None => self.params.keys().cloned().collect(),
        }
    }

    /// Returns the stored parameters ordered by label.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &Value)> {
        let mut stored: Vec<(&str, &Value)> =
            self.params.iter().map(|(k, v)| (k.as_ref(), v)).collect();
        stored.sort_unstable_by_key(|(k, _)| *k);
        stored.into_iter()
    }

    /// Compares parameters label by label.
    ///
    /// The name sets must match. A label stored on only one side makes the
    /// overlays unequal; a label stored on neither side is skipped.
    #[must_use]
    pub fn equals_parameters(&self, other: &Self) -> bool {
        self.parameter_names() == other.parameter_names() && self.params == other.params
    }

    /// Converts to a value; an overlay without stored parameters collapses to
    /// its content.
    #[must_use]
    pub fn into_value(self) -> Value {
        if self.params.is_empty() {
            self.content
        } else {
            Value::Overlay(Arc::new(self))
        }
    }
}

impl Value {
    /// Returns a keyword-parameter view of this value.
    ///
    /// An overlaid value yields its overlay; any other value yields an empty
    /// overlay using [`StructuralTypes`] for declared defaults.
    #[must_use]
    pub fn keyword_parameters(&self) -> KeywordOverlay {
        match self {
            Self::Overlay(overlay) => KeywordOverlay::clone(overlay),
            other => KeywordOverlay::new(other.clone(), Arc::new(StructuralTypes)),
        }
    }
}

/// Content and parameters are compared strictly; the type service is not.
impl PartialEq for KeywordOverlay {
    fn eq(&self, other: &Self) -> bool {
        self.content == other.content && self.equals_parameters(other)
    }
}

impl Eq for KeywordOverlay {}

impl Hash for KeywordOverlay {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.content.hash(state);
        let sum = self.params.iter().fold(0u64, |acc, (label, value)| {
            let mut h = std::collections::hash_map::DefaultHasher::new();
            label.hash(&mut h);
            acc.wrapping_add(h.finish() ^ strict_hash(value))
        });
        sum.hash(state);
    }
}

impl fmt::Debug for KeywordOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeywordOverlay")
            .field("content", &self.content)
            .field("params", &self.parameters().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
