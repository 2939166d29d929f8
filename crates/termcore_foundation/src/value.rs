//! Core value type for all termcore data.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::collections::{TcMap, TcSet};
use crate::location::SourceLocation;
use crate::params::KeywordOverlay;
use crate::types::Type;
use crate::writer::TextWriter;

/// An immutable value.
///
/// Values are cheaply cloneable: composite variants are reference counted and
/// collections share structure.
///
/// `==` is strict structural equality: keyword parameters take part in it and
/// reals compare bitwise. Looser comparisons are provided by
/// [`Equivalence`](crate::Equivalence) policies.
#[derive(Clone)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Real(f64),
    /// String value.
    Str(Arc<str>),
    /// Source location.
    Loc(SourceLocation),
    /// Fixed-width tuple.
    Tuple(Arc<[Value]>),
    /// Node or constructor application.
    Node(Arc<Node>),
    /// Persistent set.
    Set(TcSet),
    /// Persistent map.
    Map(TcMap),
    /// A value annotated with keyword parameters.
    Overlay(Arc<KeywordOverlay>),
}

/// A named application to positional children.
///
/// Untyped nodes have type [`Type::Node`]; constructor applications carry
/// their [`Type::Constructor`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Node {
    ty: Type,
    name: Arc<str>,
    children: Arc<[Value]>,
}

impl Node {
    pub(crate) fn new(ty: Type, name: Arc<str>, children: Vec<Value>) -> Self {
        Self {
            ty,
            name,
            children: children.into(),
        }
    }

    /// Returns the node name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the node's type.
    #[must_use]
    pub const fn node_type(&self) -> &Type {
        &self.ty
    }

    /// Returns the positional children.
    #[must_use]
    pub fn children(&self) -> &[Value] {
        &self.children
    }

    /// Returns the child at `index`.
    #[must_use]
    pub fn child(&self, index: usize) -> Option<&Value> {
        self.children.get(index)
    }

    /// Returns the number of positional children.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.children.len()
    }
}

impl Value {
    /// Returns the type of this value.
    #[must_use]
    pub fn value_type(&self) -> Type {
        match self {
            Self::Bool(_) => Type::Bool,
            Self::Int(_) => Type::Int,
            Self::Real(_) => Type::Real,
            Self::Str(_) => Type::Str,
            Self::Loc(_) => Type::SourceLocation,
            Self::Tuple(items) => Type::tuple(items.iter().map(Self::value_type).collect()),
            Self::Node(node) => node.ty.clone(),
            Self::Set(set) => Type::set(set.element_type().clone()),
            Self::Map(map) => Type::map(map.key_type().clone(), map.value_type().clone()),
            Self::Overlay(overlay) => overlay.content().value_type(),
        }
    }

    /// Returns the value with any keyword-parameter overlay removed.
    #[must_use]
    pub fn content(&self) -> &Self {
        match self {
            Self::Overlay(overlay) => overlay.content(),
            other => other,
        }
    }

    /// Attempts to extract a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract an integer value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a real value.
    #[must_use]
    pub const fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a source location.
    #[must_use]
    pub const fn as_loc(&self) -> Option<&SourceLocation> {
        match self {
            Self::Loc(loc) => Some(loc),
            _ => None,
        }
    }

    /// Attempts to extract tuple fields.
    #[must_use]
    pub fn as_tuple(&self) -> Option<&[Self]> {
        match self {
            Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Attempts to extract a node, looking through overlays.
    #[must_use]
    pub fn as_node(&self) -> Option<&Node> {
        match self.content() {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Attempts to extract a set reference.
    #[must_use]
    pub const fn as_set(&self) -> Option<&TcSet> {
        match self {
            Self::Set(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a map reference.
    #[must_use]
    pub const fn as_map(&self) -> Option<&TcMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Attempts to extract a keyword-parameter overlay.
    #[must_use]
    pub fn as_overlay(&self) -> Option<&KeywordOverlay> {
        match self {
            Self::Overlay(overlay) => Some(overlay),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Real(a), Self::Real(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Loc(a), Self::Loc(b)) => a == b,
            (Self::Tuple(a), Self::Tuple(b)) => Arc::ptr_eq(a, b) || a == b,
            (Self::Node(a), Self::Node(b)) => Arc::ptr_eq(a, b) || a == b,
            (Self::Set(a), Self::Set(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Overlay(a), Self::Overlay(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Bool(b) => b.hash(state),
            Self::Int(n) => n.hash(state),
            Self::Real(n) => n.to_bits().hash(state),
            Self::Str(s) => s.hash(state),
            Self::Loc(loc) => loc.hash(state),
            Self::Tuple(items) => items.hash(state),
            Self::Node(node) => node.hash(state),
            Self::Set(s) => s.hash(state),
            Self::Map(m) => m.hash(state),
            Self::Overlay(overlay) => overlay.hash(state),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&TextWriter::render(self))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&TextWriter::render(self))
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("type", &self.ty)
            .field("name", &self.name)
            .field("children", &self.children)
            .finish()
    }
}

// Convenience From implementations

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Real(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s.into())
    }
}

impl From<Arc<str>> for Value {
    fn from(s: Arc<str>) -> Self {
        Self::Str(s)
    }
}

impl From<SourceLocation> for Value {
    fn from(loc: SourceLocation) -> Self {
        Self::Loc(loc)
    }
}

impl From<TcSet> for Value {
    fn from(set: TcSet) -> Self {
        Self::Set(set)
    }
}

impl From<TcMap> for Value {
    fn from(map: TcMap) -> Self {
        Self::Map(map)
    }
}

impl From<KeywordOverlay> for Value {
    fn from(overlay: KeywordOverlay) -> Self {
        overlay.into_value()
    }
}
