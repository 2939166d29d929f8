//! Type descriptors and the type-service boundary.
//!
//! The collections never implement type algebra themselves: subtype checks,
//! least upper bounds, and keyword-parameter schemas are answered by a
//! [`TypeService`]. [`StructuralTypes`] is the default service.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::value::Value;

/// Type descriptor for values.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Type {
    /// The bottom type (no values). Element type of an empty collection.
    Void,
    /// The top type (accepts every value).
    Value,
    /// Boolean type.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// 64-bit floating point.
    Real,
    /// Common supertype of `Int` and `Real`.
    Num,
    /// String type.
    Str,
    /// Source location type.
    SourceLocation,
    /// Fixed-width tuple type.
    Tuple(Vec<Type>),
    /// Set type.
    Set(Box<Type>),
    /// Map type.
    Map(Box<Type>, Box<Type>),
    /// Untyped node (any constructor application).
    Node,
    /// Algebraic data type, identified by name.
    Adt(Arc<str>),
    /// A constructor of an algebraic data type.
    Constructor(Arc<ConstructorType>),
}

/// Declaration of a constructor: positional fields and keyword parameters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ConstructorType {
    /// Name of the ADT this constructor belongs to.
    pub adt: Arc<str>,
    /// Constructor name.
    pub name: Arc<str>,
    /// Positional field types.
    pub fields: Vec<Type>,
    /// Declared keyword parameters, in declaration order.
    pub keyword_parameters: Vec<KeywordParameter>,
}

/// A declared keyword parameter with its default value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct KeywordParameter {
    /// Parameter label.
    pub label: Arc<str>,
    /// Declared type of the parameter.
    pub ty: Type,
    /// Value used when an overlay has no stored value for this label.
    pub default: Value,
}

impl ConstructorType {
    /// Creates a constructor declaration without keyword parameters.
    #[must_use]
    pub fn new(adt: &str, name: &str, fields: Vec<Type>) -> Self {
        Self {
            adt: adt.into(),
            name: name.into(),
            fields,
            keyword_parameters: Vec::new(),
        }
    }

    /// Builder method to declare a keyword parameter.
    #[must_use]
    pub fn with_keyword_parameter(mut self, label: &str, ty: Type, default: Value) -> Self {
        self.keyword_parameters.push(KeywordParameter {
            label: label.into(),
            ty,
            default,
        });
        self
    }

    /// Returns the number of positional fields.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    /// Looks up a declared keyword parameter.
    #[must_use]
    pub fn keyword_parameter(&self, label: &str) -> Option<&KeywordParameter> {
        self.keyword_parameters
            .iter()
            .find(|p| p.label.as_ref() == label)
    }
}

impl Type {
    /// Creates a set type with the given element type.
    #[must_use]
    pub fn set(element: Type) -> Self {
        Self::Set(Box::new(element))
    }

    /// Creates a map type with the given key and value types.
    #[must_use]
    pub fn map(key: Type, value: Type) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    /// Creates a tuple type.
    #[must_use]
    pub fn tuple(fields: Vec<Type>) -> Self {
        Self::Tuple(fields)
    }

    /// Creates a binary relation type (a set of pairs).
    #[must_use]
    pub fn relation(left: Type, right: Type) -> Self {
        Self::set(Self::tuple(vec![left, right]))
    }

    /// Creates an ADT type.
    #[must_use]
    pub fn adt(name: &str) -> Self {
        Self::Adt(name.into())
    }

    /// Creates a constructor type.
    #[must_use]
    pub fn constructor(declaration: ConstructorType) -> Self {
        Self::Constructor(Arc::new(declaration))
    }

    /// Returns true if this is the bottom type.
    #[must_use]
    pub const fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    /// Returns the element type of a set type.
    #[must_use]
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Self::Set(element) => Some(element),
            _ => None,
        }
    }

    /// Returns the field types of a tuple type.
    #[must_use]
    pub fn fields(&self) -> Option<&[Type]> {
        match self {
            Self::Tuple(fields) => Some(fields),
            _ => None,
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => write!(f, "void"),
            Self::Value => write!(f, "value"),
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Real => write!(f, "real"),
            Self::Num => write!(f, "num"),
            Self::Str => write!(f, "str"),
            Self::SourceLocation => write!(f, "loc"),
            Self::Tuple(fields) => {
                write!(f, "tuple[")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{field:?}")?;
                }
                write!(f, "]")
            }
            Self::Set(t) => write!(f, "set[{t:?}]"),
            Self::Map(k, v) => write!(f, "map[{k:?}, {v:?}]"),
            Self::Node => write!(f, "node"),
            Self::Adt(name) => write!(f, "{name}"),
            Self::Constructor(c) => write!(f, "{}::{}", c.adt, c.name),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// External type algebra consumed by collections, builders, and overlays.
pub trait TypeService: fmt::Debug + Send + Sync {
    /// Returns true if `sub` is a subtype of `sup`.
    fn is_subtype(&self, sub: &Type, sup: &Type) -> bool;

    /// Returns the least upper bound of two types.
    fn lub(&self, a: &Type, b: &Type) -> Type;

    /// Returns the keyword-parameter schema a type declares, if any.
    fn declared_parameters<'t>(&self, ty: &'t Type) -> Option<&'t [KeywordParameter]> {
        match ty {
            Type::Constructor(c) if !c.keyword_parameters.is_empty() => {
                Some(&c.keyword_parameters)
            }
            _ => None,
        }
    }
}

/// Structural subtyping with `void` at the bottom and `value` at the top.
///
/// - `int` and `real` are subtypes of `num`
/// - sets, maps, and tuples are covariant in their components
/// - a constructor is a subtype of its ADT; every ADT is a subtype of `node`
#[derive(Clone, Copy, Debug, Default)]
pub struct StructuralTypes;

impl TypeService for StructuralTypes {
    fn is_subtype(&self, sub: &Type, sup: &Type) -> bool {
        if sub == sup {
            return true;
        }

        match (sub, sup) {
            (Type::Void, _)
            | (_, Type::Value)
            | (Type::Int | Type::Real, Type::Num)
            | (Type::Constructor(_) | Type::Adt(_), Type::Node) => true,
            (Type::Set(a), Type::Set(b)) => self.is_subtype(a, b),
            (Type::Map(ka, va), Type::Map(kb, vb)) => {
                self.is_subtype(ka, kb) && self.is_subtype(va, vb)
            }
            (Type::Tuple(a), Type::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.is_subtype(x, y))
            }
            (Type::Constructor(c), Type::Adt(name)) => c.adt == *name,
            _ => false,
        }
    }

    fn lub(&self, a: &Type, b: &Type) -> Type {
        if self.is_subtype(a, b) {
            return b.clone();
        }
        if self.is_subtype(b, a) {
            return a.clone();
        }

        match (a, b) {
            (Type::Int | Type::Real | Type::Num, Type::Int | Type::Real | Type::Num) => Type::Num,
            (Type::Set(x), Type::Set(y)) => Type::set(self.lub(x, y)),
            (Type::Map(ka, va), Type::Map(kb, vb)) => Type::map(self.lub(ka, kb), self.lub(va, vb)),
            (Type::Tuple(x), Type::Tuple(y)) if x.len() == y.len() => {
                Type::tuple(x.iter().zip(y).map(|(p, q)| self.lub(p, q)).collect())
            }
            (Type::Constructor(c1), Type::Constructor(c2)) if c1.adt == c2.adt => {
                Type::Adt(c1.adt.clone())
            }
            (
                Type::Constructor(_) | Type::Adt(_) | Type::Node,
                Type::Constructor(_) | Type::Adt(_) | Type::Node,
            ) => Type::Node,
            _ => Type::Value,
        }
    }
}
