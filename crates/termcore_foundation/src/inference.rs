//! Element-type tracking for collections and builders.

use crate::Result;
use crate::error::Error;
use crate::types::{Type, TypeService};

/// How a collection knows its element type.
///
/// A declared type is fixed and every element is checked against it. An
/// inferred type starts at `void` and widens to the least upper bound of
/// everything inserted.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// Fixed at creation; insertions must be subtypes.
    Declared(Type),
    /// Least upper bound of the elements seen so far.
    Inferred(Type),
}

impl ElementType {
    /// Starts inference from the bottom type.
    #[must_use]
    pub const fn inferring() -> Self {
        Self::Inferred(Type::Void)
    }

    /// Returns the current type.
    #[must_use]
    pub const fn ty(&self) -> &Type {
        match self {
            Self::Declared(ty) | Self::Inferred(ty) => ty,
        }
    }

    /// Returns true if the type was declared up front.
    #[must_use]
    pub const fn is_declared(&self) -> bool {
        matches!(self, Self::Declared(_))
    }

    /// Checks a declared type, or widens an inferred one, to admit `actual`.
    ///
    /// # Errors
    ///
    /// Returns a type mismatch if the type is declared and `actual` is not a
    /// subtype of it. The element type is left unchanged on error.
    pub fn admit(&mut self, actual: &Type, types: &dyn TypeService) -> Result<()> {
        match self {
            Self::Declared(expected) => {
                if types.is_subtype(actual, expected) {
                    Ok(())
                } else {
                    Err(Error::type_mismatch(expected.clone(), actual.clone()))
                }
            }
            Self::Inferred(current) => {
                if !types.is_subtype(actual, current) {
                    *current = types.lub(current, actual);
                }
                Ok(())
            }
        }
    }

    /// Combines the element types of two collections being merged.
    ///
    /// # Errors
    ///
    /// Returns a type mismatch if `self` is declared and `other`'s type does
    /// not fit.
    pub fn merged(&self, other: &Self, types: &dyn TypeService) -> Result<Self> {
        let mut result = self.clone();
        result.admit(other.ty(), types)?;
        Ok(result)
    }

    /// The element type after the collection became empty.
    #[must_use]
    pub fn emptied(&self) -> Self {
        match self {
            Self::Declared(ty) => Self::Declared(ty.clone()),
            Self::Inferred(_) => Self::inferring(),
        }
    }
}
