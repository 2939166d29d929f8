//! Core values, types, and persistent hash-trie collections for termcore.
//!
//! This crate provides:
//! - [`Value`] - Immutable term values (scalars, tuples, nodes, sets, maps)
//! - [`TcSet`] and [`TcMap`] - Persistent HAMT-backed collections
//! - [`SetBuilder`] and [`MapBuilder`] - Transient builders with in-place updates
//! - [`ValueFactory`] - Construction entry point with a pluggable [`Equivalence`]
//! - [`SourceLocation`] - Source ranges with a compact storage layout
//! - [`KeywordOverlay`] - Keyword parameters attached to values
//! - [`Type`] - Type descriptors and least-upper-bound inference
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod builder;
pub mod collections;
pub mod config;
pub mod equivalence;
pub mod error;
pub mod factory;
pub mod inference;
pub mod location;
pub mod params;
pub mod types;
pub mod value;
pub mod visitor;
pub mod writer;

#[cfg(feature = "serde")]
mod serde_support;
mod trie;

pub use builder::{BuildStats, MapBuilder, SetBuilder};
pub use collections::{TcMap, TcSet};
pub use config::{EquivalenceMode, FactoryConfig};
pub use equivalence::{Equivalence, SemanticEquivalence, StrictEquality};
pub use error::{Error, ErrorContext, ErrorKind};
pub use factory::ValueFactory;
pub use inference::ElementType;
pub use location::{Layout, SourceLocation};
pub use params::KeywordOverlay;
pub use types::{ConstructorType, KeywordParameter, StructuralTypes, Type, TypeService};
pub use value::{Node, Value};
pub use visitor::ValueVisitor;
pub use writer::TextWriter;

/// Result type alias using the termcore error type.
pub type Result<T> = std::result::Result<T, Error>;
