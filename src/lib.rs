//! termcore - Persistent collections for term values
//!
//! This crate re-exports all layers of termcore for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 1: termcore_relations  - Relational operators over sets of tuples
//! Layer 0: termcore_foundation - Values, types, HAMT collections, builders,
//!                                source locations, keyword parameters
//! ```

pub use termcore_foundation as foundation;
pub use termcore_relations as relations;
