//! Relational operators over termcore sets of tuples.
//!
//! A relation is a [`TcSet`](termcore_foundation::TcSet) whose elements are
//! tuples of equal arity. This crate provides:
//! - [`arity`], [`domain`], [`range`], [`inverse`], [`project`], [`image`] -
//!   Shape queries and per-tuple transformations
//! - [`compose`], [`closure`], [`reflexive_closure`] - Joins and fixpoints
//!
//! Every operation takes the [`ValueFactory`](termcore_foundation::ValueFactory)
//! that builds its result, so results share that factory's equivalence policy.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod closure;
mod relation;

pub use closure::{closure, compose, reflexive_closure};
pub use relation::{arity, domain, image, inverse, project, range};
