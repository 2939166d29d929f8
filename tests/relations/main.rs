//! Integration tests for Layer 1: Relations
//!
//! Tests relational operators over sets of tuples built by the foundation.

mod operators;
