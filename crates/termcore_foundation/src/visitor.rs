//! Read-only traversal of values.
//!
//! Implement the hooks of interest on [`ValueVisitor`] and drive it with
//! [`walk_value`]. The default hooks do nothing.
//!
//! # Example
//!
//! ```
//! use termcore_foundation::{Value, ValueFactory};
//! use termcore_foundation::visitor::{ValueVisitor, walk_value};
//!
//! struct IntCounter(usize);
//!
//! impl ValueVisitor for IntCounter {
//!     fn visit_int(&mut self, _value: i64) {
//!         self.0 += 1;
//!     }
//! }
//!
//! let factory = ValueFactory::new();
//! let value = factory.tuple(vec![
//!     Value::Int(1),
//!     Value::Set(factory.set([Value::Int(2), Value::Int(3)])),
//!     Value::from("x"),
//! ]);
//! let mut counter = IntCounter(0);
//! walk_value(&mut counter, &value);
//! assert_eq!(counter.0, 3);
//! ```

use crate::collections::{TcMap, TcSet};
use crate::location::SourceLocation;
use crate::params::KeywordOverlay;
use crate::value::{Node, Value};

/// Trait for read-only value visitors.
///
/// Containers are reported as `enter_*`, then their children, then
/// `leave_*`. Keyword parameters of a node are reported inside the node,
/// after its positional children. For any other overlaid value the content is
/// walked first, then `enter_overlay`, the parameters, and `leave_overlay`.
#[allow(unused_variables)]
pub trait ValueVisitor {
    /// Visit a boolean.
    fn visit_bool(&mut self, value: bool) {}

    /// Visit an integer.
    fn visit_int(&mut self, value: i64) {}

    /// Visit a real.
    fn visit_real(&mut self, value: f64) {}

    /// Visit a string.
    fn visit_str(&mut self, value: &str) {}

    /// Visit a source location.
    fn visit_loc(&mut self, value: &SourceLocation) {}

    /// Called before visiting tuple fields.
    fn enter_tuple(&mut self, items: &[Value]) {}

    /// Called after visiting tuple fields.
    fn leave_tuple(&mut self, items: &[Value]) {}

    /// Called before visiting node children.
    fn enter_node(&mut self, node: &Node) {}

    /// Called after visiting node children and parameters.
    fn leave_node(&mut self, node: &Node) {}

    /// Called before visiting set elements.
    fn enter_set(&mut self, set: &TcSet) {}

    /// Called after visiting set elements.
    fn leave_set(&mut self, set: &TcSet) {}

    /// Called before visiting map entries.
    fn enter_map(&mut self, map: &TcMap) {}

    /// Called after visiting map entries.
    fn leave_map(&mut self, map: &TcMap) {}

    /// Called after the content of a non-node overlay, before its parameters.
    fn enter_overlay(&mut self, overlay: &KeywordOverlay) {}

    /// Called after the parameters of a non-node overlay.
    fn leave_overlay(&mut self, overlay: &KeywordOverlay) {}

    /// Called before each tuple field, node child, or set element.
    fn enter_element(&mut self, index: usize) {}

    /// Called before each map entry's key.
    fn enter_entry(&mut self, index: usize) {}

    /// Called between a map entry's key and value.
    fn between_key_value(&mut self) {}

    /// Called before each keyword parameter's value.
    ///
    /// For nodes, `position` continues the numbering of the positional
    /// children.
    fn enter_parameter(&mut self, position: usize, label: &str) {}
}

/// Walk a value, calling visitor hooks for it and every value inside it.
pub fn walk_value<V: ValueVisitor + ?Sized>(visitor: &mut V, value: &Value) {
    match value {
        Value::Bool(b) => visitor.visit_bool(*b),
        Value::Int(n) => visitor.visit_int(*n),
        Value::Real(n) => visitor.visit_real(*n),
        Value::Str(s) => visitor.visit_str(s),
        Value::Loc(loc) => visitor.visit_loc(loc),

        Value::Tuple(items) => {
            visitor.enter_tuple(items);
            for (i, item) in items.iter().enumerate() {
                visitor.enter_element(i);
                walk_value(visitor, item);
            }
            visitor.leave_tuple(items);
        }

        Value::Node(node) => walk_node(visitor, node, None),

        Value::Set(set) => {
            visitor.enter_set(set);
            for (i, element) in set.iter().enumerate() {
                visitor.enter_element(i);
                walk_value(visitor, element);
            }
            visitor.leave_set(set);
        }

        Value::Map(map) => {
            visitor.enter_map(map);
            for (i, (k, v)) in map.iter().enumerate() {
                visitor.enter_entry(i);
                walk_value(visitor, k);
                visitor.between_key_value();
                walk_value(visitor, v);
            }
            visitor.leave_map(map);
        }

        Value::Overlay(overlay) => match overlay.content() {
            Value::Node(node) => walk_node(visitor, node, Some(overlay)),
            content => {
                walk_value(visitor, content);
                visitor.enter_overlay(overlay);
                walk_parameters(visitor, overlay, 0);
                visitor.leave_overlay(overlay);
            }
        },
    }
}

fn walk_node<V: ValueVisitor + ?Sized>(visitor: &mut V, node: &Node, overlay: Option<&KeywordOverlay>) {
    visitor.enter_node(node);
    for (i, child) in node.children().iter().enumerate() {
        visitor.enter_element(i);
        walk_value(visitor, child);
    }
    if let Some(overlay) = overlay {
        walk_parameters(visitor, overlay, node.arity());
    }
    visitor.leave_node(node);
}

fn walk_parameters<V: ValueVisitor + ?Sized>(visitor: &mut V, overlay: &KeywordOverlay, first: usize) {
    for (i, (label, value)) in overlay.parameters().enumerate() {
        visitor.enter_parameter(first + i, label);
        walk_value(visitor, value);
    }
}
