//! Textual rendering of values.
//!
//! | value     | text              |
//! |-----------|-------------------|
//! | set       | `{1,2}`           |
//! | map       | `("a":1)`         |
//! | tuple     | `<1,"x">`         |
//! | node      | `f(1,x=2)`        |
//! | overlay   | `1[x=2]`          |
//! | location  | `\|uri\|(0,5)`    |

use std::fmt::Write;

use crate::collections::{TcMap, TcSet};
use crate::location::SourceLocation;
use crate::params::KeywordOverlay;
use crate::value::{Node, Value};
use crate::visitor::{ValueVisitor, walk_value};

/// Renders values into a string buffer.
#[derive(Debug, Default)]
pub struct TextWriter {
    out: String,
}

impl TextWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders a single value.
    #[must_use]
    pub fn render(value: &Value) -> String {
        let mut writer = Self::new();
        writer.write(value);
        writer.finish()
    }

    /// Appends a value to the buffer.
    pub fn write(&mut self, value: &Value) {
        walk_value(self, value);
    }

    /// Returns the rendered text.
    #[must_use]
    pub fn finish(self) -> String {
        self.out
    }

    fn separator(&mut self, index: usize) {
        if index > 0 {
            self.out.push(',');
        }
    }
}

impl ValueVisitor for TextWriter {
    fn visit_bool(&mut self, value: bool) {
        let _ = write!(self.out, "{value}");
    }

    fn visit_int(&mut self, value: i64) {
        let _ = write!(self.out, "{value}");
    }

    fn visit_real(&mut self, value: f64) {
        let _ = write!(self.out, "{value:?}");
    }

    fn visit_str(&mut self, value: &str) {
        self.out.push('"');
        for c in value.chars() {
            match c {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\n' => self.out.push_str("\\n"),
                '\t' => self.out.push_str("\\t"),
                '\r' => self.out.push_str("\\r"),
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }

    fn visit_loc(&mut self, value: &SourceLocation) {
        let _ = write!(self.out, "{value}");
    }

    fn enter_tuple(&mut self, _items: &[Value]) {
        self.out.push('<');
    }

    fn leave_tuple(&mut self, _items: &[Value]) {
        self.out.push('>');
    }

    fn enter_node(&mut self, node: &Node) {
        self.out.push_str(node.name());
        self.out.push('(');
    }

    fn leave_node(&mut self, _node: &Node) {
        self.out.push(')');
    }

    fn enter_set(&mut self, _set: &TcSet) {
        self.out.push('{');
    }

    fn leave_set(&mut self, _set: &TcSet) {
        self.out.push('}');
    }

    fn enter_map(&mut self, _map: &TcMap) {
        self.out.push('(');
    }

    fn leave_map(&mut self, _map: &TcMap) {
        self.out.push(')');
    }

    fn enter_overlay(&mut self, _overlay: &KeywordOverlay) {
        self.out.push('[');
    }

    fn leave_overlay(&mut self, _overlay: &KeywordOverlay) {
        self.out.push(']');
    }

    fn enter_element(&mut self, index: usize) {
        self.separator(index);
    }

    fn enter_entry(&mut self, index: usize) {
        self.separator(index);
    }

    fn between_key_value(&mut self) {
        self.out.push(':');
    }

    fn enter_parameter(&mut self, position: usize, label: &str) {
        self.separator(position);
        self.out.push_str(label);
        self.out.push('=');
    }
}
