//! `Serialize` implementations for values (behind the `serde` feature).
//!
//! Scalars map to native serde types, tuples and sets to sequences, maps to
//! maps, nodes to `{ name, children }` structs and overlays to
//! `{ content, parameters }` structs with parameters ordered by label.

use serde::ser::{SerializeMap, SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::collections::{TcMap, TcSet};
use crate::params::KeywordOverlay;
use crate::value::{Node, Value};

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::Real(n) => serializer.serialize_f64(*n),
            Self::Str(s) => serializer.serialize_str(s),
            Self::Loc(loc) => loc.serialize(serializer),
            Self::Tuple(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Node(node) => node.serialize(serializer),
            Self::Set(set) => set.serialize(serializer),
            Self::Map(map) => map.serialize(serializer),
            Self::Overlay(overlay) => overlay.serialize(serializer),
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Node", 2)?;
        state.serialize_field("name", self.name())?;
        state.serialize_field("children", self.children())?;
        state.end()
    }
}

impl Serialize for TcSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for element in self.iter() {
            seq.serialize_element(element)?;
        }
        seq.end()
    }
}

impl Serialize for TcMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Sorted view of stored parameters.
struct Parameters<'a>(&'a KeywordOverlay);

impl Serialize for Parameters<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.parameters())
    }
}

impl Serialize for KeywordOverlay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Overlay", 2)?;
        state.serialize_field("content", self.content())?;
        state.serialize_field("parameters", &Parameters(self))?;
        state.end()
    }
}
