//! The value factory: the explicit context every collection is created from.
//!
//! A factory bundles the equivalence policy and the type service. Collections
//! remember the factory that created them, so a set built under semantic
//! equivalence keeps deduplicating semantically through every later update.

use std::fmt;
use std::sync::Arc;

use crate::Result;
use crate::builder::{BuildStats, MapBuilder, SetBuilder};
use crate::collections::{TcMap, TcSet};
use crate::config::{EquivalenceMode, FactoryConfig};
use crate::equivalence::{Equivalence, SemanticEquivalence, StrictEquality};
use crate::error::{Error, ErrorContext};
use crate::inference::ElementType;
use crate::params::KeywordOverlay;
use crate::trie::Trie;
use crate::types::{ConstructorType, StructuralTypes, Type, TypeService};
use crate::value::{Node, Value};

/// Creates values and collections under one equivalence policy and one type
/// service.
///
/// Cloning is O(1).
#[derive(Clone)]
pub struct ValueFactory {
    equivalence: Arc<dyn Equivalence>,
    types: Arc<dyn TypeService>,
    config: FactoryConfig,
}

impl ValueFactory {
    /// Creates a factory with strict equality and structural types.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&FactoryConfig::default())
    }

    /// Creates a factory from a configuration.
    #[must_use]
    pub fn from_config(config: &FactoryConfig) -> Self {
        let equivalence: Arc<dyn Equivalence> = match config.equivalence {
            EquivalenceMode::Strict => Arc::new(StrictEquality),
            EquivalenceMode::Semantic => Arc::new(SemanticEquivalence),
        };
        Self {
            equivalence,
            types: Arc::new(StructuralTypes),
            config: config.clone(),
        }
    }

    /// Replaces the equivalence policy.
    #[must_use]
    pub fn with_equivalence(mut self, equivalence: Arc<dyn Equivalence>) -> Self {
        self.equivalence = equivalence;
        self
    }

    /// Replaces the type service.
    #[must_use]
    pub fn with_types(mut self, types: Arc<dyn TypeService>) -> Self {
        self.types = types;
        self
    }

    /// Returns the equivalence policy.
    #[must_use]
    pub fn equivalence(&self) -> &dyn Equivalence {
        self.equivalence.as_ref()
    }

    /// Returns the type service.
    #[must_use]
    pub fn types(&self) -> &dyn TypeService {
        self.types.as_ref()
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// Returns true if collections from both factories lay out their tries
    /// identically.
    pub(crate) fn same_hashing(&self, other: &Self) -> bool {
        self.equivalence.name() == other.equivalence.name()
    }

    // --- builders ---

    /// Starts a set builder that infers its element type.
    #[must_use]
    pub fn set_builder(&self) -> SetBuilder {
        SetBuilder::new(self.clone(), ElementType::inferring())
    }

    /// Starts a set builder with a declared element type.
    #[must_use]
    pub fn set_builder_of(&self, element: Type) -> SetBuilder {
        SetBuilder::new(self.clone(), ElementType::Declared(element))
    }

    /// Starts a map builder that infers its key and value types.
    #[must_use]
    pub fn map_builder(&self) -> MapBuilder {
        MapBuilder::new(self.clone(), ElementType::inferring(), ElementType::inferring())
    }

    /// Starts a map builder with declared key and value types.
    #[must_use]
    pub fn map_builder_of(&self, key: Type, value: Type) -> MapBuilder {
        MapBuilder::new(
            self.clone(),
            ElementType::Declared(key),
            ElementType::Declared(value),
        )
    }

    // --- collections ---

    /// Returns an empty set with an inferred element type.
    #[must_use]
    pub fn empty_set(&self) -> TcSet {
        TcSet::from_parts(Trie::new(), ElementType::inferring(), self.clone())
    }

    /// Returns an empty set with a declared element type.
    #[must_use]
    pub fn empty_set_of(&self, element: Type) -> TcSet {
        TcSet::from_parts(Trie::new(), ElementType::Declared(element), self.clone())
    }

    /// Returns an empty map with inferred types.
    #[must_use]
    pub fn empty_map(&self) -> TcMap {
        TcMap::from_parts(
            Trie::new(),
            ElementType::inferring(),
            ElementType::inferring(),
            self.clone(),
        )
    }

    /// Returns an empty map with declared key and value types.
    #[must_use]
    pub fn empty_map_of(&self, key: Type, value: Type) -> TcMap {
        TcMap::from_parts(
            Trie::new(),
            ElementType::Declared(key),
            ElementType::Declared(value),
            self.clone(),
        )
    }

    /// Creates a set from values, inferring the element type.
    pub fn set<I>(&self, values: I) -> TcSet
    where
        I: IntoIterator<Item = Value>,
    {
        let policy = self.equivalence();
        let mut trie = Trie::new();
        let mut element = Type::Void;
        let mut stats = BuildStats::default();
        for value in values {
            let ty = value.value_type();
            if trie.insert(value, (), false, policy, &mut stats).is_new() {
                element = self.types.lub(&element, &ty);
            }
        }
        TcSet::from_parts(trie, ElementType::Inferred(element), self.clone())
    }

    /// Creates a set with a declared element type.
    ///
    /// # Errors
    ///
    /// Returns a type mismatch naming the index of the first value that does
    /// not fit `element`.
    pub fn set_of<I>(&self, element: Type, values: I) -> Result<TcSet>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut builder = self.set_builder_of(element);
        builder.insert_all(values)?;
        Ok(builder.build())
    }

    /// Creates a map from entries, inferring key and value types. Later
    /// entries overwrite earlier ones with an equivalent key.
    pub fn map<I>(&self, entries: I) -> TcMap
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let policy = self.equivalence();
        let mut trie = Trie::new();
        let mut key_type = Type::Void;
        let mut value_type = Type::Void;
        let mut stats = BuildStats::default();
        for (key, value) in entries {
            key_type = self.types.lub(&key_type, &key.value_type());
            value_type = self.types.lub(&value_type, &value.value_type());
            trie.insert(key, value, true, policy, &mut stats);
        }
        TcMap::from_parts(
            trie,
            ElementType::Inferred(key_type),
            ElementType::Inferred(value_type),
            self.clone(),
        )
    }

    /// Creates a map with declared key and value types.
    ///
    /// # Errors
    ///
    /// Returns a type mismatch naming the index of the first entry that does
    /// not fit.
    pub fn map_of<I>(&self, key: Type, value: Type, entries: I) -> Result<TcMap>
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let mut builder = self.map_builder_of(key, value);
        builder.insert_all(entries)?;
        Ok(builder.build())
    }

    // --- scalars and terms ---

    /// Creates a tuple.
    #[must_use]
    pub fn tuple(&self, items: Vec<Value>) -> Value {
        Value::Tuple(items.into())
    }

    /// Creates an untyped node.
    #[must_use]
    pub fn node(&self, name: &str, children: Vec<Value>) -> Value {
        Value::Node(Arc::new(Node::new(Type::Node, name.into(), children)))
    }

    /// Applies a constructor to children, checking arity and field types.
    ///
    /// # Errors
    ///
    /// Returns an arity mismatch if the number of children differs from the
    /// declaration, or a type mismatch naming the first ill-typed child.
    pub fn constructor(&self, declaration: &Arc<ConstructorType>, children: Vec<Value>) -> Result<Value> {
        let operation = || format!("constructor {}", declaration.name);
        if children.len() != declaration.arity() {
            return Err(Error::arity_mismatch(declaration.arity(), children.len())
                .with_context(ErrorContext::new().with_operation(operation())));
        }
        for (i, (child, field)) in children.iter().zip(&declaration.fields).enumerate() {
            let actual = child.value_type();
            if !self.types.is_subtype(&actual, field) {
                return Err(Error::type_mismatch(field.clone(), actual).with_context(
                    ErrorContext::new().with_operation(operation()).with_index(i),
                ));
            }
        }
        Ok(Value::Node(Arc::new(Node::new(
            Type::Constructor(Arc::clone(declaration)),
            Arc::clone(&declaration.name),
            children,
        ))))
    }

    /// Opens a keyword-parameter overlay on a value.
    ///
    /// An overlaid value is unwrapped first, so overlays never nest.
    #[must_use]
    pub fn overlay(&self, value: Value) -> KeywordOverlay {
        KeywordOverlay::new(value, Arc::clone(&self.types))
    }
}

impl Default for ValueFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ValueFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueFactory")
            .field("equivalence", &self.equivalence.name())
            .field("types", &self.types)
            .field("config", &self.config)
            .finish()
    }
}
