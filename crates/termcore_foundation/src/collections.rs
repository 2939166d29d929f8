//! Persistent set and map values.
//!
//! Both wrap a [`Trie`] keyed by the factory's equivalence policy. Every
//! update returns a new collection that shares unchanged subtrees with the
//! original; the original is never modified.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::Result;
use crate::builder::{BuildStats, MapBuilder, SetBuilder};
use crate::equivalence::strict_hash;
use crate::factory::ValueFactory;
use crate::inference::ElementType;
use crate::trie::Trie;
use crate::types::Type;
use crate::value::Value;

/// Persistent hash set of values.
///
/// Cloning is O(1). Elements are unique under the policy of the factory that
/// created the set.
#[derive(Clone)]
pub struct TcSet {
    trie: Trie<()>,
    element_type: ElementType,
    factory: ValueFactory,
}

impl TcSet {
    pub(crate) fn from_parts(trie: Trie<()>, element_type: ElementType, factory: ValueFactory) -> Self {
        let element_type = if trie.len() == 0 {
            element_type.emptied()
        } else {
            element_type
        };
        Self {
            trie,
            element_type,
            factory,
        }
    }

    /// Creates an empty set with an inferred element type and default factory.
    #[must_use]
    pub fn new() -> Self {
        ValueFactory::default().empty_set()
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trie.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trie.len() == 0
    }

    /// Returns true if an equivalent element is present.
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.get(value).is_some()
    }

    /// Returns the stored element equivalent to `value`.
    #[must_use]
    pub fn get(&self, value: &Value) -> Option<&Value> {
        self.trie
            .get(value, self.factory.equivalence())
            .map(|(k, _)| k)
    }

    /// Returns true if a strictly equal element is present.
    pub(crate) fn contains_strictly(&self, value: &Value) -> bool {
        let hash = self.factory.equivalence().hash(value);
        self.trie.get_with(hash, |k| k == value).is_some()
    }

    /// Returns an iterator over the elements.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Value> {
        self.trie.iter().map(|(k, _)| k)
    }

    /// Returns the element type (declared, or inferred from the contents).
    #[must_use]
    pub const fn element_type(&self) -> &Type {
        self.element_type.ty()
    }

    /// Returns true if the element type was declared rather than inferred.
    #[must_use]
    pub const fn is_type_declared(&self) -> bool {
        self.element_type.is_declared()
    }

    /// Returns the factory this set was created with.
    #[must_use]
    pub const fn factory(&self) -> &ValueFactory {
        &self.factory
    }

    /// Returns true if both sets share the same root.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.trie.ptr_eq(&other.trie)
    }

    /// Returns a new set with the value inserted.
    ///
    /// # Errors
    ///
    /// Returns a type mismatch if the element type is declared and the
    /// value's type is not a subtype of it.
    pub fn insert(&self, value: Value) -> Result<Self> {
        let mut element_type = self.element_type.clone();
        element_type.admit(&value.value_type(), self.factory.types())?;
        if self.contains(&value) {
            return Ok(self.clone());
        }
        let mut trie = self.trie.clone();
        trie.insert(
            value,
            (),
            false,
            self.factory.equivalence(),
            &mut BuildStats::default(),
        );
        Ok(Self::from_parts(trie, element_type, self.factory.clone()))
    }

    /// Returns a new set with all values inserted.
    ///
    /// # Errors
    ///
    /// Fails without producing a set if any value is rejected; the error
    /// context carries the offending index.
    pub fn insert_all<I>(&self, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut builder = self.to_builder();
        builder.insert_all(values)?;
        Ok(builder.build())
    }

    /// Returns a new set with the value removed.
    #[must_use]
    pub fn remove(&self, value: &Value) -> Self {
        if !self.contains(value) {
            return self.clone();
        }
        let mut trie = self.trie.clone();
        trie.remove(value, self.factory.equivalence(), &mut BuildStats::default());
        Self::from_parts(trie, self.element_type.clone(), self.factory.clone())
    }

    /// Returns the union of this set and another.
    ///
    /// Elements present in both keep the representative from `self`.
    ///
    /// # Errors
    ///
    /// Returns a type mismatch if this set's element type is declared and the
    /// other set's element type does not fit it.
    pub fn union(&self, other: &Self) -> Result<Self> {
        let element_type = self
            .element_type
            .merged(&other.element_type, self.factory.types())?;
        if other.is_empty() || self.ptr_eq(other) {
            return Ok(self.clone());
        }
        let policy = self.factory.equivalence();
        let trie = if self.factory.same_hashing(&other.factory) {
            self.trie.union(&other.trie, policy, false)
        } else {
            let mut trie = self.trie.clone();
            let mut stats = BuildStats::default();
            for value in other.iter() {
                trie.insert(value.clone(), (), false, policy, &mut stats);
            }
            trie
        };
        Ok(Self::from_parts(trie, element_type, self.factory.clone()))
    }

    /// Returns the elements of this set also contained in `other`.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let trie = if self.factory.same_hashing(&other.factory) {
            self.trie.intersection(&other.trie, self.factory.equivalence())
        } else {
            self.filtered(|value| other.contains(value))
        };
        Self::from_parts(trie, self.element_type.clone(), self.factory.clone())
    }

    /// Returns the elements of this set not contained in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        let trie = if self.factory.same_hashing(&other.factory) {
            self.trie.difference(&other.trie, self.factory.equivalence())
        } else {
            self.filtered(|value| !other.contains(value))
        };
        Self::from_parts(trie, self.element_type.clone(), self.factory.clone())
    }

    fn filtered(&self, keep: impl Fn(&Value) -> bool) -> Trie<()> {
        let policy = self.factory.equivalence();
        let mut trie = Trie::new();
        let mut stats = BuildStats::default();
        for value in self.iter().filter(|v| keep(v)) {
            trie.insert(value.clone(), (), false, policy, &mut stats);
        }
        trie
    }

    /// Returns true if every element of this set is contained in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().all(|value| other.contains(value))
    }

    /// Starts a builder seeded with this set's contents and element type.
    #[must_use]
    pub fn to_builder(&self) -> SetBuilder {
        SetBuilder::from_parts(
            self.trie.clone(),
            self.element_type.clone(),
            self.factory.clone(),
        )
    }
}

impl Default for TcSet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TcSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Strict equality: same size and every element strictly equal to one in
/// `other`. Element types and policies are not compared.
impl PartialEq for TcSet {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.len() == other.len() && self.iter().all(|v| other.contains_strictly(v)))
    }
}

impl Eq for TcSet {}

impl Hash for TcSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        // Order-independent combination of element hashes.
        let sum = self
            .iter()
            .fold(0u64, |acc, v| acc.wrapping_add(strict_hash(v)));
        sum.hash(state);
    }
}

impl FromIterator<Value> for TcSet {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        ValueFactory::default().set(iter)
    }
}

impl<'a> IntoIterator for &'a TcSet {
    type Item = &'a Value;
    type IntoIter = Box<dyn ExactSizeIterator<Item = &'a Value> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Persistent hash map from values to values.
///
/// Cloning is O(1). Keys are unique under the policy of the factory that
/// created the map.
#[derive(Clone)]
pub struct TcMap {
    trie: Trie<Value>,
    key_type: ElementType,
    value_type: ElementType,
    factory: ValueFactory,
}

impl TcMap {
    pub(crate) fn from_parts(
        trie: Trie<Value>,
        key_type: ElementType,
        value_type: ElementType,
        factory: ValueFactory,
    ) -> Self {
        let (key_type, value_type) = if trie.len() == 0 {
            (key_type.emptied(), value_type.emptied())
        } else {
            (key_type, value_type)
        };
        Self {
            trie,
            key_type,
            value_type,
            factory,
        }
    }

    /// Creates an empty map with inferred types and the default factory.
    #[must_use]
    pub fn new() -> Self {
        ValueFactory::default().empty_map()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trie.len()
    }

    /// Returns true if the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trie.len() == 0
    }

    /// Gets a value by key.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Gets the stored key and value for a key.
    #[must_use]
    pub fn get_key_value(&self, key: &Value) -> Option<(&Value, &Value)> {
        self.trie
            .get(key, self.factory.equivalence())
            .map(|(k, v)| (k, v))
    }

    /// Returns true if the map contains the key.
    #[must_use]
    pub fn contains_key(&self, key: &Value) -> bool {
        self.get_key_value(key).is_some()
    }

    /// Returns an iterator over key-value pairs.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&Value, &Value)> {
        self.trie.iter()
    }

    /// Returns an iterator over keys.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &Value> {
        self.trie.iter().map(|(k, _)| k)
    }

    /// Returns an iterator over values.
    pub fn values(&self) -> impl ExactSizeIterator<Item = &Value> {
        self.trie.iter().map(|(_, v)| v)
    }

    /// Returns the key type.
    #[must_use]
    pub const fn key_type(&self) -> &Type {
        self.key_type.ty()
    }

    /// Returns the value type.
    #[must_use]
    pub const fn value_type(&self) -> &Type {
        self.value_type.ty()
    }

    /// Returns true if the key and value types were declared.
    ///
    /// Factories declare both or neither.
    #[must_use]
    pub const fn is_type_declared(&self) -> bool {
        self.key_type.is_declared() && self.value_type.is_declared()
    }

    /// Returns the factory this map was created with.
    #[must_use]
    pub const fn factory(&self) -> &ValueFactory {
        &self.factory
    }

    /// Returns true if both maps share the same root.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.trie.ptr_eq(&other.trie)
    }

    /// Returns a new map with the entry inserted, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a type mismatch if the key or value does not fit a declared
    /// type.
    pub fn insert(&self, key: Value, value: Value) -> Result<Self> {
        let types = self.factory.types();
        let mut key_type = self.key_type.clone();
        let mut value_type = self.value_type.clone();
        key_type.admit(&key.value_type(), types)?;
        value_type.admit(&value.value_type(), types)?;
        let mut trie = self.trie.clone();
        trie.insert(
            key,
            value,
            true,
            self.factory.equivalence(),
            &mut BuildStats::default(),
        );
        Ok(Self::from_parts(trie, key_type, value_type, self.factory.clone()))
    }

    /// Returns a new map with the key removed.
    #[must_use]
    pub fn remove(&self, key: &Value) -> Self {
        if !self.contains_key(key) {
            return self.clone();
        }
        let mut trie = self.trie.clone();
        trie.remove(key, self.factory.equivalence(), &mut BuildStats::default());
        Self::from_parts(
            trie,
            self.key_type.clone(),
            self.value_type.clone(),
            self.factory.clone(),
        )
    }

    /// Returns a new map that is the union of this map and another.
    ///
    /// If a key exists in both maps, the entry from `other` is used.
    ///
    /// # Errors
    ///
    /// Returns a type mismatch if this map's types are declared and the other
    /// map's types do not fit.
    pub fn union(&self, other: &Self) -> Result<Self> {
        let types = self.factory.types();
        let key_type = self.key_type.merged(&other.key_type, types)?;
        let value_type = self.value_type.merged(&other.value_type, types)?;
        if other.is_empty() || self.ptr_eq(other) {
            return Ok(self.clone());
        }
        let policy = self.factory.equivalence();
        let trie = if self.factory.same_hashing(&other.factory) {
            self.trie.union(&other.trie, policy, true)
        } else {
            let mut trie = self.trie.clone();
            let mut stats = BuildStats::default();
            for (k, v) in other.iter() {
                trie.insert(k.clone(), v.clone(), true, policy, &mut stats);
            }
            trie
        };
        Ok(Self::from_parts(trie, key_type, value_type, self.factory.clone()))
    }

    /// Starts a builder seeded with this map's contents and types.
    #[must_use]
    pub fn to_builder(&self) -> MapBuilder {
        MapBuilder::from_parts(
            self.trie.clone(),
            self.key_type.clone(),
            self.value_type.clone(),
            self.factory.clone(),
        )
    }
}

impl Default for TcMap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TcMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Strict equality: same size and, for every entry, a strictly equal key in
/// `other` bound to a strictly equal value.
impl PartialEq for TcMap {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let policy = other.factory.equivalence();
        self.len() == other.len()
            && self.iter().all(|(k, v)| {
                other
                    .trie
                    .get_with(policy.hash(k), |candidate| candidate == k)
                    .is_some_and(|(_, ov)| ov == v)
            })
    }
}

impl Eq for TcMap {}

impl Hash for TcMap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        let sum = self.iter().fold(0u64, |acc, (k, v)| {
            acc.wrapping_add(strict_hash(k).wrapping_mul(31).wrapping_add(strict_hash(v)))
        });
        sum.hash(state);
    }
}

impl FromIterator<(Value, Value)> for TcMap {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        ValueFactory::default().map(iter)
    }
}
