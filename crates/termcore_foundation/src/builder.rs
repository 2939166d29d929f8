//! Transient builders for sets and maps.
//!
//! A builder owns a private trie root. Trie nodes reachable only from that
//! root are updated in place; nodes shared with a snapshot or with the
//! collection the builder was seeded from are copied on first write.
//! [`finalize`](SetBuilder::finalize) freezes the builder: the result is
//! memoized, every later call returns the same collection, and any further
//! mutation fails with [`ErrorKind::FinalizedMutation`](crate::ErrorKind).

use std::fmt;

use crate::Result;
use crate::collections::{TcMap, TcSet};
use crate::error::{Error, ErrorContext};
use crate::factory::ValueFactory;
use crate::inference::ElementType;
use crate::trie::{Inserted, Trie};
use crate::types::Type;
use crate::value::Value;

/// Counters describing the work a builder has done.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Nodes updated in place because the builder owned them exclusively.
    pub in_place: u64,
    /// Nodes copied because they were shared.
    pub copied: u64,
    /// Elements or keys added that were not already present.
    pub inserted: u64,
    /// Elements or entries rejected by a type check.
    pub rejected: u64,
}

impl fmt::Display for BuildStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted, {} rejected, {} nodes in place, {} copied",
            self.inserted, self.rejected, self.in_place, self.copied
        )
    }
}

fn finalized_error(operation: &str) -> Error {
    Error::finalized().with_context(ErrorContext::new().with_operation(operation))
}

fn at(error: Error, operation: &str, index: usize) -> Error {
    error.with_context(ErrorContext::new().with_operation(operation).with_index(index))
}

// =============================================================================
// SetBuilder
// =============================================================================

enum SetState {
    Building {
        trie: Trie<()>,
        element_type: ElementType,
    },
    Done(TcSet),
}

/// Mutable accumulator that produces a [`TcSet`].
///
/// ```
/// use termcore_foundation::{Value, ValueFactory};
///
/// let factory = ValueFactory::new();
/// let mut builder = factory.set_builder();
/// builder.insert(Value::Int(1)).unwrap();
/// builder.insert(Value::Int(2)).unwrap();
/// let set = builder.finalize();
/// assert_eq!(set.len(), 2);
/// assert!(builder.insert(Value::Int(3)).is_err());
/// ```
pub struct SetBuilder {
    state: SetState,
    factory: ValueFactory,
    stats: BuildStats,
}

impl SetBuilder {
    pub(crate) fn new(factory: ValueFactory, element_type: ElementType) -> Self {
        Self::from_parts(Trie::new(), element_type, factory)
    }

    pub(crate) fn from_parts(trie: Trie<()>, element_type: ElementType, factory: ValueFactory) -> Self {
        Self {
            state: SetState::Building { trie, element_type },
            factory,
            stats: BuildStats::default(),
        }
    }

    /// Inserts a value. Returns true if it was not already present.
    ///
    /// # Errors
    ///
    /// Fails if the builder is finalized, or if the element type is declared
    /// and the value's type does not fit it.
    pub fn insert(&mut self, value: Value) -> Result<bool> {
        let SetState::Building { trie, element_type } = &mut self.state else {
            return Err(finalized_error("insert"));
        };
        if let Err(e) = element_type.admit(&value.value_type(), self.factory.types()) {
            self.stats.rejected += 1;
            return Err(e.with_context(ErrorContext::new().with_operation("insert")));
        }
        let added = trie
            .insert(value, (), false, self.factory.equivalence(), &mut self.stats)
            .is_new();
        if added {
            self.stats.inserted += 1;
        }
        Ok(added)
    }

    /// Inserts every value, or none of them.
    ///
    /// All values are type-checked before the first one is inserted. Returns
    /// the number of values that were not already present.
    ///
    /// # Errors
    ///
    /// Fails if the builder is finalized or if any value is rejected; the
    /// error context names the index of the first rejected value.
    pub fn insert_all<I>(&mut self, values: I) -> Result<usize>
    where
        I: IntoIterator<Item = Value>,
    {
        let SetState::Building { trie, element_type } = &mut self.state else {
            return Err(finalized_error("insert_all"));
        };
        let values: Vec<Value> = values.into_iter().collect();
        let types = self.factory.types();

        let mut widened = element_type.clone();
        for (i, value) in values.iter().enumerate() {
            if let Err(e) = widened.admit(&value.value_type(), types) {
                self.stats.rejected += 1;
                return Err(at(e, "insert_all", i));
            }
        }
        *element_type = widened;

        let policy = self.factory.equivalence();
        let mut added = 0;
        for value in values {
            if trie.insert(value, (), false, policy, &mut self.stats).is_new() {
                added += 1;
            }
        }
        self.stats.inserted += added as u64;
        Ok(added)
    }

    /// Removes a value. Returns true if it was present.
    ///
    /// # Errors
    ///
    /// Fails if the builder is finalized.
    pub fn remove(&mut self, value: &Value) -> Result<bool> {
        let SetState::Building { trie, element_type } = &mut self.state else {
            return Err(finalized_error("remove"));
        };
        let removed = trie
            .remove(value, self.factory.equivalence(), &mut self.stats)
            .is_some();
        if trie.len() == 0 {
            *element_type = element_type.emptied();
        }
        Ok(removed)
    }

    /// Returns true if an equivalent value has been inserted.
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        match &self.state {
            SetState::Building { trie, .. } => trie.get(value, self.factory.equivalence()).is_some(),
            SetState::Done(set) => set.contains(value),
        }
    }

    /// Returns the number of elements accumulated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.state {
            SetState::Building { trie, .. } => trie.len(),
            SetState::Done(set) => set.len(),
        }
    }

    /// Returns true if no elements have been accumulated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the current element type.
    #[must_use]
    pub fn element_type(&self) -> &Type {
        match &self.state {
            SetState::Building { element_type, .. } => element_type.ty(),
            SetState::Done(set) => set.element_type(),
        }
    }

    /// Returns true once [`finalize`](Self::finalize) has been called.
    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        matches!(self.state, SetState::Done(_))
    }

    /// Returns the work counters, if the factory collects them.
    #[must_use]
    pub fn stats(&self) -> Option<BuildStats> {
        self.factory.config().collect_build_stats.then_some(self.stats)
    }

    /// Returns a persistent view of the current contents.
    ///
    /// The builder stays open. Nodes now shared with the snapshot are copied
    /// by later writes, so the snapshot never changes.
    #[must_use]
    pub fn snapshot(&self) -> TcSet {
        match &self.state {
            SetState::Building { trie, element_type } => {
                TcSet::from_parts(trie.clone(), element_type.clone(), self.factory.clone())
            }
            SetState::Done(set) => set.clone(),
        }
    }

    /// Freezes the builder and returns the set.
    ///
    /// Repeated calls return the same set (sharing one root).
    pub fn finalize(&mut self) -> TcSet {
        let set = match &self.state {
            SetState::Done(set) => return set.clone(),
            SetState::Building { trie, element_type } => {
                TcSet::from_parts(trie.clone(), element_type.clone(), self.factory.clone())
            }
        };
        self.state = SetState::Done(set.clone());
        set
    }

    /// Consumes the builder and returns the set.
    #[must_use]
    pub fn build(mut self) -> TcSet {
        self.finalize()
    }
}

impl fmt::Debug for SetBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetBuilder")
            .field("len", &self.len())
            .field("element_type", self.element_type())
            .field("finalized", &self.is_finalized())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// MapBuilder
// =============================================================================

enum MapState {
    Building {
        trie: Trie<Value>,
        key_type: ElementType,
        value_type: ElementType,
    },
    Done(TcMap),
}

/// Mutable accumulator that produces a [`TcMap`].
pub struct MapBuilder {
    state: MapState,
    factory: ValueFactory,
    stats: BuildStats,
}

impl MapBuilder {
    pub(crate) fn new(factory: ValueFactory, key_type: ElementType, value_type: ElementType) -> Self {
        Self::from_parts(Trie::new(), key_type, value_type, factory)
    }

    pub(crate) fn from_parts(
        trie: Trie<Value>,
        key_type: ElementType,
        value_type: ElementType,
        factory: ValueFactory,
    ) -> Self {
        Self {
            state: MapState::Building {
                trie,
                key_type,
                value_type,
            },
            factory,
            stats: BuildStats::default(),
        }
    }

    /// Inserts an entry, returning the value previously bound to the key.
    ///
    /// # Errors
    ///
    /// Fails if the builder is finalized, or if the key or value does not fit
    /// a declared type.
    pub fn insert(&mut self, key: Value, value: Value) -> Result<Option<Value>> {
        let MapState::Building {
            trie,
            key_type,
            value_type,
        } = &mut self.state
        else {
            return Err(finalized_error("insert"));
        };
        let types = self.factory.types();
        let mut widened_key = key_type.clone();
        let mut widened_value = value_type.clone();
        let checked = widened_key
            .admit(&key.value_type(), types)
            .and_then(|()| widened_value.admit(&value.value_type(), types));
        if let Err(e) = checked {
            self.stats.rejected += 1;
            return Err(e.with_context(ErrorContext::new().with_operation("insert")));
        }
        *key_type = widened_key;
        *value_type = widened_value;

        Ok(
            match trie.insert(key, value, true, self.factory.equivalence(), &mut self.stats) {
                Inserted::Replaced(old) => Some(old),
                Inserted::New => {
                    self.stats.inserted += 1;
                    None
                }
                Inserted::Unchanged => None,
            },
        )
    }

    /// Inserts every entry, or none of them.
    ///
    /// # Errors
    ///
    /// Fails if the builder is finalized or if any entry is rejected; the
    /// error context names the index of the first rejected entry.
    pub fn insert_all<I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let MapState::Building {
            trie,
            key_type,
            value_type,
        } = &mut self.state
        else {
            return Err(finalized_error("insert_all"));
        };
        let entries: Vec<(Value, Value)> = entries.into_iter().collect();
        let types = self.factory.types();

        let mut widened_key = key_type.clone();
        let mut widened_value = value_type.clone();
        for (i, (k, v)) in entries.iter().enumerate() {
            let checked = widened_key
                .admit(&k.value_type(), types)
                .and_then(|()| widened_value.admit(&v.value_type(), types));
            if let Err(e) = checked {
                self.stats.rejected += 1;
                return Err(at(e, "insert_all", i));
            }
        }
        *key_type = widened_key;
        *value_type = widened_value;

        let policy = self.factory.equivalence();
        for (k, v) in entries {
            if trie.insert(k, v, true, policy, &mut self.stats).is_new() {
                self.stats.inserted += 1;
            }
        }
        Ok(())
    }

    /// Removes a key, returning its value if it was present.
    ///
    /// # Errors
    ///
    /// Fails if the builder is finalized.
    pub fn remove(&mut self, key: &Value) -> Result<Option<Value>> {
        let MapState::Building {
            trie,
            key_type,
            value_type,
        } = &mut self.state
        else {
            return Err(finalized_error("remove"));
        };
        let removed = trie
            .remove(key, self.factory.equivalence(), &mut self.stats)
            .map(|(_, v)| v);
        if trie.len() == 0 {
            *key_type = key_type.emptied();
            *value_type = value_type.emptied();
        }
        Ok(removed)
    }

    /// Gets the value currently bound to a key.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        match &self.state {
            MapState::Building { trie, .. } => trie
                .get(key, self.factory.equivalence())
                .map(|(_, v)| v),
            MapState::Done(map) => map.get(key),
        }
    }

    /// Returns true if the key is bound.
    #[must_use]
    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    /// Returns the number of entries accumulated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.state {
            MapState::Building { trie, .. } => trie.len(),
            MapState::Done(map) => map.len(),
        }
    }

    /// Returns true if no entries have been accumulated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true once [`finalize`](Self::finalize) has been called.
    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        matches!(self.state, MapState::Done(_))
    }

    /// Returns the work counters, if the factory collects them.
    #[must_use]
    pub fn stats(&self) -> Option<BuildStats> {
        self.factory.config().collect_build_stats.then_some(self.stats)
    }

    /// Returns a persistent view of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> TcMap {
        match &self.state {
            MapState::Building {
                trie,
                key_type,
                value_type,
            } => TcMap::from_parts(
                trie.clone(),
                key_type.clone(),
                value_type.clone(),
                self.factory.clone(),
            ),
            MapState::Done(map) => map.clone(),
        }
    }

    /// Freezes the builder and returns the map.
    ///
    /// Repeated calls return the same map.
    pub fn finalize(&mut self) -> TcMap {
        if let MapState::Done(map) = &self.state {
            return map.clone();
        }
        let map = self.snapshot();
        self.state = MapState::Done(map.clone());
        map
    }

    /// Consumes the builder and returns the map.
    #[must_use]
    pub fn build(mut self) -> TcMap {
        self.finalize()
    }
}

impl fmt::Debug for MapBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapBuilder")
            .field("len", &self.len())
            .field("finalized", &self.is_finalized())
            .finish_non_exhaustive()
    }
}
