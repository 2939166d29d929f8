//! Hash-array mapped trie shared by [`TcSet`](crate::TcSet) and
//! [`TcMap`](crate::TcMap).
//!
//! Each level consumes 5 bits of a 64-bit digest (32-way fan-out, 13 levels).
//! Nodes are reference counted; every write goes through [`Arc::make_mut`], so
//! a node that is shared with a frozen root is copied while a node owned
//! exclusively by one builder is updated in place. Keys whose full digests
//! collide share a multi-entry leaf.

use std::sync::Arc;

use crate::builder::BuildStats;
use crate::equivalence::Equivalence;
use crate::value::Value;

/// Bits per trie level (5 → 32-way branching).
const BITS_PER_LEVEL: u32 = 5;

/// Largest shift at which a branch can exist (last level uses 4 bits).
const MAX_SHIFT: u32 = 60;

/// Extracts the 5-bit hash fragment at the given bit-shift depth.
#[inline]
const fn fragment(hash: u64, shift: u32) -> u32 {
    ((hash >> shift) & 0x1F) as u32
}

/// Returns the single-bit mask for the given fragment (0..31).
#[inline]
const fn mask(frag: u32) -> u32 {
    1 << frag
}

/// Returns the compact index of `bit` within `bitmap`.
#[inline]
const fn index(bitmap: u32, bit: u32) -> usize {
    (bitmap & (bit - 1)).count_ones() as usize
}

/// Iterates the set bits of a bitmap, lowest first.
fn bits(bitmap: u32) -> impl Iterator<Item = u32> {
    let mut remaining = bitmap;
    std::iter::from_fn(move || {
        if remaining == 0 {
            return None;
        }
        let bit = remaining & remaining.wrapping_neg();
        remaining &= remaining - 1;
        Some(bit)
    })
}

/// A trie node: a bitmap-indexed branch or a leaf of same-digest entries.
#[derive(Clone)]
pub(crate) enum TrieNode<V> {
    Branch {
        bitmap: u32,
        /// Number of entries in this subtree.
        len: usize,
        children: Vec<Arc<TrieNode<V>>>,
    },
    Leaf {
        hash: u64,
        /// Pairwise non-equivalent entries, all with digest `hash`.
        entries: Vec<(Value, V)>,
    },
}

/// Outcome of an insertion.
pub(crate) enum Inserted<V> {
    /// The key was not present.
    New,
    /// The key was present; its entry was replaced and the old value returned.
    Replaced(V),
    /// The key was present and left as is.
    Unchanged,
}

impl<V> Inserted<V> {
    pub(crate) const fn is_new(&self) -> bool {
        matches!(self, Self::New)
    }
}

impl<V> TrieNode<V> {
    fn empty() -> Self {
        Self::Branch {
            bitmap: 0,
            len: 0,
            children: Vec::new(),
        }
    }

    fn leaf(hash: u64, key: Value, value: V) -> Self {
        Self::Leaf {
            hash,
            entries: vec![(key, value)],
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Branch { len, .. } => *len,
            Self::Leaf { entries, .. } => entries.len(),
        }
    }

    const fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }

    /// Finds the entry with digest `hash` whose key satisfies `matches`,
    /// starting from a node located at `shift`.
    fn get<F>(&self, hash: u64, shift: u32, matches: F) -> Option<&(Value, V)>
    where
        F: Fn(&Value) -> bool,
    {
        let mut node = self;
        let mut shift = shift;
        loop {
            match node {
                Self::Branch {
                    bitmap, children, ..
                } => {
                    debug_assert!(shift <= MAX_SHIFT, "branch below maximum depth");
                    let bit = mask(fragment(hash, shift));
                    if bitmap & bit == 0 {
                        return None;
                    }
                    node = &children[index(*bitmap, bit)];
                    shift += BITS_PER_LEVEL;
                }
                Self::Leaf { hash: h, entries } => {
                    if *h != hash {
                        return None;
                    }
                    return entries.iter().find(|(k, _)| matches(k));
                }
            }
        }
    }
}

/// Returns a mutable reference to the node, copying it first if shared.
fn make_mut<'a, V: Clone>(
    node: &'a mut Arc<TrieNode<V>>,
    stats: &mut BuildStats,
) -> &'a mut TrieNode<V> {
    if Arc::get_mut(node).is_some() {
        stats.in_place += 1;
    } else {
        stats.copied += 1;
    }
    Arc::make_mut(node)
}

/// Builds the smallest branch at `shift` that separates two nodes with
/// different digests.
fn split<V>(
    shift: u32,
    a: Arc<TrieNode<V>>,
    a_hash: u64,
    b: Arc<TrieNode<V>>,
    b_hash: u64,
) -> TrieNode<V> {
    debug_assert!(shift <= MAX_SHIFT, "digests must differ before maximum depth");
    let fa = fragment(a_hash, shift);
    let fb = fragment(b_hash, shift);
    let len = a.len() + b.len();
    if fa == fb {
        TrieNode::Branch {
            bitmap: mask(fa),
            len,
            children: vec![Arc::new(split(shift + BITS_PER_LEVEL, a, a_hash, b, b_hash))],
        }
    } else {
        let children = if fa < fb { vec![a, b] } else { vec![b, a] };
        TrieNode::Branch {
            bitmap: mask(fa) | mask(fb),
            len,
            children,
        }
    }
}

/// Context shared by the recursive write operations.
struct Writer<'a> {
    policy: &'a dyn Equivalence,
    stats: &'a mut BuildStats,
}

impl Writer<'_> {
    /// Inserts into the node located at `shift`.
    fn insert<V: Clone>(
        &mut self,
        node: &mut Arc<TrieNode<V>>,
        shift: u32,
        hash: u64,
        key: Value,
        value: V,
        overwrite: bool,
    ) -> Inserted<V> {
        let policy = self.policy;
        let split_from = match node.as_ref() {
            TrieNode::Leaf { hash: existing, .. } if *existing != hash => Some(*existing),
            _ => None,
        };
        if let Some(existing) = split_from {
            let old = Arc::clone(node);
            let fresh = Arc::new(TrieNode::leaf(hash, key, value));
            *node = Arc::new(split(shift, old, existing, fresh, hash));
            return Inserted::New;
        }
        let present = matches!(
            node.as_ref(),
            TrieNode::Leaf { entries, .. } if entries.iter().any(|(k, _)| policy.equivalent(k, &key))
        );
        if present && !overwrite {
            return Inserted::Unchanged;
        }

        match make_mut(node, self.stats) {
            TrieNode::Branch {
                bitmap,
                len,
                children,
            } => {
                let bit = mask(fragment(hash, shift));
                let idx = index(*bitmap, bit);
                if *bitmap & bit == 0 {
                    children.insert(idx, Arc::new(TrieNode::leaf(hash, key, value)));
                    *bitmap |= bit;
                    *len += 1;
                    return Inserted::New;
                }
                let outcome = self.insert(
                    &mut children[idx],
                    shift + BITS_PER_LEVEL,
                    hash,
                    key,
                    value,
                    overwrite,
                );
                if outcome.is_new() {
                    *len += 1;
                }
                outcome
            }
            TrieNode::Leaf { entries, .. } => {
                match entries.iter_mut().find(|(k, _)| policy.equivalent(k, &key)) {
                    Some(slot) => {
                        let (_, old) = std::mem::replace(slot, (key, value));
                        Inserted::Replaced(old)
                    }
                    None => {
                        entries.push((key, value));
                        Inserted::New
                    }
                }
            }
        }
    }

    /// Removes from the branch located at `shift`.
    fn remove<V: Clone>(
        &mut self,
        node: &mut Arc<TrieNode<V>>,
        shift: u32,
        hash: u64,
        key: &Value,
    ) -> Option<(Value, V)> {
        let policy = self.policy;
        let TrieNode::Branch {
            bitmap,
            len,
            children,
        } = make_mut(node, self.stats)
        else {
            return None;
        };

        let bit = mask(fragment(hash, shift));
        if *bitmap & bit == 0 {
            return None;
        }
        let idx = index(*bitmap, bit);

        // (position, leaf size) when the slot holds a leaf.
        let in_leaf = match children[idx].as_ref() {
            TrieNode::Leaf { hash: h, entries } => {
                if *h != hash {
                    return None;
                }
                let pos = entries.iter().position(|(k, _)| policy.equivalent(k, key))?;
                Some((pos, entries.len()))
            }
            TrieNode::Branch { .. } => None,
        };

        let removed = match in_leaf {
            Some((_, 1)) => {
                let leaf = children.remove(idx);
                *bitmap &= !bit;
                *len -= 1;
                return match Arc::unwrap_or_clone(leaf) {
                    TrieNode::Leaf { mut entries, .. } => entries.pop(),
                    TrieNode::Branch { .. } => None,
                };
            }
            Some((pos, _)) => match make_mut(&mut children[idx], self.stats) {
                TrieNode::Leaf { entries, .. } => entries.swap_remove(pos),
                TrieNode::Branch { .. } => return None,
            },
            None => self.remove(&mut children[idx], shift + BITS_PER_LEVEL, hash, key)?,
        };

        *len -= 1;
        let child = &mut children[idx];
        if let Some(hoisted) = collapsed(child) {
            *child = hoisted;
        }
        Some(removed)
    }
}

/// Returns the only child of a branch if it is a leaf, so the leaf can be
/// hoisted one level up.
fn collapsed<V>(node: &Arc<TrieNode<V>>) -> Option<Arc<TrieNode<V>>> {
    match node.as_ref() {
        TrieNode::Branch { children, .. } if children.len() == 1 && children[0].is_leaf() => {
            Some(Arc::clone(&children[0]))
        }
        _ => None,
    }
}

/// A persistent trie: a root branch plus the operations on it.
#[derive(Clone)]
pub(crate) struct Trie<V> {
    root: Arc<TrieNode<V>>,
}

impl<V: Clone> Default for Trie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Trie<V> {
    pub(crate) fn new() -> Self {
        Self {
            root: Arc::new(TrieNode::empty()),
        }
    }

    /// Wraps the result of a merge as a root branch.
    fn from_node(node: Option<Arc<TrieNode<V>>>) -> Self {
        let root = match node {
            None => Arc::new(TrieNode::empty()),
            Some(node) => match node.as_ref() {
                TrieNode::Branch { .. } => node,
                TrieNode::Leaf { hash, entries } => Arc::new(TrieNode::Branch {
                    bitmap: mask(fragment(*hash, 0)),
                    len: entries.len(),
                    children: vec![node],
                }),
            },
        };
        Self { root }
    }

    pub(crate) fn len(&self) -> usize {
        self.root.len()
    }

    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }

    /// Looks up a key under the given policy.
    pub(crate) fn get(&self, key: &Value, policy: &dyn Equivalence) -> Option<&(Value, V)> {
        self.root
            .get(policy.hash(key), 0, |k| policy.equivalent(k, key))
    }

    /// Looks up a key by a precomputed digest and an arbitrary predicate.
    ///
    /// The predicate must only accept keys that are equivalent, under the
    /// policy that produced `hash`, to the key being searched.
    pub(crate) fn get_with<F>(&self, hash: u64, matches: F) -> Option<&(Value, V)>
    where
        F: Fn(&Value) -> bool,
    {
        self.root.get(hash, 0, matches)
    }

    pub(crate) fn insert(
        &mut self,
        key: Value,
        value: V,
        overwrite: bool,
        policy: &dyn Equivalence,
        stats: &mut BuildStats,
    ) -> Inserted<V> {
        let hash = policy.hash(&key);
        Writer { policy, stats }.insert(&mut self.root, 0, hash, key, value, overwrite)
    }

    pub(crate) fn remove(
        &mut self,
        key: &Value,
        policy: &dyn Equivalence,
        stats: &mut BuildStats,
    ) -> Option<(Value, V)> {
        // Absent keys must not trigger path copying.
        self.get(key, policy)?;
        let hash = policy.hash(key);
        Writer { policy, stats }.remove(&mut self.root, 0, hash, key)
    }

    pub(crate) fn iter(&self) -> Iter<'_, V> {
        Iter::new(&self.root)
    }

    /// Union of two tries built with the same policy. On conflicting keys the
    /// entry from `other` wins if `prefer_other` is set.
    pub(crate) fn union(&self, other: &Self, policy: &dyn Equivalence, prefer_other: bool) -> Self {
        let mut stats = BuildStats::default();
        let mut merge = Merge {
            policy,
            stats: &mut stats,
            prefer_other,
        };
        let (root, _) = merge.union(&self.root, &other.root, 0);
        Self { root }
    }

    /// Entries of `self` whose keys are also in `other`.
    pub(crate) fn intersection(&self, other: &Self, policy: &dyn Equivalence) -> Self {
        let mut stats = BuildStats::default();
        let mut merge = Merge {
            policy,
            stats: &mut stats,
            prefer_other: false,
        };
        Self::from_node(merge.intersection(&self.root, &other.root, 0))
    }

    /// Entries of `self` whose keys are not in `other`.
    pub(crate) fn difference(&self, other: &Self, policy: &dyn Equivalence) -> Self {
        let mut stats = BuildStats::default();
        let mut merge = Merge {
            policy,
            stats: &mut stats,
            prefer_other: false,
        };
        Self::from_node(merge.difference(&self.root, &other.root, 0))
    }
}

// ---------------------------------------------------------------------------
// Structural set operations
// ---------------------------------------------------------------------------

/// Recursive merges over two tries keyed by the same digest function.
///
/// Pointer-equal subtrees are resolved without traversal, and subtrees that
/// only one side populates are reused as is.
struct Merge<'a> {
    policy: &'a dyn Equivalence,
    stats: &'a mut BuildStats,
    prefer_other: bool,
}

impl Merge<'_> {
    fn writer(&mut self) -> Writer<'_> {
        Writer {
            policy: self.policy,
            stats: &mut *self.stats,
        }
    }

    /// Returns the merged node and the number of keys present on both sides.
    fn union<V: Clone>(
        &mut self,
        a: &Arc<TrieNode<V>>,
        b: &Arc<TrieNode<V>>,
        shift: u32,
    ) -> (Arc<TrieNode<V>>, usize) {
        if Arc::ptr_eq(a, b) {
            return (Arc::clone(a), a.len());
        }

        match (a.as_ref(), b.as_ref()) {
            (
                TrieNode::Branch {
                    bitmap: ba,
                    len: la,
                    children: ca,
                },
                TrieNode::Branch {
                    bitmap: bb,
                    len: lb,
                    children: cb,
                },
            ) => {
                let bitmap = ba | bb;
                let mut children = Vec::with_capacity(bitmap.count_ones() as usize);
                let mut overlap = 0;
                let mut reused = true;
                for bit in bits(bitmap) {
                    match (ba & bit != 0, bb & bit != 0) {
                        (true, false) => children.push(Arc::clone(&ca[index(*ba, bit)])),
                        (false, true) => {
                            reused = false;
                            children.push(Arc::clone(&cb[index(*bb, bit)]));
                        }
                        _ => {
                            let left = &ca[index(*ba, bit)];
                            let (child, both) =
                                self.union(left, &cb[index(*bb, bit)], shift + BITS_PER_LEVEL);
                            reused &= Arc::ptr_eq(&child, left);
                            overlap += both;
                            children.push(child);
                        }
                    }
                }
                if reused {
                    return (Arc::clone(a), overlap);
                }
                let node = TrieNode::Branch {
                    bitmap,
                    len: la + lb - overlap,
                    children,
                };
                (Arc::new(node), overlap)
            }
            (TrieNode::Leaf { hash, entries }, _) => {
                // Fold the small side into the other one.
                let mut result = Arc::clone(b);
                let overwrite = !self.prefer_other;
                let mut overlap = 0;
                for (key, value) in entries {
                    let outcome =
                        self.writer()
                            .insert(&mut result, shift, *hash, key.clone(), value.clone(), overwrite);
                    if !outcome.is_new() {
                        overlap += 1;
                    }
                }
                (result, overlap)
            }
            (TrieNode::Branch { .. }, TrieNode::Leaf { hash, entries }) => {
                let mut result = Arc::clone(a);
                let overwrite = self.prefer_other;
                let mut overlap = 0;
                for (key, value) in entries {
                    let outcome =
                        self.writer()
                            .insert(&mut result, shift, *hash, key.clone(), value.clone(), overwrite);
                    if !outcome.is_new() {
                        overlap += 1;
                    }
                }
                (result, overlap)
            }
        }
    }

    fn intersection<V: Clone>(
        &mut self,
        a: &Arc<TrieNode<V>>,
        b: &Arc<TrieNode<V>>,
        shift: u32,
    ) -> Option<Arc<TrieNode<V>>> {
        if Arc::ptr_eq(a, b) {
            return Some(Arc::clone(a));
        }
        let policy = self.policy;

        match (a.as_ref(), b.as_ref()) {
            (
                TrieNode::Branch {
                    bitmap: ba,
                    children: ca,
                    ..
                },
                TrieNode::Branch {
                    bitmap: bb,
                    children: cb,
                    ..
                },
            ) => {
                let mut bitmap = 0;
                let mut children = Vec::new();
                let mut reused = *ba == ba & bb;
                for bit in bits(ba & bb) {
                    let left = &ca[index(*ba, bit)];
                    match self.intersection(left, &cb[index(*bb, bit)], shift + BITS_PER_LEVEL) {
                        Some(child) => {
                            reused &= Arc::ptr_eq(&child, left);
                            bitmap |= bit;
                            children.push(child);
                        }
                        None => reused = false,
                    }
                }
                if reused {
                    return Some(Arc::clone(a));
                }
                rebuild(bitmap, children)
            }
            (TrieNode::Leaf { hash, entries }, _) => {
                let kept: Vec<_> = entries
                    .iter()
                    .filter(|(k, _)| b.get(*hash, shift, |x| policy.equivalent(x, k)).is_some())
                    .cloned()
                    .collect();
                filtered_leaf(a, *hash, entries.len(), kept)
            }
            (TrieNode::Branch { .. }, TrieNode::Leaf { hash, entries }) => {
                let kept: Vec<_> = entries
                    .iter()
                    .filter_map(|(k, _)| a.get(*hash, shift, |x| policy.equivalent(x, k)))
                    .cloned()
                    .collect();
                if kept.is_empty() {
                    None
                } else {
                    Some(Arc::new(TrieNode::Leaf {
                        hash: *hash,
                        entries: kept,
                    }))
                }
            }
        }
    }

    fn difference<V: Clone>(
        &mut self,
        a: &Arc<TrieNode<V>>,
        b: &Arc<TrieNode<V>>,
        shift: u32,
    ) -> Option<Arc<TrieNode<V>>> {
        if Arc::ptr_eq(a, b) {
            return None;
        }
        let policy = self.policy;

        match (a.as_ref(), b.as_ref()) {
            (
                TrieNode::Branch {
                    bitmap: ba,
                    children: ca,
                    ..
                },
                TrieNode::Branch {
                    bitmap: bb,
                    children: cb,
                    ..
                },
            ) => {
                let mut bitmap = 0;
                let mut children = Vec::new();
                let mut reused = true;
                for bit in bits(*ba) {
                    let left = &ca[index(*ba, bit)];
                    if bb & bit == 0 {
                        bitmap |= bit;
                        children.push(Arc::clone(left));
                        continue;
                    }
                    match self.difference(left, &cb[index(*bb, bit)], shift + BITS_PER_LEVEL) {
                        Some(child) => {
                            reused &= Arc::ptr_eq(&child, left);
                            bitmap |= bit;
                            children.push(child);
                        }
                        None => reused = false,
                    }
                }
                if reused {
                    return Some(Arc::clone(a));
                }
                rebuild(bitmap, children)
            }
            (TrieNode::Leaf { hash, entries }, _) => {
                let kept: Vec<_> = entries
                    .iter()
                    .filter(|(k, _)| b.get(*hash, shift, |x| policy.equivalent(x, k)).is_none())
                    .cloned()
                    .collect();
                filtered_leaf(a, *hash, entries.len(), kept)
            }
            (TrieNode::Branch { .. }, TrieNode::Leaf { hash, entries }) => {
                let mut result = Arc::clone(a);
                for (key, _) in entries {
                    if result.get(*hash, shift, |x| policy.equivalent(x, key)).is_some() {
                        self.writer().remove(&mut result, shift, *hash, key);
                    }
                }
                if result.len() == 0 {
                    None
                } else {
                    Some(collapsed(&result).unwrap_or(result))
                }
            }
        }
    }
}

/// Assembles a branch from merged children, hoisting a lone leaf.
fn rebuild<V>(bitmap: u32, children: Vec<Arc<TrieNode<V>>>) -> Option<Arc<TrieNode<V>>> {
    match children.len() {
        0 => None,
        1 if children[0].is_leaf() => children.into_iter().next(),
        _ => {
            let len = children.iter().map(|c| c.len()).sum();
            Some(Arc::new(TrieNode::Branch {
                bitmap,
                len,
                children,
            }))
        }
    }
}

/// Result of filtering a leaf: the original if nothing was dropped.
fn filtered_leaf<V>(
    original: &Arc<TrieNode<V>>,
    hash: u64,
    before: usize,
    kept: Vec<(Value, V)>,
) -> Option<Arc<TrieNode<V>>> {
    if kept.is_empty() {
        None
    } else if kept.len() == before {
        Some(Arc::clone(original))
    } else {
        Some(Arc::new(TrieNode::Leaf {
            hash,
            entries: kept,
        }))
    }
}

// ---------------------------------------------------------------------------
// Iteration
// ---------------------------------------------------------------------------

/// Depth-first iterator over trie entries.
pub(crate) struct Iter<'a, V> {
    stack: Vec<std::slice::Iter<'a, Arc<TrieNode<V>>>>,
    leaf: std::slice::Iter<'a, (Value, V)>,
    remaining: usize,
}

impl<'a, V> Iter<'a, V> {
    fn new(root: &'a TrieNode<V>) -> Self {
        let (stack, leaf) = match root {
            TrieNode::Branch { children, .. } => (vec![children.iter()], Default::default()),
            TrieNode::Leaf { entries, .. } => (Vec::new(), entries.iter()),
        };
        Self {
            stack,
            leaf,
            remaining: root.len(),
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a Value, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((key, value)) = self.leaf.next() {
                self.remaining -= 1;
                return Some((key, value));
            }
            let top = self.stack.last_mut()?;
            match top.next() {
                None => {
                    self.stack.pop();
                }
                Some(child) => match child.as_ref() {
                    TrieNode::Branch { children, .. } => self.stack.push(children.iter()),
                    TrieNode::Leaf { entries, .. } => self.leaf = entries.iter(),
                },
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}
