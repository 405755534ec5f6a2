//! HashMap: facade composing hash adapter, bucket table, chain store and
//! growth controller.

use crate::bucket_table::BucketTable;
use crate::chain_store::{ChainStore, Entry, Position};
use crate::cursor::{Cursor, IntoIter, Iter, IterMut, Keys, Stamp, Values, ValuesMut};
use crate::error::{MapError, Result};
use crate::growth::{GrowthController, GrowthPolicy};
use crate::hasher::{DefaultHashBuilder, HashAdapter};
use crate::reentrancy::ScanGuard;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::sync::atomic::{AtomicU64, Ordering};
use log::{debug, trace};

// Source of per-map ids; cursors remember the id of the map that minted them.
static NEXT_MAP_ID: AtomicU64 = AtomicU64::new(0);

fn next_map_id() -> u64 {
    NEXT_MAP_ID.fetch_add(1, Ordering::Relaxed)
}

/// A separately chained hash map with unique keys.
///
/// Inserting a key that is already present leaves the stored value
/// untouched. Iteration runs over chains in the order they were created,
/// then over each chain's entries in insertion order.
///
/// The map is single-threaded: it is never `Sync`.
pub struct HashMap<K, V, S = DefaultHashBuilder> {
    id: u64,
    hasher: HashAdapter<S>,
    growth: GrowthController,
    guard: ScanGuard,
    buckets: Buckets<K, V>,
}

/// Bucket table plus the chain store it indexes. Everything here works on
/// precomputed hashes; user `Hash` is only called by the facade.
struct Buckets<K, V> {
    table: BucketTable,
    chains: ChainStore<K, V>,
    len: usize,
    // Bumped by every operation that moves or drops entries; stamps cursors.
    epoch: u64,
}

impl<K, V> Buckets<K, V> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            table: BucketTable::with_capacity(capacity),
            chains: ChainStore::new(),
            len: 0,
            epoch: 0,
        }
    }

    /// Drop everything and start over with `capacity` empty slots.
    fn reset(&mut self, capacity: usize) {
        self.chains.clear();
        self.table.reset(capacity);
        self.len = 0;
        self.epoch += 1;
    }

    /// Place `entry` at the end of its addressed chain without looking for
    /// an equal key. Callers guarantee the key is not present, so no user
    /// `Eq` runs here.
    fn append(&mut self, entry: Entry<K, V>) -> Position {
        let slot = self.table.slot_for(entry.hash);
        let at = match self.table.get(slot) {
            Some(chain) => self.chains.push(chain, entry),
            None => {
                let chain = self.chains.create(entry);
                self.table.bind(slot, chain);
                trace!("created chain at slot {slot}");
                Position { chain, entry: 0 }
            }
        };
        self.len += 1;
        at
    }

    fn take(&mut self, at: Position) -> Option<Entry<K, V>> {
        let (entry, emptied) = self.chains.remove(at)?;
        if emptied {
            let slot = self.table.slot_for(entry.hash);
            self.table.unbind(slot);
            trace!("released chain at slot {slot}");
        }
        self.len -= 1;
        self.epoch += 1;
        Some(entry)
    }
}

impl<K: Eq, V> Buckets<K, V> {
    fn locate<Q>(&self, hash: u64, q: &Q) -> Option<Position>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let chain = self.table.get(self.table.slot_for(hash))?;
        let entry = self
            .chains
            .entries(chain)?
            .iter()
            .position(|e| e.hash == hash && e.key.borrow() == q)?;
        Some(Position { chain, entry })
    }

    /// Insert into the current table without evaluating growth. Returns the
    /// entry's position and whether it was newly added.
    fn insert_hashed(&mut self, hash: u64, key: K, value: V) -> (Position, bool) {
        if let Some(at) = self.locate(hash, &key) {
            return (at, false);
        }
        (self.append(Entry { key, value, hash }), true)
    }

    /// Consult `growth` after an insertion and rebuild if it fires. `follow`
    /// is translated to its position after the rebuild.
    fn grow(&mut self, growth: GrowthController, follow: Position) -> Position {
        match growth.grow_to(self.len, self.table.capacity()) {
            Some(capacity) => self.rehash(capacity, Some(follow)).unwrap_or(follow),
            None => follow,
        }
    }

    /// Rebuild table and chain store at `capacity`, appending every entry in
    /// iteration order. Keys are already unique and carry their cached hash,
    /// so neither `Hash` nor `Eq` of the key runs during the rebuild.
    fn rehash(&mut self, capacity: usize, follow: Option<Position>) -> Option<Position> {
        debug!(
            "rehash: capacity {} -> {capacity}, {} entries",
            self.table.capacity(),
            self.len
        );
        let old = core::mem::take(&mut self.chains);
        let expected = self.len;
        self.reset(capacity);

        let mut followed = None;
        for (from, e) in old.drain() {
            let to = self.append(e);
            if follow == Some(from) {
                followed = Some(to);
            }
        }
        debug_assert_eq!(self.len, expected);
        followed
    }
}

impl<K, V> HashMap<K, V, DefaultHashBuilder>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Empty map whose bucket table starts at `capacity` slots (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self::build(
            HashAdapter::new(DefaultHashBuilder::default()),
            GrowthController::default(),
            capacity,
        )
    }

    pub fn with_growth_policy(policy: GrowthPolicy) -> Self {
        Self::with_hasher_and_policy(DefaultHashBuilder::default(), policy)
    }
}

impl<K, V> Default for HashMap<K, V, DefaultHashBuilder>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> HashMap<K, V, S> {
    fn build(hasher: HashAdapter<S>, growth: GrowthController, capacity: usize) -> Self {
        Self {
            id: next_map_id(),
            hasher,
            growth,
            guard: ScanGuard::new(),
            buckets: Buckets::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buckets.len
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.len == 0
    }

    /// Number of bucket slots currently allocated.
    pub fn capacity(&self) -> usize {
        self.buckets.table.capacity()
    }

    pub fn growth_policy(&self) -> GrowthPolicy {
        self.growth.policy()
    }

    /// Identity of this map and its current epoch, as recorded in cursors.
    pub(crate) fn stamp(&self) -> Stamp {
        Stamp {
            owner: self.id,
            epoch: self.buckets.epoch,
        }
    }

    pub(crate) fn store(&self) -> &ChainStore<K, V> {
        &self.buckets.chains
    }

    pub(crate) fn store_mut(&mut self) -> &mut ChainStore<K, V> {
        &mut self.buckets.chains
    }

    /// Cursor at the first entry, or [`Cursor::END`] when empty.
    pub fn begin(&self) -> Cursor {
        let first = self.store().head().map(|chain| Position { chain, entry: 0 });
        Cursor::from_position(first, self.stamp())
    }

    pub fn end(&self) -> Cursor {
        Cursor::END
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.buckets.chains.walk(), self.buckets.len)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let len = self.buckets.len;
        IterMut::new(self.buckets.chains.walk_mut(), len)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Drop every entry and chain. The table returns to a single bucket and
    /// all outstanding cursors become stale.
    pub fn clear(&mut self) {
        trace!(
            "clear: dropping {} entries in {} chains",
            self.buckets.len,
            self.buckets.chains.chain_count()
        );
        self.buckets.reset(1);
    }

    /// Remove the entry under `cursor`, returning it. Stale and end cursors
    /// remove nothing.
    pub fn remove_at(&mut self, cursor: Cursor) -> Option<(K, V)> {
        let at = cursor.position(self)?;
        let e = self.buckets.take(at)?;
        Some((e.key, e.value))
    }
}

#[cfg(test)]
impl<K, V, S> HashMap<K, V, S> {
    pub(crate) fn occupied_slots(&self) -> usize {
        self.buckets.table.occupied()
    }

    pub(crate) fn chain_count(&self) -> usize {
        self.buckets.chains.chain_count()
    }

    /// Every entry sits in the chain bound to the slot its hash addresses.
    pub(crate) fn placement_ok(&self) -> bool {
        let b = &self.buckets;
        let mut pos = b.chains.head().map(|chain| Position { chain, entry: 0 });
        while let Some(at) = pos {
            let Some(e) = b.chains.entry(at) else {
                return false;
            };
            if b.table.get(b.table.slot_for(e.hash)) != Some(at.chain) {
                return false;
            }
            pos = b.chains.step(at);
        }
        true
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_hasher_and_policy(hasher, GrowthPolicy::default())
    }

    pub fn with_hasher_and_policy(hasher: S, policy: GrowthPolicy) -> Self {
        Self::build(HashAdapter::new(hasher), GrowthController::new(policy), 1)
    }

    /// Build a map from `pairs`, pre-sizing the table to twice their number.
    /// The first occurrence of a duplicate key wins. Growth is not evaluated
    /// during the bulk load.
    pub fn from_iter_with_hasher<I>(pairs: I, hasher: S) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let pairs: Vec<(K, V)> = pairs.into_iter().collect();
        let mut map = Self::build(
            HashAdapter::new(hasher),
            GrowthController::default(),
            pairs.len().saturating_mul(2),
        );
        for (key, value) in pairs {
            let hash = map.hasher.hash_one(&key);
            map.buckets.insert_hashed(hash, key, value);
        }
        map
    }

    /// The hash builder this map was constructed with.
    pub fn hasher(&self) -> &S {
        self.hasher.builder()
    }

    /// Insert `key -> value` if `key` is absent. An existing entry keeps its
    /// value and the offered pair is dropped. Returns whether an entry was
    /// added. May grow the table, which invalidates outstanding cursors.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let _g = self.guard.enter();
        let hash = self.hasher.hash_one(&key);
        let (at, inserted) = self.buckets.insert_hashed(hash, key, value);
        self.buckets.grow(self.growth, at);
        inserted
    }

    /// Mutable access to the value for `key`, inserting `V::default()` first
    /// if the key is absent.
    pub fn get_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Mutable access to the value for `key`, inserting `make()` first if the
    /// key is absent. `make` only runs when an entry is added.
    pub fn get_or_insert_with<F>(&mut self, key: K, make: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let at = {
            let _g = self.guard.enter();
            let hash = self.hasher.hash_one(&key);
            match self.buckets.locate(hash, &key) {
                Some(at) => at,
                None => {
                    let (at, _) = self.buckets.insert_hashed(hash, key, make());
                    self.buckets.grow(self.growth, at)
                }
            }
        };
        &mut self
            .buckets
            .chains
            .entry_mut(at)
            .expect("entry located or inserted above")
            .value
    }

    /// Cursor at `q`'s entry, or [`Cursor::END`] if absent.
    pub fn find<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.guard.enter();
        let hash = self.hasher.hash_one(q);
        Cursor::from_position(self.buckets.locate(hash, q), self.stamp())
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        !self.find(q).is_end()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).value(self)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).get(self)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let cursor = self.find(q);
        cursor.value_mut(self)
    }

    /// Checked access: the value for `q`, or [`MapError::KeyNotFound`].
    pub fn at<Q>(&self, q: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).ok_or(MapError::KeyNotFound)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let cursor = self.find(q);
        self.remove_at(cursor)
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    /// Remove `q` if present. Erasing an absent key is a no-op. The table
    /// never shrinks. Returns whether an entry was removed.
    pub fn erase<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).is_some()
    }
}

impl<K, V, S> Clone for HashMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    /// Deep copy: a fresh table of twice the source's entry count, filled in
    /// the source's iteration order. Nothing is shared with the source.
    fn clone(&self) -> Self {
        let mut out = Self::build(
            self.hasher.clone(),
            self.growth,
            self.buckets.len.saturating_mul(2),
        );
        out.fill_from(self);
        out
    }

    fn clone_from(&mut self, source: &Self) {
        self.hasher = source.hasher.clone();
        self.growth = source.growth;
        self.buckets.reset(source.len().saturating_mul(2));
        self.fill_from(source);
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher,
{
    fn fill_from(&mut self, source: &Self) {
        for e in source.store().walk() {
            self.buckets.append(e.clone());
        }
    }
}

impl<K, V, S> fmt::Debug for HashMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Maps are equal when they hold the same keys with equal values, whatever
/// their capacity or chain layout.
impl<K, V, S> PartialEq for HashMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Eq for HashMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> FromIterator<(K, V)> for HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_iter_with_hasher(iter, S::default())
    }
}

impl<K, V, S, const N: usize> From<[(K, V); N]> for HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from(pairs: [(K, V); N]) -> Self {
        Self::from_iter_with_hasher(pairs, S::default())
    }
}

impl<K, V, S> Extend<(K, V)> for HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut HashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, S> IntoIterator for HashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        let len = self.buckets.len;
        IntoIter::new(self.buckets.chains.drain(), len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::hash::Hasher;
    use std::cell::Cell;
    use std::collections::BTreeMap;
    use std::rc::Rc;
    use test_log::test;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        } // every key lands in slot 0
    }

    /// Invariant: a duplicate insert is a no-op; the first value survives.
    #[test]
    fn duplicate_insert_keeps_first_value() {
        let mut m: HashMap<String, i32> = HashMap::new();
        assert!(m.insert("dup".to_string(), 1));
        assert!(!m.insert("dup".to_string(), 2));
        assert_eq!(m.get("dup"), Some(&1));
        assert_eq!(m.len(), 1);
    }

    /// Invariant: `len` tracks distinct live keys through inserts and erases.
    #[test]
    fn len_and_is_empty_behaviors() {
        let mut m: HashMap<&str, i32> = HashMap::new();
        assert!(m.is_empty());
        m.insert("a", 1);
        m.insert("b", 2);
        m.insert("a", 3);
        assert_eq!(m.len(), 2);
        assert!(m.erase("a"));
        assert!(!m.erase("a"));
        assert_eq!(m.len(), 1);
        assert!(m.erase("b"));
        assert!(m.is_empty());
    }

    /// Invariant: the three-key scenario from an empty single-bucket map.
    #[test]
    fn abc_scenario() {
        let mut m: HashMap<&str, i32> = HashMap::new();
        assert_eq!(m.capacity(), 1);
        m.insert("a", 1);
        m.insert("b", 2);
        m.insert("c", 3);
        assert_eq!(m.len(), 3);
        assert_eq!(m.at("a"), Ok(&1));
        assert_eq!(m.at("b"), Ok(&2));
        assert_eq!(m.at("c"), Ok(&3));
        assert_eq!(m.find("d"), m.end());
        assert_eq!(m.at("z"), Err(MapError::KeyNotFound));
        assert_eq!(m.capacity(), 8);
    }

    /// Invariant: erasing the only entry of a chain empties its slot, so a
    /// later colliding key starts a fresh chain.
    #[test]
    fn erase_last_entry_releases_slot() {
        let mut m = HashMap::with_hasher(ConstBuildHasher);
        m.insert("x", 1);
        assert_eq!(m.occupied_slots(), 1);
        assert!(m.erase("x"));
        assert_eq!(m.occupied_slots(), 0);
        assert_eq!(m.chain_count(), 0);

        m.insert("y", 2);
        assert_eq!(m.chain_count(), 1);
        assert_eq!(m.iter().collect::<Vec<_>>(), vec![(&"y", &2)]);
    }

    /// Invariant: erase never shrinks the table.
    #[test]
    fn erase_does_not_shrink() {
        let mut m: HashMap<u32, u32> = HashMap::new();
        for i in 0..20 {
            m.insert(i, i);
        }
        let cap = m.capacity();
        for i in 0..20 {
            m.erase(&i);
        }
        assert!(m.is_empty());
        assert_eq!(m.capacity(), cap);
    }

    #[test]
    fn get_or_default_inserts_then_mutates() {
        let mut m: HashMap<String, Vec<i32>> = HashMap::new();
        m.get_or_default("k".to_string()).push(1);
        m.get_or_default("k".to_string()).push(2);
        assert_eq!(m.get("k"), Some(&vec![1, 2]));
        assert_eq!(m.len(), 1);
    }

    /// Invariant: the returned reference is correct even when the insert it
    /// performed grew the table.
    #[test]
    fn get_or_default_across_growth() {
        let mut m: HashMap<u32, u32> = HashMap::new();
        for i in 0..64 {
            let before = m.capacity();
            *m.get_or_default(i) += i + 1;
            if m.capacity() != before {
                assert_eq!(m.get(&i), Some(&(i + 1)));
            }
        }
        for i in 0..64 {
            assert_eq!(m.get(&i), Some(&(i + 1)));
        }
    }

    /// Invariant: `make` only runs when the key is absent.
    #[test]
    fn get_or_insert_with_is_lazy() {
        let calls = Cell::new(0);
        let mut m: HashMap<&str, i32> = HashMap::new();
        *m.get_or_insert_with("k", || {
            calls.set(calls.get() + 1);
            5
        }) += 1;
        m.get_or_insert_with("k", || {
            calls.set(calls.get() + 1);
            100
        });
        assert_eq!(calls.get(), 1);
        assert_eq!(m.get("k"), Some(&6));
    }

    /// Invariant: growth keeps every key findable with its first value.
    #[test]
    fn growth_preserves_entries() {
        let mut m: HashMap<u64, u64> = HashMap::new();
        for i in 0..1000 {
            m.insert(i, i * 3);
            m.insert(i, 0);
        }
        assert_eq!(m.len(), 1000);
        assert!(m.len() * 2 < m.capacity());
        for i in 0..1000 {
            assert_eq!(m.get(&i), Some(&(i * 3)));
        }
    }

    /// Invariant: user `Hash` runs once per inserted key, rehash included.
    #[test]
    fn rehash_does_not_rehash_keys() {
        #[derive(PartialEq, Eq)]
        struct Counted(u32, Rc<Cell<usize>>);
        impl Hash for Counted {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.1.set(self.1.get() + 1);
                self.0.hash(state);
            }
        }
        let calls = Rc::new(Cell::new(0));
        let mut m = HashMap::new();
        for i in 0..100 {
            m.insert(Counted(i, calls.clone()), ());
        }
        assert_eq!(calls.get(), 100);
        assert!(m.capacity() >= 200);
    }

    /// Invariant: rehash and clone move entries without comparing keys; user
    /// `Eq` only runs while an insertion scans its chain.
    #[test]
    fn rebuilds_do_not_compare_keys() {
        #[derive(Clone)]
        struct Counted(u32, Rc<Cell<usize>>);
        impl PartialEq for Counted {
            fn eq(&self, other: &Self) -> bool {
                self.1.set(self.1.get() + 1);
                self.0 == other.0
            }
        }
        impl Eq for Counted {}
        impl Hash for Counted {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.hash(state);
            }
        }

        let calls = Rc::new(Cell::new(0));
        let mut m = HashMap::with_hasher(ConstBuildHasher);
        let n = 40;
        for i in 0..n {
            m.insert(Counted(i, calls.clone()), i);
        }
        // Key i is compared once against each of the i keys before it.
        let scans = (n * (n - 1) / 2) as usize;
        assert!(m.capacity() >= 2 * n as usize);
        assert_eq!(calls.get(), scans);

        let copy = m.clone();
        assert_eq!(calls.get(), scans);
        assert_eq!(copy.len(), n as usize);
    }

    /// Invariant: clear empties iteration and resets the table.
    #[test]
    fn clear_resets() {
        let mut m: HashMap<i32, i32> = (0..10).map(|i| (i, i)).collect();
        m.clear();
        assert!(m.is_empty());
        assert_eq!(m.begin(), m.end());
        assert_eq!(m.iter().count(), 0);
        assert_eq!(m.capacity(), 1);
        m.insert(3, 3);
        assert_eq!(m.get(&3), Some(&3));
    }

    /// Invariant: bulk construction pre-sizes to twice the input and keeps
    /// the first value of duplicated keys.
    #[test]
    fn from_pairs_first_wins() {
        let m = HashMap::<&str, i32>::from([("a", 1), ("b", 2), ("a", 3)]);
        assert_eq!(m.capacity(), 6);
        assert_eq!(m.len(), 2);
        assert_eq!(m.get("a"), Some(&1));

        let empty: HashMap<u8, u8> = Vec::new().into_iter().collect();
        assert_eq!(empty.capacity(), 1);
        assert!(empty.is_empty());
    }

    /// Invariant: a clone shares nothing with its source.
    #[test]
    fn clone_is_deep_and_independent() {
        let mut a: HashMap<String, i32> = HashMap::new();
        for (i, k) in ["x", "y", "z"].iter().enumerate() {
            a.insert(k.to_string(), i as i32);
        }
        let mut b = a.clone();
        assert_eq!(a, b);
        assert_eq!(b.capacity(), 6);

        b.insert("w".to_string(), 9);
        b.erase("x");
        *b.get_mut("y").unwrap() = 100;
        assert_eq!(a.len(), 3);
        assert_eq!(a.get("x"), Some(&0));
        assert_eq!(a.get("y"), Some(&1));
        assert!(!a.contains_key("w"));

        a.erase("z");
        assert_eq!(b.get("z"), Some(&2));
    }

    #[test]
    fn clone_from_replaces_contents() {
        let src: HashMap<i32, i32> = (0..5).map(|i| (i, i)).collect();
        let mut dst: HashMap<i32, i32> = (100..140).map(|i| (i, i)).collect();
        let stale = dst.begin();
        dst.clone_from(&src);
        assert_eq!(dst, src);
        assert_eq!(dst.capacity(), 10);
        assert_eq!(stale.get(&dst), None);
    }

    /// Invariant: iteration order of a clone matches its source.
    #[test]
    fn clone_preserves_iteration_order() {
        let mut a = HashMap::with_hasher(ConstBuildHasher);
        for k in [5, 1, 4, 2] {
            a.insert(k, k);
        }
        let b = a.clone();
        let ka: Vec<_> = a.keys().copied().collect();
        let kb: Vec<_> = b.keys().copied().collect();
        assert_eq!(ka, vec![5, 1, 4, 2]);
        assert_eq!(ka, kb);
    }

    #[test]
    fn remove_variants_return_pairs() {
        let mut m: HashMap<String, i32> = HashMap::new();
        m.insert("a".into(), 1);
        m.insert("b".into(), 2);
        m.insert("c".into(), 3);
        assert_eq!(m.remove("a"), Some(1));
        assert_eq!(m.remove("a"), None);
        assert_eq!(m.remove_entry("b"), Some(("b".to_string(), 2)));
        let c = m.find("c");
        assert_eq!(m.remove_at(c), Some(("c".to_string(), 3)));
        assert_eq!(m.remove_at(c), None);
        assert_eq!(m.remove_at(Cursor::END), None);
        assert!(m.is_empty());
    }

    /// Invariant: lookups resolve correctly under total collision.
    #[test]
    fn collisions_resolve_by_eq() {
        let mut m = HashMap::with_hasher(ConstBuildHasher);
        for i in 0..50 {
            m.insert(i, i * 2);
        }
        assert_eq!(m.chain_count(), 1);
        for i in 0..50 {
            assert_eq!(m.get(&i), Some(&(i * 2)));
        }
        for i in (0..50).step_by(2) {
            m.erase(&i);
        }
        let left: Vec<i32> = m.keys().copied().collect();
        assert_eq!(left, (1..50).step_by(2).collect::<Vec<_>>());
    }

    #[test]
    fn extend_and_debug() {
        let mut m: HashMap<i32, &str> = HashMap::new();
        m.extend([(1, "one"), (1, "uno")]);
        assert_eq!(format!("{:?}", m), r#"{1: "one"}"#);
    }

    #[test]
    fn iter_mut_and_into_iter() {
        let mut m: HashMap<i32, i32> = (0..20).map(|i| (i, i)).collect();
        for (_, v) in &mut m {
            *v += 1;
        }
        let got: BTreeMap<i32, i32> = m.into_iter().collect();
        let want: BTreeMap<i32, i32> = (0..20).map(|i| (i, i + 1)).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn hasher_accessor_and_policy() {
        let m: HashMap<i32, i32, ConstBuildHasher> =
            HashMap::with_hasher_and_policy(ConstBuildHasher, GrowthPolicy::Relaxed);
        let _: &ConstBuildHasher = m.hasher();
        assert_eq!(m.growth_policy(), GrowthPolicy::Relaxed);
        let d: HashMap<i32, i32> = HashMap::with_capacity(0);
        assert_eq!(d.capacity(), 1);
        assert_eq!(d.growth_policy(), GrowthPolicy::Eager);
    }

    /// Invariant (debug-only): re-entering the map from a key's `Eq` while a
    /// lookup scans a chain panics.
    #[cfg(debug_assertions)]
    #[test]
    fn reentrancy_panics_from_eq_during_find() {
        struct ReentryKey {
            id: &'static str,
            map: *const HashMap<ReentryKey, i32, ConstBuildHasher>,
            trigger: bool,
        }
        impl PartialEq for ReentryKey {
            fn eq(&self, other: &Self) -> bool {
                if self.id == other.id {
                    return true;
                }
                if other.trigger {
                    unsafe {
                        let m = &*other.map;
                        let _ = m.contains_key(self.id);
                    }
                }
                false
            }
        }
        impl Eq for ReentryKey {}
        impl Hash for ReentryKey {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }
        impl Borrow<str> for ReentryKey {
            fn borrow(&self) -> &str {
                self.id
            }
        }

        let mut m: HashMap<ReentryKey, i32, ConstBuildHasher> =
            HashMap::with_hasher(ConstBuildHasher);
        let ptr = &m as *const _;
        m.insert(
            ReentryKey {
                id: "a",
                map: ptr,
                trigger: false,
            },
            1,
        );

        let query = ReentryKey {
            id: "b",
            map: &m as *const _,
            trigger: true,
        };
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = m.find(&query);
        }));
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    }
}
