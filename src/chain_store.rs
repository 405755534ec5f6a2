//! Chain store: owns every entry, grouped into per-bucket chains.
//!
//! Chains live in a `SlotMap` arena and are threaded into a doubly linked
//! list in creation order, so a bucket slot only has to remember a
//! `ChainKey` and traversal never depends on slot layout. A chain is never
//! empty while it is stored: removing the last entry releases the chain.

use slotmap::{new_key_type, SecondaryMap, SlotMap};

new_key_type! {
    /// Arena key of a chain.
    pub(crate) struct ChainKey;
}

#[derive(Clone, Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
}

#[derive(Debug)]
pub(crate) struct Chain<K, V> {
    pub(crate) entries: Vec<Entry<K, V>>,
    prev: Option<ChainKey>,
    next: Option<ChainKey>,
}

/// Location of one entry: chain plus index within that chain.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Position {
    pub(crate) chain: ChainKey,
    pub(crate) entry: usize,
}

#[derive(Debug)]
pub(crate) struct ChainStore<K, V> {
    chains: SlotMap<ChainKey, Chain<K, V>>,
    head: Option<ChainKey>,
    tail: Option<ChainKey>,
}

impl<K, V> Default for ChainStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ChainStore<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            chains: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    pub(crate) fn chain_count(&self) -> usize {
        self.chains.len()
    }

    pub(crate) fn head(&self) -> Option<ChainKey> {
        self.head
    }

    pub(crate) fn entries(&self, chain: ChainKey) -> Option<&[Entry<K, V>]> {
        self.chains.get(chain).map(|c| c.entries.as_slice())
    }

    pub(crate) fn entry(&self, pos: Position) -> Option<&Entry<K, V>> {
        self.chains.get(pos.chain)?.entries.get(pos.entry)
    }

    pub(crate) fn entry_mut(&mut self, pos: Position) -> Option<&mut Entry<K, V>> {
        self.chains.get_mut(pos.chain)?.entries.get_mut(pos.entry)
    }

    /// Position following `pos`: the next entry of the same chain, else the
    /// first entry of the next chain in creation order, else `None`.
    pub(crate) fn step(&self, pos: Position) -> Option<Position> {
        let chain = self.chains.get(pos.chain)?;
        if pos.entry + 1 < chain.entries.len() {
            return Some(Position {
                chain: pos.chain,
                entry: pos.entry + 1,
            });
        }
        chain.next.map(|next| Position {
            chain: next,
            entry: 0,
        })
    }

    /// Start a new chain holding `first`, appended at the end of creation order.
    pub(crate) fn create(&mut self, first: Entry<K, V>) -> ChainKey {
        let prev = self.tail;
        let key = self.chains.insert(Chain {
            entries: vec![first],
            prev,
            next: None,
        });
        match prev {
            Some(t) => self.chains[t].next = Some(key),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
        key
    }

    /// Append to an existing chain and return the new entry's position.
    pub(crate) fn push(&mut self, chain: ChainKey, entry: Entry<K, V>) -> Position {
        let entries = &mut self.chains[chain].entries;
        entries.push(entry);
        Position {
            chain,
            entry: entries.len() - 1,
        }
    }

    /// Remove one entry, keeping the order of the survivors. Returns the entry
    /// and whether its chain was released because it became empty.
    pub(crate) fn remove(&mut self, pos: Position) -> Option<(Entry<K, V>, bool)> {
        let chain = self.chains.get_mut(pos.chain)?;
        if pos.entry >= chain.entries.len() {
            return None;
        }
        let entry = chain.entries.remove(pos.entry);
        let emptied = chain.entries.is_empty();
        if emptied {
            self.release(pos.chain);
        }
        Some((entry, emptied))
    }

    fn release(&mut self, key: ChainKey) {
        let Some(chain) = self.chains.remove(key) else {
            return;
        };
        debug_assert!(chain.entries.is_empty(), "released a live chain");
        match chain.prev {
            Some(p) => self.chains[p].next = chain.next,
            None => self.head = chain.next,
        }
        match chain.next {
            Some(n) => self.chains[n].prev = chain.prev,
            None => self.tail = chain.prev,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.chains.clear();
        self.head = None;
        self.tail = None;
    }

    pub(crate) fn walk(&self) -> Walk<'_, K, V> {
        Walk {
            store: self,
            next_chain: self.head,
            current: Default::default(),
        }
    }

    /// Mutable walk in the same order as [`walk`](Self::walk).
    ///
    /// Allocates up front: every chain is detached into a `SecondaryMap`,
    /// which is sized by the arena's slot count (live plus vacated slots) and
    /// not by the number of entries. Each `iter_mut`/`values_mut` pays this
    /// once.
    pub(crate) fn walk_mut(&mut self) -> WalkMut<'_, K, V> {
        let next_chain = self.head;
        WalkMut {
            pending: self.chains.iter_mut().collect(),
            next_chain,
            current: Default::default(),
        }
    }

    /// Consume the store, yielding every entry in iteration order together
    /// with the position it occupied.
    pub(crate) fn drain(self) -> Drain<K, V> {
        let next_chain = self.head;
        Drain {
            store: self,
            next_chain,
            current: None,
        }
    }
}

/// Shared two-level walk: chains in creation order, entries in insertion order.
pub(crate) struct Walk<'a, K, V> {
    store: &'a ChainStore<K, V>,
    next_chain: Option<ChainKey>,
    current: core::slice::Iter<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Walk<'a, K, V> {
    type Item = &'a Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(e) = self.current.next() {
                return Some(e);
            }
            let chain = self.store.chains.get(self.next_chain?)?;
            self.next_chain = chain.next;
            self.current = chain.entries.iter();
        }
    }
}

/// Mutable counterpart of [`Walk`]. Chains are detached into a secondary map
/// up front so each one can be handed out exactly once while following the
/// creation-order links.
pub(crate) struct WalkMut<'a, K, V> {
    pending: SecondaryMap<ChainKey, &'a mut Chain<K, V>>,
    next_chain: Option<ChainKey>,
    current: core::slice::IterMut<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for WalkMut<'a, K, V> {
    type Item = &'a mut Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(e) = self.current.next() {
                return Some(e);
            }
            let Chain { entries, next, .. } = self.pending.remove(self.next_chain?)?;
            self.next_chain = *next;
            self.current = entries.iter_mut();
        }
    }
}

pub(crate) struct Drain<K, V> {
    store: ChainStore<K, V>,
    next_chain: Option<ChainKey>,
    current: Option<(ChainKey, core::iter::Enumerate<std::vec::IntoIter<Entry<K, V>>>)>,
}

impl<K, V> Iterator for Drain<K, V> {
    type Item = (Position, Entry<K, V>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((chain, it)) = self.current.as_mut() {
                if let Some((entry, e)) = it.next() {
                    return Some((Position { chain: *chain, entry }, e));
                }
            }
            let key = self.next_chain?;
            let chain = self.store.chains.remove(key)?;
            self.next_chain = chain.next;
            self.current = Some((key, chain.entries.into_iter().enumerate()));
        }
    }
}
