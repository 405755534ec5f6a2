//! Cursors and iterators over a map's chains.
//!
//! A [`Cursor`] is a detached, two-level position: which chain (in creation
//! order) and which entry inside it. It borrows nothing, so it has to be
//! resolved against the map it came from. Every rebuild, removal or clear
//! advances the map's epoch and turns older cursors stale; a stale cursor
//! resolves to `None` and advances straight to the end. Each map also
//! carries a process-unique id, so a cursor handed to a different map
//! resolves to `None` as well.
//!
//! The borrowing iterators walk the same two levels directly and are tied to
//! the map's lifetime, so the borrow checker rules out invalidation for them.

use crate::chain_store::{Drain, Position, Walk, WalkMut};
use crate::map::HashMap;
use core::iter::FusedIterator;

/// Which map minted a cursor, and in which epoch of that map.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Stamp {
    pub(crate) owner: u64,
    pub(crate) epoch: u64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum State {
    Valid { at: Position, stamp: Stamp },
    End,
}

/// Position of one entry in a [`HashMap`], or the past-the-end position.
///
/// Equality is structural: every end cursor equals every other end cursor,
/// and valid cursors are equal when they name the same entry of the same
/// map in the same epoch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Cursor(State);

impl Cursor {
    /// The past-the-end cursor, equal to `map.end()` for every map.
    pub const END: Cursor = Cursor(State::End);

    pub(crate) fn valid(at: Position, stamp: Stamp) -> Self {
        Cursor(State::Valid { at, stamp })
    }

    pub(crate) fn from_position(at: Option<Position>, stamp: Stamp) -> Self {
        at.map_or(Self::END, |at| Self::valid(at, stamp))
    }

    pub fn is_end(&self) -> bool {
        self.0 == State::End
    }

    /// Position inside `map`, if this cursor was minted by `map` and is not
    /// stale.
    pub(crate) fn position<K, V, S>(&self, map: &HashMap<K, V, S>) -> Option<Position> {
        match self.0 {
            State::Valid { at, stamp } if stamp == map.stamp() => Some(at),
            _ => None,
        }
    }

    pub fn key<'a, K, V, S>(&self, map: &'a HashMap<K, V, S>) -> Option<&'a K> {
        self.get(map).map(|(k, _)| k)
    }

    pub fn value<'a, K, V, S>(&self, map: &'a HashMap<K, V, S>) -> Option<&'a V> {
        self.get(map).map(|(_, v)| v)
    }

    pub fn value_mut<'a, K, V, S>(&self, map: &'a mut HashMap<K, V, S>) -> Option<&'a mut V> {
        let at = self.position(map)?;
        map.store_mut().entry_mut(at).map(|e| &mut e.value)
    }

    /// Key and value under the cursor. `None` at the end or when stale.
    pub fn get<'a, K, V, S>(&self, map: &'a HashMap<K, V, S>) -> Option<(&'a K, &'a V)> {
        let at = self.position(map)?;
        map.store().entry(at).map(|e| (&e.key, &e.value))
    }

    /// The cursor one step further: next entry in the chain, else the first
    /// entry of the next chain, else the end. End and stale cursors advance
    /// to the end, as do cursors from another map.
    #[must_use]
    pub fn next<K, V, S>(&self, map: &HashMap<K, V, S>) -> Cursor {
        match self.position(map) {
            Some(at) => Cursor::from_position(map.store().step(at), map.stamp()),
            None => Cursor::END,
        }
    }
}

/// Iterator over `(&K, &V)` in chain-creation order.
pub struct Iter<'a, K, V> {
    walk: Walk<'a, K, V>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(walk: Walk<'a, K, V>, len: usize) -> Self {
        Self {
            walk,
            remaining: len,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let e = self.walk.next()?;
        self.remaining -= 1;
        Some((&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in chain-creation order.
pub struct IterMut<'a, K, V> {
    walk: WalkMut<'a, K, V>,
    remaining: usize,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(walk: WalkMut<'a, K, V>, len: usize) -> Self {
        Self {
            walk,
            remaining: len,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let e = self.walk.next()?;
        self.remaining -= 1;
        Some((&e.key, &mut e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owning iterator returned by `HashMap::into_iter`.
pub struct IntoIter<K, V> {
    drain: Drain<K, V>,
    remaining: usize,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(drain: Drain<K, V>, len: usize) -> Self {
        Self {
            drain,
            remaining: len,
        }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let (_, e) = self.drain.next()?;
        self.remaining -= 1;
        Some((e.key, e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

pub struct Keys<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

pub struct ValuesMut<'a, K, V> {
    pub(crate) inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
