//! Bucket table: fixed-capacity slot array addressed by `hash mod capacity`.

use crate::chain_store::ChainKey;

#[derive(Clone, Debug)]
pub(crate) struct BucketTable {
    slots: Vec<Option<ChainKey>>,
}

impl BucketTable {
    /// Allocate `capacity` empty slots. A capacity of zero is promoted to one
    /// so that addressing is always defined.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn slot_for(&self, hash: u64) -> usize {
        (hash % self.slots.len() as u64) as usize
    }

    #[inline]
    pub(crate) fn get(&self, slot: usize) -> Option<ChainKey> {
        self.slots[slot]
    }

    pub(crate) fn bind(&mut self, slot: usize, chain: ChainKey) {
        debug_assert!(self.slots[slot].is_none(), "slot already bound");
        self.slots[slot] = Some(chain);
    }

    pub(crate) fn unbind(&mut self, slot: usize) {
        debug_assert!(self.slots[slot].is_some(), "slot already empty");
        self.slots[slot] = None;
    }

    /// Replace the slot array wholesale with `capacity` empty slots.
    pub(crate) fn reset(&mut self, capacity: usize) {
        *self = Self::with_capacity(capacity);
    }

    #[cfg(test)]
    pub(crate) fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}
