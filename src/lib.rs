//! chain-hashmap: a single-threaded hash map built on a bucket array with
//! separate chaining, exposing detached two-level cursors.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small, inspectable hash table where every structural piece can
//!   be reasoned about on its own, and where traversal order is defined.
//! - Layers:
//!   - HashAdapter<S>: owns the `BuildHasher`; the only place user `Hash`
//!     runs.
//!   - BucketTable: `Vec<Option<ChainKey>>`, addressed by
//!     `hash mod capacity`; knows nothing about growth.
//!   - ChainStore<K, V>: `slotmap` arena of chains, each a `Vec` of entries,
//!     threaded into a linked list in creation order.
//!   - GrowthController: max load factor 1/2, checked after every insertion;
//!     doubles the table and rehashes everything.
//!   - Cursor: `Valid { chain, entry, owner, epoch } | End`, resolved against the
//!     map; plus borrowing iterators walking the same two levels.
//!   - HashMap<K, V, S>: the facade.
//!
//! Constraints
//! - Unique keys. Inserting a present key is a no-op and never overwrites.
//! - A chain referenced by a bucket slot is never empty; removing the last
//!   entry releases the chain and empties the slot.
//! - Each entry caches its `u64` hash. Rehash and clone re-address with the
//!   cached hash and append without comparing keys, so `K: Hash` runs exactly
//!   once per inserted key and `K: Eq` only runs during lookups.
//! - Capacity never shrinks on erase. `clear` resets it to one bucket.
//! - Single-threaded: the map is `!Sync`.
//!
//! Iteration order
//! - Chains in the order they were created, then each chain's entries in
//!   insertion order. This is not global insertion order: a late key that
//!   hashes into an early chain is visited with that chain.
//! - A rehash re-inserts entries in iteration order, so chain creation
//!   order after a rebuild follows the previous traversal.
//!
//! Cursor invalidation
//! - The map keeps an epoch that advances on every rehash, removal and
//!   clear. Cursors carry the epoch they were minted in; a stale cursor
//!   resolves to `None` and advances to the end. Insertions that do not
//!   grow the table only append, and leave cursors valid.
//! - Cursors also carry the id of the map that minted them. Every map,
//!   clones included, draws a fresh id, so a cursor is inert on any other
//!   map: it reads nothing and removes nothing.
//! - Borrowing iterators (`iter`, `iter_mut`, ...) cannot be held across
//!   mutation at all; the borrow checker enforces it.
//!
//! Growth timing
//! - `GrowthPolicy::Eager` (default) compares `len` against the pre-growth
//!   capacity after every insertion and doubles once when `len >= cap / 2`.
//!   From one bucket the first three insertions give capacities 2, 4, 8.
//! - `GrowthPolicy::Relaxed` doubles only while `len > cap / 2`.
//!
//! Reentrancy policy
//! - Lookups run user `Eq` mid-scan. A debug-only guard panics if that code
//!   reaches back into the same map; release builds skip the check.
//!
//! Errors
//! - `at` is the one fallible lookup and returns `MapError::KeyNotFound`.
//!   Everything else is total.

mod bucket_table;
mod chain_store;
pub mod cursor;
mod error;
mod growth;
mod hasher;
mod map;
mod map_proptest;
mod reentrancy;

// Public surface
pub use cursor::Cursor;
pub use error::{MapError, Result};
pub use growth::GrowthPolicy;
pub use hasher::DefaultHashBuilder;
pub use map::HashMap;
