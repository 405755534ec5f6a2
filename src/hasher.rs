//! Hash adapter: the single hash capability owned by a map instance.

use core::hash::{BuildHasher, Hash, Hasher};

/// Default hash builder selected by `HashMap::new`.
pub type DefaultHashBuilder = hashbrown::hash_map::DefaultHashBuilder;

/// Wraps one `BuildHasher` and turns keys into `u64` hashes.
///
/// The builder is stored once per map and is handed back unchanged by
/// [`HashMap::hasher`](crate::HashMap::hasher).
#[derive(Clone, Debug, Default)]
pub(crate) struct HashAdapter<S> {
    builder: S,
}

impl<S: BuildHasher> HashAdapter<S> {
    pub(crate) fn new(builder: S) -> Self {
        Self { builder }
    }

    #[inline]
    pub(crate) fn hash_one<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        let mut h = self.builder.build_hasher();
        q.hash(&mut h);
        h.finish()
    }

    pub(crate) fn builder(&self) -> &S {
        &self.builder
    }
}
