//! Debug-only guard against re-entering a map while it runs user code.
//!
//! Lookups call the key's `Hash` and `Eq` impls in the middle of a chain
//! scan. A key whose `Eq` reaches back into the same map would observe it
//! mid-operation; in debug builds that panics, in release builds the check
//! compiles away. The flag is present in every build so the map's auto
//! traits do not depend on the profile.

use core::cell::Cell;

#[derive(Debug, Default)]
pub(crate) struct ScanGuard {
    busy: Cell<bool>,
}

impl ScanGuard {
    pub(crate) const fn new() -> Self {
        Self {
            busy: Cell::new(false),
        }
    }

    /// Mark the owning map busy until the returned token is dropped.
    #[inline]
    pub(crate) fn enter(&self) -> Busy<'_> {
        if cfg!(debug_assertions) {
            assert!(
                !self.busy.replace(true),
                "reentrancy detected: map accessed from inside a key's Hash or Eq"
            );
        }
        Busy { owner: self }
    }
}

pub(crate) struct Busy<'a> {
    owner: &'a ScanGuard,
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        if cfg!(debug_assertions) {
            self.owner.busy.set(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ScanGuard;

    #[test]
    fn sequential_entries_are_ok() {
        let g = ScanGuard::new();
        drop(g.enter());
        let _again = g.enter();
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_entry_panics_in_debug() {
        let g = ScanGuard::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = g.enter();
            let _inner = g.enter();
        }));
        assert!(res.is_err(), "expected nested entry to panic in debug builds");
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn nested_entry_is_noop_in_release() {
        let g = ScanGuard::new();
        let _outer = g.enter();
        let _inner = g.enter();
    }
}
