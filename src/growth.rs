//! Growth controller: decides when the bucket table must double.
//!
//! The maximum load factor is 1/2. The check runs after every insertion and
//! compares the entry count against the current, pre-growth capacity.

/// Numerator and denominator of the maximum load factor.
const MAX_LOAD: (usize, usize) = (1, 2);

/// When a map doubles its bucket table.
///
/// `Eager` grows as soon as the load factor reaches 1/2; starting from a
/// single bucket the first three insertions yield capacities 2, 4
/// and 8. `Relaxed` only grows once the load factor would exceed 1/2, which
/// lets a table sit at exactly half full and roughly halves the number of
/// rehashes in the small-map regime.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum GrowthPolicy {
    #[default]
    Eager,
    Relaxed,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct GrowthController {
    policy: GrowthPolicy,
}

impl GrowthController {
    pub(crate) fn new(policy: GrowthPolicy) -> Self {
        Self { policy }
    }

    pub(crate) fn policy(&self) -> GrowthPolicy {
        self.policy
    }

    /// Capacity the table must be rebuilt at after an insertion brought the
    /// map to `len` entries, or `None` if the current capacity still suffices.
    pub(crate) fn grow_to(&self, len: usize, capacity: usize) -> Option<usize> {
        let (num, den) = MAX_LOAD;
        let load = len.saturating_mul(den);
        match self.policy {
            GrowthPolicy::Eager => {
                (load >= capacity.saturating_mul(num)).then(|| capacity.saturating_mul(2))
            }
            GrowthPolicy::Relaxed => {
                let mut target = capacity;
                while load > target.saturating_mul(num) && target < usize::MAX / 2 {
                    target *= 2;
                }
                (target != capacity).then_some(target)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replay(policy: GrowthPolicy, inserts: usize) -> Vec<usize> {
        let g = GrowthController::new(policy);
        let mut cap = 1;
        (1..=inserts)
            .map(|len| {
                if let Some(c) = g.grow_to(len, cap) {
                    cap = c;
                }
                cap
            })
            .collect()
    }

    /// Invariant: eager growth doubles on nearly every insertion while small.
    #[test]
    fn eager_timing_from_single_bucket() {
        assert_eq!(replay(GrowthPolicy::Eager, 5), vec![2, 4, 8, 16, 16]);
    }

    /// Invariant: eager growth never leaves the load factor above 1/2 and
    /// doubles exactly once per firing.
    #[test]
    fn eager_keeps_load_below_half() {
        let g = GrowthController::new(GrowthPolicy::Eager);
        let mut cap = 1;
        for len in 1..1000 {
            if let Some(c) = g.grow_to(len, cap) {
                assert_eq!(c, cap * 2);
                cap = c;
            }
            assert!(len * 2 <= cap, "len {len} cap {cap}");
        }
    }

    /// Invariant: relaxed growth never exceeds load 1/2 and never grows when
    /// exactly half full.
    #[test]
    fn relaxed_allows_exactly_half() {
        let g = GrowthController::new(GrowthPolicy::Relaxed);
        assert_eq!(g.grow_to(4, 8), None);
        assert_eq!(g.grow_to(5, 8), Some(16));
        assert_eq!(g.grow_to(9, 2), Some(32));
        assert_eq!(replay(GrowthPolicy::Relaxed, 5), vec![2, 4, 8, 8, 16]);
        for (len, cap) in replay(GrowthPolicy::Relaxed, 500).into_iter().enumerate() {
            assert!((len + 1) * 2 <= cap);
        }
    }

    #[test]
    fn default_policy_is_eager() {
        assert_eq!(GrowthPolicy::default(), GrowthPolicy::Eager);
        assert_eq!(GrowthController::default().policy(), GrowthPolicy::Eager);
    }
}
