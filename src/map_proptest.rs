#![cfg(test)]

// Property tests for HashMap kept inside the crate so they can check
// structural invariants (slot bindings, chain counts) directly.

use crate::cursor::Cursor;
use crate::growth::GrowthPolicy;
use crate::map::HashMap;
use core::hash::BuildHasher;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations shrink well: indices shrink to earlier keys, the
// pool shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    GetOrDefault(usize, i32),
    Erase(usize),
    Find(usize),
    At(String),
    Mutate(usize, i32),
    Iterate,
    CursorWalk,
    CloneMap,
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let at_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::GetOrDefault(i, d)),
            2 => idx.clone().prop_map(Op::Erase),
            1 => idx.clone().prop_map(Op::Find),
            1 => prop_oneof![at_pool, "[a-z]{0,5}"].prop_map(Op::At),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => Just(Op::Iterate),
            1 => Just(Op::CursorWalk),
            1 => Just(Op::CloneMap),
            1 => Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn cursor_keys<S>(m: &HashMap<Key, i32, S>) -> Vec<Key> {
    let mut out = Vec::new();
    let mut c = m.begin();
    while c != m.end() {
        match c.key(m) {
            Some(k) => out.push(k.clone()),
            None => break,
        }
        c = c.next(m);
    }
    out
}

// Structural invariants that hold between any two public operations.
fn check_structure<S: BuildHasher>(m: &HashMap<Key, i32, S>) -> Result<(), TestCaseError> {
    let total: usize = m.iter().count();
    prop_assert_eq!(total, m.len());
    prop_assert!(m.capacity() >= 1);
    prop_assert!(m.len() * 2 <= m.capacity(), "load above 1/2");
    prop_assert_eq!(m.occupied_slots(), m.chain_count());
    prop_assert!(m.placement_ok(), "entry outside its addressed chain");
    Ok(())
}

fn run<S>(sut: &mut HashMap<Key, i32, S>, pool: &[String], ops: Vec<Op>) -> Result<(), TestCaseError>
where
    S: BuildHasher + Clone,
{
    let mut model: BTreeMap<Key, i32> = BTreeMap::new();

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                let inserted = sut.insert(k.clone(), v);
                prop_assert_eq!(inserted, !already);
                model.entry(k).or_insert(v);
            }
            Op::GetOrDefault(i, d) => {
                let k = key_from(pool, i);
                let slot = sut.get_or_default(k.clone());
                *slot = slot.wrapping_add(d);
                let mv = model.entry(k).or_default();
                *mv = mv.wrapping_add(d);
            }
            Op::Erase(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.erase(&k), model.remove(&k).is_some());
                prop_assert_eq!(sut.find(&k), Cursor::END);
            }
            Op::Find(i) => {
                let k = key_from(pool, i);
                let c = sut.find(&k);
                prop_assert_eq!(c.value(sut), model.get(&k));
                prop_assert_eq!(c.is_end(), !model.contains_key(&k));
            }
            Op::At(s) => {
                let expected = model.get(&Key(s.clone()));
                prop_assert_eq!(sut.at(s.as_str()).ok(), expected);
            }
            Op::Mutate(i, d) => {
                let k = key_from(pool, i);
                if let Some(v) = sut.get_mut(&k) {
                    *v = v.wrapping_add(d);
                    let mv = model.get_mut(&k).expect("model has key");
                    *mv = mv.wrapping_add(d);
                } else {
                    prop_assert!(!model.contains_key(&k));
                }
            }
            Op::Iterate => {
                let seen: BTreeMap<Key, i32> =
                    sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(&seen, &model);
            }
            Op::CursorWalk => {
                let via_cursor = cursor_keys(sut);
                let via_iter: Vec<Key> = sut.keys().cloned().collect();
                prop_assert_eq!(&via_cursor, &via_iter);
                let distinct: BTreeSet<Key> = via_cursor.into_iter().collect();
                prop_assert_eq!(distinct.len(), model.len());
            }
            Op::CloneMap => {
                let mut copy = sut.clone();
                prop_assert_eq!(copy.len(), sut.len());
                let order: Vec<Key> = copy.keys().cloned().collect();
                let source_order: Vec<Key> = sut.keys().cloned().collect();
                prop_assert_eq!(order, source_order);
                // Mutating the copy leaves the source alone.
                copy.clear();
                copy.insert(Key("copy-only".into()), 0);
                prop_assert!(!sut.contains_key("copy-only"));
            }
            Op::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.begin(), sut.end());
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        check_structure(sut)?;
    }
    Ok(())
}

// Property: state-machine equivalence against an ordered model.
// - insert reports whether the key was new and never overwrites.
// - get_or_default inserts a default exactly when absent.
// - erase removes exactly the model's key; find is END afterwards.
// - iteration and the cursor walk agree and cover each live key once.
// - clones match in content and order, and are independent.
// - bound slots and stored chains stay in one-to-one correspondence.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: HashMap<Key, i32> = HashMap::new();
        run(&mut sut, &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_relaxed((pool, ops) in arb_scenario()) {
        let mut sut: HashMap<Key, i32> = HashMap::with_growth_policy(GrowthPolicy::Relaxed);
        run(&mut sut, &pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl core::hash::Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: same invariants as above under worst-case collisions, where
// the whole map is one chain and every lookup resolves through `Eq`.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let mut sut: HashMap<Key, i32, ConstBuildHasher> = HashMap::with_hasher(ConstBuildHasher);
        run(&mut sut, &pool, ops)?;
        prop_assert!(sut.chain_count() <= 1);
    }
}
