use std::collections::BTreeMap;

use balanced_map::{AvlTreeMap, Error, OrderedMap, RbTreeMap};
use proptest::prelude::*;
use simplelog::{Config, LevelFilter, TestLogger};

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 2_000;

fn init_logging() {
    // Several tests share the process; only the first install wins.
    let _ = TestLogger::init(LevelFilter::Trace, Config::default());
}

fn key_strategy() -> impl Strategy<Value = i32> {
    // Narrow enough to cause collisions.
    -500i32..500i32
}

#[derive(Debug, Clone)]
enum MapOp {
    Insert(i32, i64),
    Remove(i32),
    Get(i32),
    Update(i32, i64),
    Iterate(usize),
}

fn op_strategy() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        6 => (key_strategy(), any::<i64>()).prop_map(|(k, v)| MapOp::Insert(k, v)),
        4 => key_strategy().prop_map(MapOp::Remove),
        2 => key_strategy().prop_map(MapOp::Get),
        1 => (key_strategy(), any::<i64>()).prop_map(|(k, v)| MapOp::Update(k, v)),
        1 => (0usize..64).prop_map(MapOp::Iterate),
    ]
}

fn run_against_model<M: OrderedMap<i32, i64> + Default>(
    ops: &[MapOp],
) -> Result<(), TestCaseError> {
    let mut map = M::default();
    let mut model = BTreeMap::new();

    for op in ops {
        match *op {
            MapOp::Insert(k, v) => {
                let expected = if model.contains_key(&k) {
                    Err(Error::DuplicateKey)
                } else {
                    model.insert(k, v);
                    Ok(())
                };
                prop_assert_eq!(map.insert(k, v), expected);
            }
            MapOp::Remove(k) => {
                prop_assert_eq!(map.remove_entry(&k), model.remove_entry(&k));
            }
            MapOp::Get(k) => {
                prop_assert_eq!(map.get(&k), model.get(&k));
                prop_assert_eq!(map.lookup(&k).ok(), model.get(&k));
            }
            MapOp::Update(k, v) => match model.get_mut(&k) {
                Some(slot) => prop_assert_eq!(map.update(&k, v), Ok(std::mem::replace(slot, v))),
                None => prop_assert_eq!(map.update(&k, v), Err(Error::KeyNotFound)),
            },
            MapOp::Iterate(n) => {
                let prefix: Vec<(i32, i64)> =
                    map.iter().take(n).map(|(k, v)| (*k, *v)).collect();
                let expected: Vec<(i32, i64)> =
                    model.iter().take(n).map(|(k, v)| (*k, *v)).collect();
                prop_assert_eq!(prefix, expected);
            }
        }
        prop_assert_eq!(map.len(), model.len());
    }

    prop_assert!(map.iter().eq(model.iter()));
    Ok(())
}

proptest! {
    #[test]
    fn avl_matches_btree_map(ops in prop::collection::vec(op_strategy(), 0..TEST_SIZE)) {
        run_against_model::<AvlTreeMap<i32, i64>>(&ops)?;
    }

    #[test]
    fn rb_matches_btree_map(ops in prop::collection::vec(op_strategy(), 0..TEST_SIZE)) {
        run_against_model::<RbTreeMap<i32, i64>>(&ops)?;
    }

    #[test]
    fn insert_then_remove_all_empties(
        keys in prop::collection::btree_set(any::<i32>(), 0..512),
        seed in any::<u64>(),
    ) {
        use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

        let mut order: Vec<i32> = keys.iter().copied().collect();
        order.shuffle(&mut StdRng::seed_from_u64(seed));

        let mut avl = AvlTreeMap::new();
        let mut rb = RbTreeMap::new();
        for key in &order {
            avl.insert(*key, ()).unwrap();
            rb.insert(*key, ()).unwrap();
        }
        prop_assert!(avl.keys().eq(keys.iter()));
        prop_assert!(rb.keys().eq(keys.iter()));

        order.shuffle(&mut StdRng::seed_from_u64(seed.wrapping_add(1)));
        for key in &order {
            prop_assert!(avl.remove(key));
            prop_assert!(rb.remove(key));
        }
        prop_assert_eq!(avl.len(), 0);
        prop_assert_eq!(rb.len(), 0);
        prop_assert_eq!(avl.iter().next(), None);
        prop_assert_eq!(rb.iter().next(), None);
    }
}

#[test]
fn engines_are_interchangeable() {
    init_logging();

    fn exercise<M: OrderedMap<String, usize> + Default>() -> Vec<(String, usize)> {
        let mut map = M::default();
        let sentence = "the quick brown fox jumps over the lazy dog";
        for (i, word) in sentence.split(' ').enumerate() {
            match map.insert(word.to_owned(), i) {
                Ok(()) => {}
                Err(Error::DuplicateKey) => {
                    let first = *map.get(&word.to_owned()).unwrap();
                    assert_eq!(map.update(&word.to_owned(), first + i), Ok(first));
                }
                Err(err) => panic!("unexpected error: {err}"),
            }
        }
        assert!(map.remove(&"fox".to_owned()));
        map.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }

    let avl = exercise::<AvlTreeMap<String, usize>>();
    let rb = exercise::<RbTreeMap<String, usize>>();
    assert_eq!(avl, rb);
    assert_eq!(avl.first(), Some(&("brown".to_owned(), 2)));
    assert_eq!(
        avl.iter().find(|(k, _)| k == "the").map(|(_, v)| *v),
        Some(6)
    );
}

#[test]
fn debug_lists_entries_in_order() {
    init_logging();

    let mut map = RbTreeMap::new();
    for key in [3, 1, 2] {
        map.insert(key, key * key).unwrap();
    }
    assert_eq!(format!("{map:?}"), "{1: 1, 2: 4, 3: 9}");
    assert_eq!(map[&3], 9);
}
