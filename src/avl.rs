//! An ordered map implemented with an AVL tree.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Index;

use log::{debug, trace};

use crate::arena::Handle;
use crate::error::Result;
use crate::iter::Iter;
use crate::ordered_map::OrderedMap;
use crate::raw::{Dir, RawTree};

/// An ordered map implemented with an AVL tree.
///
/// Every node stores its balance factor, the height of its right subtree
/// minus the height of its left subtree, which is kept in `-1..=1`.
///
/// ```
/// use balanced_map::{AvlTreeMap, OrderedMap};
/// let mut map = AvlTreeMap::new();
/// map.insert(0, "zero").unwrap();
/// map.insert(1, "one").unwrap();
/// map.insert(2, "two").unwrap();
/// assert_eq!(map.get(&1), Some(&"one"));
/// assert!(map.remove(&1));
/// assert!(map.get(&1).is_none());
/// ```
#[derive(Clone)]
pub struct AvlTreeMap<K, V> {
    tree: RawTree<K, V, i8>,
}

/// Restructuring applied at a node whose balance factor reached ±2.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Rotation {
    /// The heavy child leans the same way: one rotation, both factors 0.
    Single,
    /// The heavy child is level (only after a removal): one rotation, the
    /// subtree keeps its height.
    SingleBalanced,
    /// The heavy child leans the other way: rotate the child, then the node.
    Double,
}

impl Rotation {
    fn select(heavy: Dir, child_balance: i8) -> Self {
        match (child_balance * heavy.sign()).cmp(&0) {
            Ordering::Greater => Rotation::Single,
            Ordering::Equal => Rotation::SingleBalanced,
            Ordering::Less => Rotation::Double,
        }
    }

    /// Whether the rotated subtree ends up one level lower than before the
    /// imbalance arose from a removal.
    fn shrinks_height(self) -> bool {
        self != Rotation::SingleBalanced
    }
}

/// Balance factors of the old subtree root and of its heavy child after a
/// double rotation, given the factor the grandchild had before it.
fn double_rotation_balances(heavy: Dir, grandchild: i8) -> (i8, i8) {
    let sign = heavy.sign();
    match (grandchild * sign).cmp(&0) {
        Ordering::Greater => (-sign, 0),
        Ordering::Equal => (0, 0),
        Ordering::Less => (0, sign),
    }
}

impl<K, V> AvlTreeMap<K, V> {
    /// Creates an empty map.
    /// No memory is allocated until the first item is inserted.
    pub const fn new() -> Self {
        Self { tree: RawTree::new() }
    }

    /// Creates an empty map with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tree: RawTree::with_capacity(capacity),
        }
    }

    fn balance(&self, handle: Handle) -> i8 {
        self.tree.node(handle).meta
    }

    fn set_balance(&mut self, handle: Handle, balance: i8) {
        debug_assert!((-1..=1).contains(&balance));
        self.tree.node_mut(handle).meta = balance;
    }

    /// Rebalances `node`, whose balance factor is ±2 towards `heavy`.
    /// Returns whether the subtree got lower.
    fn rebalance(&mut self, node: Handle, heavy: Dir) -> bool {
        let child = self
            .tree
            .child(node, heavy)
            .expect("heavy side of an unbalanced node has a child");
        let rotation = Rotation::select(heavy, self.balance(child));
        trace!("{rotation:?} rotation, heavy side {heavy:?}");

        match rotation {
            Rotation::Single => {
                self.tree.rotate(node, heavy.opposite());
                self.set_balance(node, 0);
                self.set_balance(child, 0);
            }
            Rotation::SingleBalanced => {
                self.tree.rotate(node, heavy.opposite());
                self.set_balance(node, heavy.sign());
                self.set_balance(child, -heavy.sign());
            }
            Rotation::Double => {
                let grandchild = self
                    .tree
                    .child(child, heavy.opposite())
                    .expect("inward-leaning child has an inner child");
                let (node_balance, child_balance) =
                    double_rotation_balances(heavy, self.balance(grandchild));
                self.tree.rotate(child, heavy);
                self.tree.rotate(node, heavy.opposite());
                self.set_balance(node, node_balance);
                self.set_balance(child, child_balance);
                self.set_balance(grandchild, 0);
            }
        }
        rotation.shrinks_height()
    }

    /// Walks up from a freshly attached leaf. One rotation restores the
    /// original height, so the walk ends there.
    fn insert_fixup(&mut self, leaf: Handle) {
        let mut child = leaf;
        while let Some(parent) = self.tree.parent(child) {
            let side = self.tree.side_of(parent, child);
            match self.balance(parent) + side.sign() {
                0 => {
                    self.set_balance(parent, 0);
                    break;
                }
                balance @ (-1 | 1) => {
                    self.set_balance(parent, balance);
                    child = parent;
                }
                _ => {
                    self.rebalance(parent, side);
                    break;
                }
            }
        }
    }

    /// Walks up from the parent of a removed node; `side` is where the
    /// subtree got lower. Unlike insertion, a rotation may leave the subtree
    /// lower still, so the walk continues above it.
    fn delete_fixup(&mut self, parent: Handle, side: Dir) {
        let mut next = Some((parent, side));
        while let Some((node, side)) = next {
            let above = self
                .tree
                .parent(node)
                .map(|grandparent| (grandparent, self.tree.side_of(grandparent, node)));
            match self.balance(node) - side.sign() {
                balance @ (-1 | 1) => {
                    self.set_balance(node, balance);
                    break;
                }
                0 => {
                    self.set_balance(node, 0);
                    next = above;
                }
                _ => {
                    if !self.rebalance(node, side.opposite()) {
                        break;
                    }
                    next = above;
                }
            }
        }
    }
}

impl<K: Ord, V> AvlTreeMap<K, V> {
    /// Panics if any node breaks key order, its parent link, the AVL
    /// condition or its stored balance factor, or if the count is off.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        self.tree.check_structure(0usize, |node, left, right| {
            let balance = right as isize - left as isize;
            assert!(balance.abs() <= 1, "AVL condition violated");
            assert_eq!(isize::from(node.meta), balance, "stale balance factor");
            left.max(right) + 1
        });
    }

    #[cfg(test)]
    fn height(&self) -> usize {
        self.tree.check_structure(0, |_, left: usize, right: usize| left.max(right) + 1)
    }
}

impl<K: Ord, V> OrderedMap<K, V> for AvlTreeMap<K, V> {
    type Meta = i8;

    fn insert(&mut self, key: K, value: V) -> Result<()> {
        let position = self.tree.find_insert_pos(&key).map_err(|err| {
            debug!("AVL insert rejected: {err}");
            err
        })?;
        let leaf = self.tree.attach(position, key, value, 0);
        self.insert_fixup(leaf);
        Ok(())
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.tree.find(key).map(|handle| &self.tree.node(handle).value)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let handle = self.tree.find(key)?;
        Some(&mut self.tree.node_mut(handle).value)
    }

    fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let mut handle = self.tree.find(key)?;

        // With two children, trade places with the in-order successor,
        // which has no left child.
        if let (Some(_), Some(right)) = (
            self.tree.child(handle, Dir::Left),
            self.tree.child(handle, Dir::Right),
        ) {
            let successor = self.tree.min(right);
            self.tree.swap_entries(handle, successor);
            handle = successor;
        }

        let above = self
            .tree
            .parent(handle)
            .map(|parent| (parent, self.tree.side_of(parent, handle)));
        let (node, _) = self.tree.splice(handle);
        if let Some((parent, side)) = above {
            self.delete_fixup(parent, side);
        }
        Some((node.key, node.value))
    }

    fn len(&self) -> usize {
        self.tree.len()
    }

    fn clear(&mut self) {
        debug!("clearing AVL map with {} entries", self.tree.len());
        self.tree.clear();
    }

    fn iter(&mut self) -> Iter<'_, K, V, i8> {
        Iter::new(&mut self.tree)
    }
}

impl<K, V> Default for AvlTreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for AvlTreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tree.fmt_entries(f)
    }
}

impl<K: Ord, V> Index<&K> for AvlTreeMap<K, V> {
    type Output = V;

    /// Returns a reference to the value corresponding to the key.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the map.
    fn index(&self, key: &K) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

    const N: i32 = 1_000;

    fn shape(map: &AvlTreeMap<i32, ()>) -> Vec<(i32, Option<i32>, Option<i32>, i8)> {
        let tree = &map.tree;
        let key = |link: Option<Handle>| link.map(|handle| tree.node(handle).key);
        let mut nodes = Vec::new();
        tree.walk(|handle| {
            nodes.push((
                tree.node(handle).key,
                key(tree.child(handle, Dir::Left)),
                key(tree.child(handle, Dir::Right)),
                tree.node(handle).meta,
            ));
        });
        nodes
    }

    fn root_key(map: &AvlTreeMap<i32, ()>) -> Option<i32> {
        map.tree.root().map(|root| map.tree.node(root).key)
    }

    #[test]
    fn test_rotation_select() {
        assert_eq!(Rotation::select(Dir::Right, 1), Rotation::Single);
        assert_eq!(Rotation::select(Dir::Left, -1), Rotation::Single);
        assert_eq!(Rotation::select(Dir::Right, 0), Rotation::SingleBalanced);
        assert_eq!(Rotation::select(Dir::Left, 0), Rotation::SingleBalanced);
        assert_eq!(Rotation::select(Dir::Right, -1), Rotation::Double);
        assert_eq!(Rotation::select(Dir::Left, 1), Rotation::Double);
        assert!(Rotation::Single.shrinks_height());
        assert!(Rotation::Double.shrinks_height());
        assert!(!Rotation::SingleBalanced.shrinks_height());
    }

    #[test]
    fn test_double_rotation_balances() {
        assert_eq!(double_rotation_balances(Dir::Right, 1), (-1, 0));
        assert_eq!(double_rotation_balances(Dir::Right, 0), (0, 0));
        assert_eq!(double_rotation_balances(Dir::Right, -1), (0, 1));
        assert_eq!(double_rotation_balances(Dir::Left, -1), (1, 0));
        assert_eq!(double_rotation_balances(Dir::Left, 0), (0, 0));
        assert_eq!(double_rotation_balances(Dir::Left, 1), (0, -1));
    }

    #[test]
    fn test_single_rotation_on_ascending_inserts() {
        // 10 ->    20
        //   \     /  \
        //   20   10  30
        //     \
        //     30
        let mut map = AvlTreeMap::new();
        for key in [10, 20, 30] {
            map.insert(key, ()).unwrap();
        }
        map.check_consistency();
        assert_eq!(root_key(&map), Some(20));
        assert_eq!(
            shape(&map),
            vec![
                (10, None, None, 0),
                (20, Some(10), Some(30), 0),
                (30, None, None, 0),
            ]
        );
    }

    #[test]
    fn test_double_rotations() {
        //   3  ->   2
        //  /       / \
        // 1       1   3
        //  \
        //   2
        let mut map = AvlTreeMap::new();
        for key in [3, 1, 2] {
            map.insert(key, ()).unwrap();
        }
        map.check_consistency();
        assert_eq!(root_key(&map), Some(2));
        assert_eq!(map.height(), 2);

        // 1   ->  2
        //  \     / \
        //   3   1   3
        //  /
        // 2
        let mut map = AvlTreeMap::new();
        for key in [1, 3, 2] {
            map.insert(key, ()).unwrap();
        }
        map.check_consistency();
        assert_eq!(root_key(&map), Some(2));
        assert_eq!(map.height(), 2);
    }

    #[test]
    fn test_rebalance_on_remove() {
        //   3   ->   3  ->   2
        //  / \      /       / \
        // 1   4    1       1   3
        //  \        \
        //   2        2
        let mut map = AvlTreeMap::new();
        for key in [3, 1, 4, 2] {
            map.insert(key, ()).unwrap();
        }
        assert_eq!(map.height(), 3);
        assert!(map.remove(&4));
        map.check_consistency();
        assert_eq!(root_key(&map), Some(2));
        assert_eq!(map.height(), 2);

        //   1     -> 1     ->    2
        //  / \        \         / \
        // 0   2        2       1   3
        //      \        \
        //       3        3
        let mut map = AvlTreeMap::new();
        for key in [1, 0, 2, 3] {
            map.insert(key, ()).unwrap();
        }
        assert!(map.remove(&0));
        map.check_consistency();
        assert_eq!(root_key(&map), Some(2));
        assert_eq!(map.height(), 2);
    }

    #[test]
    fn test_remove_with_balanced_sibling() {
        //     2      ->    4
        //    / \          / \
        //   1   4        2   5
        //      / \        \
        //     3   5        3
        let mut map = AvlTreeMap::new();
        for key in [2, 1, 4, 3, 5] {
            map.insert(key, ()).unwrap();
        }
        assert!(map.remove(&1));
        map.check_consistency();
        assert_eq!(root_key(&map), Some(4));
        assert_eq!(
            shape(&map),
            vec![
                (2, None, Some(3), 1),
                (3, None, None, 0),
                (4, Some(2), Some(5), -1),
                (5, None, None, 0),
            ]
        );
    }

    #[test]
    fn test_remove_root_with_two_children() {
        let mut map = AvlTreeMap::new();
        for key in [4, 2, 6, 1, 3, 5, 7] {
            map.insert(key, ()).unwrap();
        }
        assert_eq!(map.remove_entry(&4), Some((4, ())));
        map.check_consistency();
        assert_eq!(root_key(&map), Some(5));
        assert_eq!(map.len(), 6);
    }

    #[test]
    fn test_duplicate_insert() {
        let mut map = AvlTreeMap::new();
        for key in [5, 3, 8] {
            map.insert(key, ()).unwrap();
        }
        let before = shape(&map);
        assert_eq!(map.insert(3, ()), Err(Error::DuplicateKey));
        assert_eq!(map.len(), 3);
        assert_eq!(shape(&map), before);
        map.check_consistency();
    }

    #[test]
    fn test_insert_sorted_range() {
        let mut map = AvlTreeMap::new();
        for value in 0..N {
            map.insert(value, value).unwrap();
            map.check_consistency();
        }
        assert_eq!(map.len(), N as usize);
        // An AVL tree of n nodes is at most ~1.44 log2(n) high.
        assert!(map.height() <= 15);
        assert!(map.get(&-42).is_none());
    }

    #[test]
    fn test_remove() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut values: Vec<i32> = (0..N).map(|_| rng.gen()).collect();
        values.sort();
        values.dedup();

        let mut map = AvlTreeMap::new();
        for value in &values {
            map.insert(*value, *value).unwrap();
        }

        values.shuffle(&mut rng);
        for value in &values {
            assert!(map.get(value).is_some());
            assert_eq!(map.remove_entry(value), Some((*value, *value)));
            assert!(map.get(value).is_none());
            map.check_consistency();
        }
        assert!(map.is_empty());
        assert!(map.tree.root().is_none());
    }

    #[test]
    fn test_debug() {
        let mut map = AvlTreeMap::new();
        map.insert(2, "b").unwrap();
        map.insert(1, "a").unwrap();
        assert_eq!(format!("{map:?}"), r#"{1: "a", 2: "b"}"#);
        assert_eq!(map[&2], "b");
    }
}
