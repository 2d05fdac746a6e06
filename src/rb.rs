//! An ordered map implemented with a red-black tree.
//!
//! Absent children are the nil sentinel: every `None` link reads as a Black
//! leaf that holds no entry. The removal fixup tracks the sentinel's parent
//! explicitly as a `(parent, side)` pair.

use std::fmt;
use std::ops::Index;

use log::{debug, trace};

use crate::arena::Handle;
use crate::error::Result;
use crate::iter::Iter;
use crate::ordered_map::OrderedMap;
use crate::raw::{Dir, Link, RawTree};

/// Node color of a red-black tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

/// An ordered map implemented with a red-black tree.
///
/// ```
/// use balanced_map::{OrderedMap, RbTreeMap};
/// let mut map = RbTreeMap::new();
/// for (i, word) in ["zero", "one", "two", "three"].into_iter().enumerate() {
///     map.insert(i, word).unwrap();
/// }
/// assert_eq!(map.update(&3, "drei"), Ok("three"));
/// assert_eq!(map.values().copied().collect::<Vec<_>>(), ["zero", "one", "two", "drei"]);
/// ```
#[derive(Clone)]
pub struct RbTreeMap<K, V> {
    tree: RawTree<K, V, Color>,
}

/// Step taken while a red node has a red parent after insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InsertFixup {
    /// Uncle is red: push the grandparent's blackness down, retry there.
    RecolorUncle,
    /// Uncle is black and the node is an inner grandchild: rotate it outward
    /// first, then finish as `RotateOuter`.
    RotateInner,
    /// Uncle is black and the node is an outer grandchild: rotate the
    /// grandparent.
    RotateOuter,
}

impl InsertFixup {
    fn select(uncle: Color, inner: bool) -> Self {
        match (uncle, inner) {
            (Color::Red, _) => InsertFixup::RecolorUncle,
            (Color::Black, true) => InsertFixup::RotateInner,
            (Color::Black, false) => InsertFixup::RotateOuter,
        }
    }
}

/// Step taken while a node carries an extra black after removal.
///
/// `near` and `far` are the sibling's children closest to and farthest from
/// the node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DeleteFixup {
    RedSibling,
    BlackSiblingBlackChildren,
    NearChildRed,
    FarChildRed,
}

impl DeleteFixup {
    fn select(sibling: Color, near: Color, far: Color) -> Self {
        match (sibling, near, far) {
            (Color::Red, _, _) => DeleteFixup::RedSibling,
            (Color::Black, _, Color::Red) => DeleteFixup::FarChildRed,
            (Color::Black, Color::Red, Color::Black) => DeleteFixup::NearChildRed,
            (Color::Black, Color::Black, Color::Black) => DeleteFixup::BlackSiblingBlackChildren,
        }
    }
}

impl<K, V> RbTreeMap<K, V> {
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

    fn color(&self, link: Link) -> Color {
        link.map_or(Color::Black, |handle| self.tree.node(handle).meta)
    }

    fn paint(&mut self, handle: Handle, color: Color) {
        self.tree.node_mut(handle).meta = color;
    }

    fn insert_fixup(&mut self, leaf: Handle) {
        let mut node = leaf;
        while let Some(parent) = self.tree.parent(node) {
            if self.color(Some(parent)) == Color::Black {
                break;
            }
            let grandparent = self.tree.parent(parent).expect("a red node is never the root");
            let parent_side = self.tree.side_of(grandparent, parent);
            let uncle = self.tree.child(grandparent, parent_side.opposite());
            let inner = self.tree.side_of(parent, node) != parent_side;

            let case = InsertFixup::select(self.color(uncle), inner);
            trace!("insert fixup: {case:?}");
            match case {
                InsertFixup::RecolorUncle => {
                    self.paint(parent, Color::Black);
                    if let Some(uncle) = uncle {
                        self.paint(uncle, Color::Black);
                    }
                    self.paint(grandparent, Color::Red);
                    node = grandparent;
                }
                InsertFixup::RotateInner | InsertFixup::RotateOuter => {
                    let top = if case == InsertFixup::RotateInner {
                        self.tree.rotate(parent, parent_side)
                    } else {
                        parent
                    };
                    self.paint(top, Color::Black);
                    self.paint(grandparent, Color::Red);
                    self.tree.rotate(grandparent, parent_side.opposite());
                    break;
                }
            }
        }
        if let Some(root) = self.tree.root() {
            self.paint(root, Color::Black);
        }
    }

    /// Restores equal black-heights after a black node was spliced out.
    ///
    /// `node` took the removed node's place and `above` is where it hangs;
    /// `node` may be the sentinel, so the side is carried along.
    fn delete_fixup(&mut self, mut node: Link, mut above: Option<(Handle, Dir)>) {
        while let Some((parent, side)) = above {
            if self.color(node) == Color::Red {
                break;
            }
            let sibling = self
                .tree
                .child(parent, side.opposite())
                .expect("a doubly black node has a real sibling");
            let near = self.tree.child(sibling, side);
            let far = self.tree.child(sibling, side.opposite());

            let case = DeleteFixup::select(
                self.color(Some(sibling)),
                self.color(near),
                self.color(far),
            );
            trace!("delete fixup: {case:?}");
            match case {
                DeleteFixup::RedSibling => {
                    // The new sibling is black; the next pass picks it up.
                    self.paint(sibling, Color::Black);
                    self.paint(parent, Color::Red);
                    self.tree.rotate(parent, side);
                }
                DeleteFixup::BlackSiblingBlackChildren => {
                    self.paint(sibling, Color::Red);
                    node = Some(parent);
                    above = self
                        .tree
                        .parent(parent)
                        .map(|grandparent| (grandparent, self.tree.side_of(grandparent, parent)));
                }
                DeleteFixup::NearChildRed => {
                    // Turns into `FarChildRed` on the next pass.
                    if let Some(near) = near {
                        self.paint(near, Color::Black);
                    }
                    self.paint(sibling, Color::Red);
                    self.tree.rotate(sibling, side.opposite());
                }
                DeleteFixup::FarChildRed => {
                    let parent_color = self.color(Some(parent));
                    self.paint(sibling, parent_color);
                    self.paint(parent, Color::Black);
                    if let Some(far) = far {
                        self.paint(far, Color::Black);
                    }
                    self.tree.rotate(parent, side);
                    node = self.tree.root();
                    break;
                }
            }
        }
        if let Some(node) = node {
            self.paint(node, Color::Black);
        }
    }

    #[cfg(test)]
    fn root_color(&self) -> Option<Color> {
        self.tree.root().map(|root| self.tree.node(root).meta)
    }
}

impl<K: Ord, V> RbTreeMap<K, V> {
    /// Panics if any node breaks key order or its parent link, if the root
    /// is red, a red node has a red child or black-heights differ, or if the
    /// count is off.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        self.tree.check_structure(
            (1usize, Color::Black),
            |node, (left_height, left), (right_height, right)| {
                assert_eq!(left_height, right_height, "black-height differs");
                if node.meta == Color::Red {
                    assert!(
                        left == Color::Black && right == Color::Black,
                        "red node with red child"
                    );
                }
                let own = usize::from(node.meta == Color::Black);
                (left_height + own, node.meta)
            },
        );
        assert_ne!(
            self.tree.root().map(|root| self.tree.node(root).meta),
            Some(Color::Red),
            "red root"
        );
    }

    /// Number of black nodes on every path from the root to a sentinel,
    /// the sentinel included.
    #[cfg(test)]
    fn black_height(&self) -> usize {
        self.tree.check_structure(1usize, |node, left, _| {
            left + usize::from(node.meta == Color::Black)
        })
    }
}

impl<K: Ord, V> OrderedMap<K, V> for RbTreeMap<K, V> {
    type Meta = Color;

    fn insert(&mut self, key: K, value: V) -> Result<()> {
        let position = self.tree.find_insert_pos(&key).map_err(|err| {
            debug!("red-black insert rejected: {err}");
            err
        })?;
        let leaf = self.tree.attach(position, key, value, Color::Red);
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
        let (node, replacement) = self.tree.splice(handle);
        if node.meta == Color::Black {
            self.delete_fixup(replacement, above);
        }
        Some((node.key, node.value))
    }

    fn len(&self) -> usize {
        self.tree.len()
    }

    fn clear(&mut self) {
        debug!("clearing red-black map with {} entries", self.tree.len());
        self.tree.clear();
    }

    fn iter(&mut self) -> Iter<'_, K, V, Color> {
        Iter::new(&mut self.tree)
    }
}

impl<K, V> Default for RbTreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for RbTreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tree.fmt_entries(f)
    }
}

impl<K: Ord, V> Index<&K> for RbTreeMap<K, V> {
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
