//! Arena-backed binary search tree shared by the AVL and red-black engines.
//!
//! Nodes refer to each other through [`Handle`]s. Child and parent links sit
//! in [`Cell`]s so the in-order iterator can thread and unthread right links
//! through a shared borrow; everything else about a node changes only through
//! `&mut RawTree`.

use std::cell::Cell;
use std::cmp::Ordering;
use std::fmt;
use std::mem;

use crate::arena::{Arena, Handle};
use crate::error::{Error, Result};

pub(crate) type Link = Option<Handle>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    Left,
    Right,
}

impl Dir {
    #[inline]
    pub(crate) fn opposite(self) -> Self {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }

    /// Contribution of this side to a `right - left` balance factor.
    #[inline]
    pub(crate) fn sign(self) -> i8 {
        match self {
            Dir::Left => -1,
            Dir::Right => 1,
        }
    }

    #[inline]
    fn slot(self) -> usize {
        match self {
            Dir::Left => 0,
            Dir::Right => 1,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Node<K, V, M> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) meta: M,
    parent: Cell<Link>,
    children: [Cell<Link>; 2],
}

#[derive(Clone, Debug)]
pub(crate) struct RawTree<K, V, M> {
    nodes: Arena<Node<K, V, M>>,
    root: Cell<Link>,
    len: Cell<usize>,
}

#[derive(Clone, Copy)]
enum Direction {
    FromParent,
    FromLeft,
    FromRight,
}

impl<K, V, M> RawTree<K, V, M> {
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: Cell::new(None),
            len: Cell::new(0),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            root: Cell::new(None),
            len: Cell::new(0),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len.get()
    }

    #[inline]
    pub(crate) fn root(&self) -> Link {
        self.root.get()
    }

    /// Empties the tree's view of its nodes and returns what `restore` needs
    /// to bring them back. Nodes stay in the arena meanwhile.
    pub(crate) fn detach(&self) -> (Link, usize) {
        (self.root.take(), self.len.take())
    }

    pub(crate) fn restore(&self, (root, len): (Link, usize)) {
        self.root.set(root);
        self.len.set(len);
    }

    #[inline]
    pub(crate) fn node(&self, handle: Handle) -> &Node<K, V, M> {
        &self.nodes[handle]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, handle: Handle) -> &mut Node<K, V, M> {
        &mut self.nodes[handle]
    }

    #[inline]
    pub(crate) fn child(&self, handle: Handle, dir: Dir) -> Link {
        self.nodes[handle].children[dir.slot()].get()
    }

    #[inline]
    pub(crate) fn set_child(&self, handle: Handle, dir: Dir, link: Link) {
        self.nodes[handle].children[dir.slot()].set(link);
    }

    #[inline]
    pub(crate) fn parent(&self, handle: Handle) -> Link {
        self.nodes[handle].parent.get()
    }

    #[inline]
    fn set_parent(&self, handle: Handle, link: Link) {
        self.nodes[handle].parent.set(link);
    }

    /// Which side of `parent` holds `child`.
    #[inline]
    pub(crate) fn side_of(&self, parent: Handle, child: Handle) -> Dir {
        if self.child(parent, Dir::Left) == Some(child) {
            Dir::Left
        } else {
            debug_assert_eq!(self.child(parent, Dir::Right), Some(child));
            Dir::Right
        }
    }

    /// Leftmost node of the subtree rooted at `handle`.
    pub(crate) fn min(&self, mut handle: Handle) -> Handle {
        while let Some(left) = self.child(handle, Dir::Left) {
            handle = left;
        }
        handle
    }

    /// Puts `replacement` where `node` hangs, under `node`'s parent or as root.
    /// `node`'s own links are left alone.
    pub(crate) fn transplant(&mut self, node: Handle, replacement: Link) {
        let parent = self.parent(node);
        match parent {
            None => self.root.set(replacement),
            Some(parent) => {
                let side = self.side_of(parent, node);
                self.set_child(parent, side, replacement);
            }
        }
        if let Some(replacement) = replacement {
            self.set_parent(replacement, parent);
        }
    }

    /// Rotates `node` down towards `dir`; its child on the other side takes
    /// its place. Returns the new subtree root.
    pub(crate) fn rotate(&mut self, node: Handle, dir: Dir) -> Handle {
        let pivot = self
            .child(node, dir.opposite())
            .expect("rotation pivot must exist");
        let inner = self.child(pivot, dir);

        self.set_child(node, dir.opposite(), inner);
        if let Some(inner) = inner {
            self.set_parent(inner, Some(node));
        }

        self.transplant(node, Some(pivot));

        self.set_child(pivot, dir, Some(node));
        self.set_parent(node, Some(pivot));
        pivot
    }

    /// Exchanges the entries stored in two nodes, leaving links and metadata.
    pub(crate) fn swap_entries(&mut self, a: Handle, b: Handle) {
        let (a, b) = self.nodes.pair_mut(a, b);
        mem::swap(&mut a.key, &mut b.key);
        mem::swap(&mut a.value, &mut b.value);
    }

    /// Splices out a node with at most one child and frees its slot.
    ///
    /// Returns the node and the child that took its place.
    pub(crate) fn splice(&mut self, handle: Handle) -> (Node<K, V, M>, Link) {
        let left = self.child(handle, Dir::Left);
        let right = self.child(handle, Dir::Right);
        debug_assert!(left.is_none() || right.is_none());
        let replacement = left.or(right);
        self.transplant(handle, replacement);
        self.len.set(self.len() - 1);
        (self.nodes.take(handle), replacement)
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root.set(None);
        self.len.set(0);
    }

    /// Visits nodes in ascending order by following parent links, without
    /// touching the tree.
    pub(crate) fn walk<F: FnMut(Handle)>(&self, mut visit: F) {
        let Some(mut handle) = self.root() else {
            return;
        };
        let mut dir = Direction::FromParent;
        loop {
            match dir {
                Direction::FromParent => match self.child(handle, Dir::Left) {
                    Some(left) => handle = left,
                    None => dir = Direction::FromLeft,
                },
                Direction::FromLeft => {
                    visit(handle);
                    match self.child(handle, Dir::Right) {
                        Some(right) => {
                            handle = right;
                            dir = Direction::FromParent;
                        }
                        None => dir = Direction::FromRight,
                    }
                }
                Direction::FromRight => match self.parent(handle) {
                    Some(parent) => {
                        dir = match self.side_of(parent, handle) {
                            Dir::Left => Direction::FromLeft,
                            Dir::Right => Direction::FromRight,
                        };
                        handle = parent;
                    }
                    None => break,
                },
            }
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, M> RawTree<K, V, M> {
    pub(crate) fn fmt_entries(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries = f.debug_map();
        self.walk(|handle| {
            let node = self.node(handle);
            entries.entry(&node.key, &node.value);
        });
        entries.finish()
    }
}

impl<K: Ord, V, M> RawTree<K, V, M> {
    pub(crate) fn find(&self, key: &K) -> Link {
        let mut current = self.root();
        while let Some(handle) = current {
            current = match key.cmp(&self.nodes[handle].key) {
                Ordering::Equal => break,
                Ordering::Less => self.child(handle, Dir::Left),
                Ordering::Greater => self.child(handle, Dir::Right),
            };
        }
        current
    }

    /// Descends to the empty link where `key` belongs.
    ///
    /// `Ok(None)` means the tree is empty and the key becomes the root.
    pub(crate) fn find_insert_pos(&self, key: &K) -> Result<Option<(Handle, Dir)>> {
        let mut position = None;
        let mut current = self.root();
        while let Some(handle) = current {
            let dir = match key.cmp(&self.nodes[handle].key) {
                Ordering::Equal => return Err(Error::DuplicateKey),
                Ordering::Less => Dir::Left,
                Ordering::Greater => Dir::Right,
            };
            position = Some((handle, dir));
            current = self.child(handle, dir);
        }
        Ok(position)
    }

    /// Hangs a new leaf at a position returned by `find_insert_pos`.
    pub(crate) fn attach(
        &mut self,
        position: Option<(Handle, Dir)>,
        key: K,
        value: V,
        meta: M,
    ) -> Handle {
        if position.is_none() {
            // Nothing is reachable, so any occupied slot was leaked by a
            // forgotten iterator.
            self.nodes.clear();
        }
        let handle = self.nodes.alloc(Node {
            key,
            value,
            meta,
            parent: Cell::new(position.map(|(parent, _)| parent)),
            children: [Cell::new(None), Cell::new(None)],
        });
        match position {
            None => self.root.set(Some(handle)),
            Some((parent, dir)) => self.set_child(parent, dir, Some(handle)),
        }
        self.len.set(self.len() + 1);
        handle
    }

    /// Checks links, key order and the count, folding `combine` bottom-up
    /// over every subtree. `empty` is the value for an absent child.
    #[cfg(any(test, feature = "consistency_check"))]
    pub(crate) fn check_structure<R: Copy>(
        &self,
        empty: R,
        mut combine: impl FnMut(&Node<K, V, M>, R, R) -> R,
    ) -> R {
        fn fold<K: Ord, V, M, R: Copy>(
            tree: &RawTree<K, V, M>,
            link: Link,
            empty: R,
            count: &mut usize,
            combine: &mut impl FnMut(&Node<K, V, M>, R, R) -> R,
        ) -> R {
            let Some(handle) = link else {
                return empty;
            };
            *count += 1;
            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = tree.child(handle, dir) {
                    assert_eq!(tree.parent(child), Some(handle), "broken parent link");
                    let expected = match dir {
                        Dir::Left => Ordering::Less,
                        Dir::Right => Ordering::Greater,
                    };
                    assert_eq!(
                        tree.node(child).key.cmp(&tree.node(handle).key),
                        expected,
                        "key order violated"
                    );
                }
            }
            let left = fold(tree, tree.child(handle, Dir::Left), empty, count, combine);
            let right = fold(tree, tree.child(handle, Dir::Right), empty, count, combine);
            combine(tree.node(handle), left, right)
        }

        if let Some(root) = self.root() {
            assert!(self.parent(root).is_none(), "root has a parent");
        }
        let mut count = 0;
        let result = fold(self, self.root(), empty, &mut count, &mut combine);
        assert_eq!(count, self.len(), "reachable nodes differ from len");
        assert_eq!(self.nodes.len(), self.len(), "leaked arena slots");

        let mut previous: Option<&K> = None;
        self.walk(|handle| {
            let key = &self.node(handle).key;
            if let Some(previous) = previous {
                assert!(previous < key, "walk out of order");
            }
            previous = Some(key);
        });
        result
    }
}
