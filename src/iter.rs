//! Ascending iteration by threaded in-order traversal.
//!
//! Each left subtree's rightmost node has its empty right link temporarily
//! pointed back at the subtree's parent, so no stack is needed. A thread is
//! removed on the second visit. The iterator holds the only borrow of the map
//! for its whole life, and dropping it early finishes the walk so that no
//! thread is left behind.
//!
//! While an iterator is alive the map's root and count are detached, and only
//! `Drop` puts them back. A leaked iterator leaves an empty map behind, never
//! a threaded one.

use std::iter::FusedIterator;

use crate::raw::{Dir, Link, RawTree};

/// An iterator over the entries of a map, in ascending key order.
///
/// Created by [`OrderedMap::iter`](crate::OrderedMap::iter).
pub struct Iter<'a, K, V, M> {
    tree: &'a RawTree<K, V, M>,
    root: Link,
    len: usize,
    current: Link,
    remaining: usize,
}

/// An iterator over the keys of a map, in ascending order.
pub struct Keys<'a, K, V, M> {
    inner: Iter<'a, K, V, M>,
}

/// An iterator over the values of a map, in ascending key order.
pub struct Values<'a, K, V, M> {
    inner: Iter<'a, K, V, M>,
}

impl<'a, K, V, M> Iter<'a, K, V, M> {
    pub(crate) fn new(tree: &'a mut RawTree<K, V, M>) -> Self {
        let tree: &'a RawTree<K, V, M> = tree;
        let (root, len) = tree.detach();
        Self {
            tree,
            root,
            len,
            current: root,
            remaining: len,
        }
    }
}

impl<'a, K, V, M> Iterator for Iter<'a, K, V, M> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        while let Some(current) = self.current {
            let Some(left) = tree.child(current, Dir::Left) else {
                self.current = tree.child(current, Dir::Right);
                self.remaining -= 1;
                let node = tree.node(current);
                return Some((&node.key, &node.value));
            };

            // Rightmost node of the left subtree, or the one threaded to us.
            let mut predecessor = left;
            while let Some(right) = tree.child(predecessor, Dir::Right) {
                if right == current {
                    break;
                }
                predecessor = right;
            }

            if tree.child(predecessor, Dir::Right).is_none() {
                tree.set_child(predecessor, Dir::Right, Some(current));
                self.current = Some(left);
            } else {
                tree.set_child(predecessor, Dir::Right, None);
                self.current = tree.child(current, Dir::Right);
                self.remaining -= 1;
                let node = tree.node(current);
                return Some((&node.key, &node.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, M> ExactSizeIterator for Iter<'_, K, V, M> {}

impl<K, V, M> FusedIterator for Iter<'_, K, V, M> {}

impl<K, V, M> Drop for Iter<'_, K, V, M> {
    fn drop(&mut self) {
        // Unthreads whatever the caller did not consume.
        for _ in self.by_ref() {}
        self.tree.restore((self.root, self.len));
    }
}

impl<'a, K, V, M> Keys<'a, K, V, M> {
    pub(crate) fn new(inner: Iter<'a, K, V, M>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V, M> Iterator for Keys<'a, K, V, M> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, M> ExactSizeIterator for Keys<'_, K, V, M> {}

impl<K, V, M> FusedIterator for Keys<'_, K, V, M> {}

impl<'a, K, V, M> Values<'a, K, V, M> {
    pub(crate) fn new(inner: Iter<'a, K, V, M>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V, M> Iterator for Values<'a, K, V, M> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, M> ExactSizeIterator for Values<'_, K, V, M> {}

impl<K, V, M> FusedIterator for Values<'_, K, V, M> {}
