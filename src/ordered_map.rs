use std::mem;

use crate::error::{Error, Result};
use crate::iter::{Iter, Keys, Values};

/// Operations shared by every balancing strategy.
///
/// Code written against this trait works unchanged with
/// [`AvlTreeMap`](crate::AvlTreeMap) and [`RbTreeMap`](crate::RbTreeMap).
///
/// ```
/// use balanced_map::{AvlTreeMap, Error, OrderedMap, RbTreeMap};
///
/// fn fill<M: OrderedMap<i32, &'static str>>(map: &mut M) {
///     map.insert(2, "two").unwrap();
///     map.insert(1, "one").unwrap();
///     assert_eq!(map.insert(2, "again"), Err(Error::DuplicateKey));
/// }
///
/// let mut avl = AvlTreeMap::new();
/// let mut rb = RbTreeMap::new();
/// fill(&mut avl);
/// fill(&mut rb);
/// assert!(avl.iter().eq(rb.iter()));
/// ```
pub trait OrderedMap<K: Ord, V> {
    /// Per-node balancing data the engine keeps next to each entry.
    type Meta;

    /// Inserts a new entry.
    ///
    /// Fails with [`Error::DuplicateKey`] and leaves the map untouched if the
    /// key is already present.
    fn insert(&mut self, key: K, value: V) -> Result<()>;

    /// Returns a reference to the value corresponding to the key.
    fn get(&self, key: &K) -> Option<&V>;

    /// Returns a mutable reference to the value corresponding to the key.
    fn get_mut(&mut self, key: &K) -> Option<&mut V>;

    /// Removes a key from the map, returning the stored key and value.
    fn remove_entry(&mut self, key: &K) -> Option<(K, V)>;

    /// Returns the number of entries in the map.
    fn len(&self) -> usize;

    /// Removes every entry.
    fn clear(&mut self);

    /// Gets an iterator over the entries of the map, sorted by key.
    ///
    /// Takes the map mutably: the traversal threads links through the tree
    /// while it runs. Every call starts a fresh traversal.
    fn iter(&mut self) -> Iter<'_, K, V, Self::Meta>;

    /// Removes a key from the map.
    /// Returns whether the key was present.
    fn remove(&mut self, key: &K) -> bool {
        self.remove_entry(key).is_some()
    }

    /// Like [`get`](OrderedMap::get), but reports a missing key as
    /// [`Error::KeyNotFound`].
    fn lookup(&self, key: &K) -> Result<&V> {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Returns true if the map contains a value for the specified key.
    fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Returns true if the map contains no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces the value of an existing key and returns the old value.
    ///
    /// Never inserts: a missing key is [`Error::KeyNotFound`].
    fn update(&mut self, key: &K, value: V) -> Result<V> {
        match self.get_mut(key) {
            Some(slot) => Ok(mem::replace(slot, value)),
            None => Err(Error::KeyNotFound),
        }
    }

    /// Gets an iterator over the keys of the map, in ascending order.
    fn keys(&mut self) -> Keys<'_, K, V, Self::Meta> {
        Keys::new(self.iter())
    }

    /// Gets an iterator over the values of the map, in ascending key order.
    fn values(&mut self) -> Values<'_, K, V, Self::Meta> {
        Values::new(self.iter())
    }

    /// Clones all entries, in ascending order, into `dest` starting at `index`.
    ///
    /// Fails with [`Error::InvalidArgument`] without writing anything if
    /// `index` is past the end of `dest` or fewer than [`len`](OrderedMap::len)
    /// slots remain after it. An index past the end is rejected even when the
    /// map is empty, since the room left is then negative.
    fn copy_to(&mut self, dest: &mut [(K, V)], index: usize) -> Result<()>
    where
        K: Clone,
        V: Clone,
    {
        if index > dest.len() {
            return Err(Error::InvalidArgument("destination index out of range"));
        }
        if dest.len() - index < self.len() {
            return Err(Error::InvalidArgument("destination too small"));
        }
        for (slot, (key, value)) in dest[index..].iter_mut().zip(self.iter()) {
            *slot = (key.clone(), value.clone());
        }
        Ok(())
    }
}
