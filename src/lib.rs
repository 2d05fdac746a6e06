//! Ordered maps backed by self-balancing binary search trees.
//!
//! Two engines implement the same [`OrderedMap`] contract:
//!
//! - [`AvlTreeMap`] keeps every node's subtree heights within one of each
//!   other, tracked with a per-node balance factor.
//! - [`RbTreeMap`] keeps red-black coloring rules, which bound the longest
//!   path to twice the shortest.
//!
//! Both store their nodes in a per-map arena and link them with integer
//! handles. Insert, lookup and removal take O(log n); iteration visits the
//! entries in ascending key order in O(n) with O(1) extra space.
//!
//! ```
//! use balanced_map::{AvlTreeMap, Error, OrderedMap};
//!
//! let mut map = AvlTreeMap::new();
//! map.insert(3, "three")?;
//! map.insert(1, "one")?;
//! map.insert(2, "two")?;
//! assert_eq!(map.insert(2, "deux"), Err(Error::DuplicateKey));
//! assert_eq!(map.lookup(&4), Err(Error::KeyNotFound));
//!
//! let keys: Vec<_> = map.keys().copied().collect();
//! assert_eq!(keys, [1, 2, 3]);
//! # Ok::<(), Error>(())
//! ```
//!
//! Enable the `consistency_check` feature to get `check_consistency()` on
//! both maps, which panics if any tree invariant is broken.

mod arena;
mod avl;
mod error;
mod iter;
mod ordered_map;
mod raw;
mod rb;

pub use avl::AvlTreeMap;
pub use error::{Error, Result};
pub use iter::{Iter, Keys, Values};
pub use ordered_map::OrderedMap;
pub use rb::{Color, RbTreeMap};
