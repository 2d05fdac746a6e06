use std::num::NonZeroU32;
use std::ops::{Index, IndexMut};

/// Stable index of a node slot.
///
/// Stored off by one so that `Option<Handle>` is the size of a `u32`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub(crate) struct Handle(NonZeroU32);

impl Handle {
    pub(crate) const MAX: usize = (u32::MAX - 1) as usize;

    #[inline]
    fn from_index(index: usize) -> Self {
        assert!(
            index <= Self::MAX,
            "node arena exhausted ({} slots)",
            Self::MAX
        );
        match NonZeroU32::new(index as u32 + 1) {
            Some(raw) => Self(raw),
            None => unreachable!(),
        }
    }

    #[inline]
    fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// Slot storage owning every node of one tree.
///
/// Removed slots go on a free list and are handed out again by `alloc`.
#[derive(Clone, Debug)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<Handle>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    /// Number of occupied slots.
    #[cfg(any(test, feature = "consistency_check"))]
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn alloc(&mut self, element: T) -> Handle {
        match self.free.pop() {
            Some(handle) => {
                self.slots[handle.index()] = Some(element);
                handle
            }
            None => {
                let handle = Handle::from_index(self.slots.len());
                self.slots.push(Some(element));
                handle
            }
        }
    }

    /// Empties the slot and returns its element.
    pub(crate) fn take(&mut self, handle: Handle) -> T {
        let element = self.slots[handle.index()]
            .take()
            .unwrap_or_else(|| panic!("stale handle {handle:?}"));
        self.free.push(handle);
        element
    }

    /// Borrows two distinct slots mutably at once.
    pub(crate) fn pair_mut(&mut self, a: Handle, b: Handle) -> (&mut T, &mut T) {
        let (i, j) = (a.index(), b.index());
        assert_ne!(i, j, "`Arena::pair_mut()` needs two distinct handles");
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        let (head, tail) = self.slots.split_at_mut(hi);
        let (lo_slot, hi_slot) = (&mut head[lo], &mut tail[0]);
        let (lo_ref, hi_ref) = match (lo_slot.as_mut(), hi_slot.as_mut()) {
            (Some(lo_ref), Some(hi_ref)) => (lo_ref, hi_ref),
            _ => panic!("stale handle in {a:?} / {b:?}"),
        };
        if i < j {
            (lo_ref, hi_ref)
        } else {
            (hi_ref, lo_ref)
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

impl<T> Index<Handle> for Arena<T> {
    type Output = T;

    #[inline]
    fn index(&self, handle: Handle) -> &T {
        match &self.slots[handle.index()] {
            Some(element) => element,
            None => panic!("stale handle {handle:?}"),
        }
    }
}

impl<T> IndexMut<Handle> for Arena<T> {
    #[inline]
    fn index_mut(&mut self, handle: Handle) -> &mut T {
        match &mut self.slots[handle.index()] {
            Some(element) => element,
            None => panic!("stale handle {handle:?}"),
        }
    }
}
