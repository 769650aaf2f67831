//! Mark-dead-then-compact storage used by the merge passes.

use crate::error::Result;

/// A vector whose slots can be killed in place and squeezed out later.
///
/// Indices stay stable while items are being merged; [`Tombstones::compact`]
/// removes the dead slots in one pass, preserving the order of survivors.
#[derive(Debug, Clone)]
pub struct Tombstones<T> {
    slots: Vec<Option<T>>,
}

impl<T> Tombstones<T> {
    /// Build `n` live slots from `make(i)`.
    pub fn build(n: usize, mut make: impl FnMut(usize) -> T) -> Result<Self> {
        let mut slots = Vec::new();
        slots.try_reserve_exact(n)?;
        slots.extend((0..n).map(|i| Some(make(i))));
        Ok(Self { slots })
    }

    /// Number of slots, live or dead.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The item at `i`, unless it has been killed.
    pub fn get(&self, i: usize) -> Option<&T> {
        self.slots.get(i).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, i: usize) -> Option<&mut T> {
        self.slots.get_mut(i).and_then(Option::as_mut)
    }

    /// Kill slot `i`, returning its item.
    pub fn take(&mut self, i: usize) -> Option<T> {
        self.slots.get_mut(i).and_then(Option::take)
    }

    /// Drop dead slots, keeping survivors in index order.
    pub fn compact(self) -> Vec<T> {
        self.slots.into_iter().flatten().collect()
    }
}
