//! Specialized collection types
//!
//! [`GenArena`] is the slot store behind bodies and colliders. Slots are never
//! removed from the backing vector; destroying an entry resets it to its
//! default (invalid) value and bumps the slot's generation, so any handle
//! issued before the destroy stops resolving.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Values that can live in a [`GenArena`]
///
/// `Default` must produce the invalid value; a slot is free exactly when
/// `is_valid()` returns false.
pub trait Slot: Default {
    /// Whether this slot currently holds a live entry
    fn is_valid(&self) -> bool;
}

/// Typed generational handle
///
/// Plain value type compared by `(index, generation)`.
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Create a handle from raw parts
    pub const fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _phantom: PhantomData,
        }
    }

    /// Slot index
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Generation the slot had when this handle was issued
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

// Manual impls so `T` itself needs none of these traits
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.index, self.generation).cmp(&(other.index, other.generation))
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

/// Generation-indexed slot array
#[derive(Debug, Clone)]
pub struct GenArena<T> {
    slots: Vec<T>,
    generations: Vec<u32>,
}

impl<T: Slot> GenArena<T> {
    /// Create an arena with `capacity` pre-sized invalid slots
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, T::default);
        Self {
            slots,
            generations: vec![0; capacity],
        }
    }

    /// Claim the first invalid slot, doubling the backing storage if none is free
    ///
    /// The slot is left at its default value; the caller makes it valid.
    pub fn claim(&mut self) -> Handle<T> {
        let index = match self.slots.iter().position(|slot| !slot.is_valid()) {
            Some(index) => index,
            None => {
                let old_len = self.slots.len();
                let new_len = old_len * 2;
                log::debug!("Growing arena from {} to {} slots", old_len, new_len);
                self.slots.resize_with(new_len, T::default);
                self.generations.resize(new_len, 0);
                old_len
            }
        };
        Handle::new(index as u32, self.generations[index])
    }

    /// Reset the slot to its default value and invalidate all outstanding handles
    pub fn release(&mut self, handle: Handle<T>) -> Option<T> {
        if !self.contains(handle) {
            return None;
        }
        let index = handle.index as usize;
        self.generations[index] += 1;
        Some(std::mem::take(&mut self.slots[index]))
    }

    /// Whether `handle` still refers to the slot's current generation
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.generations
            .get(handle.index as usize)
            .is_some_and(|&generation| generation == handle.generation)
    }

    /// Slot for `handle`, or `None` if the handle is stale
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        if self.contains(handle) {
            self.slots.get(handle.index as usize)
        } else {
            None
        }
    }

    /// Mutable slot for `handle`, or `None` if the handle is stale
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        if self.contains(handle) {
            self.slots.get_mut(handle.index as usize)
        } else {
            None
        }
    }

    /// Mutable slots for two distinct handles at once
    ///
    /// Returns `None` if either handle is stale or both name the same slot.
    pub fn get2_mut(&mut self, a: Handle<T>, b: Handle<T>) -> Option<(&mut T, &mut T)> {
        if !self.contains(a) || !self.contains(b) || a.index == b.index {
            return None;
        }
        let (ia, ib) = (a.index as usize, b.index as usize);
        if ia < ib {
            let (low, high) = self.slots.split_at_mut(ib);
            Some((&mut low[ia], &mut high[0]))
        } else {
            let (low, high) = self.slots.split_at_mut(ia);
            Some((&mut high[0], &mut low[ib]))
        }
    }

    /// Current handle for slot `index`
    pub fn handle_at(&self, index: usize) -> Handle<T> {
        Handle::new(index as u32, self.generations[index])
    }

    /// Number of slots, valid or not
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the arena has no slots at all
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Valid entries with their handles, in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots
            .iter()
            .zip(&self.generations)
            .enumerate()
            .filter(|(_, (slot, _))| slot.is_valid())
            .map(|(index, (slot, &generation))| (Handle::new(index as u32, generation), slot))
    }

    /// Mutable valid entries, in slot order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().filter(|slot| slot.is_valid())
    }
}
