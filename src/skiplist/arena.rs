// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

use std::{
    mem,
    ops::{
        Index,
        IndexMut,
    },
};

#[derive(Debug)]
enum Slot<T> {
    Occupied(T),
    Vacant,
}

/// Index-addressed node storage. Slot indices stay stable for the lifetime of
/// the value stored in them, and vacated slots are recycled by later
/// allocations.
#[derive(Debug)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<usize>,
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Self {
        Arena {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    pub(crate) fn alloc(&mut self, value: T) -> usize {
        match self.free_list.pop() {
            | Some(idx) => {
                self.slots[idx] = Slot::Occupied(value);
                idx
            },
            | None => {
                self.slots.push(Slot::Occupied(value));
                self.slots.len() - 1
            },
        }
    }

    /// Release the slot at `idx`, handing back what was stored there. Freeing
    /// an already vacant slot returns `None` and leaves the free list alone.
    pub(crate) fn free(&mut self, idx: usize) -> Option<T> {
        let slot = self.slots.get_mut(idx)?;
        match mem::replace(slot, Slot::Vacant) {
            | Slot::Occupied(value) => {
                self.free_list.push(idx);
                Some(value)
            },
            | Slot::Vacant => None,
        }
    }

    pub(crate) fn get(&self, idx: usize) -> Option<&T> {
        match self.slots.get(idx)? {
            | Slot::Occupied(value) => Some(value),
            | Slot::Vacant => None,
        }
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        match self.slots.get_mut(idx)? {
            | Slot::Occupied(value) => Some(value),
            | Slot::Vacant => None,
        }
    }

    /// Drop every slot from `keep` onwards and empty the free list. Slots
    /// below `keep` must be occupied.
    pub(crate) fn truncate(&mut self, keep: usize) {
        self.slots.truncate(keep);
        self.free_list.clear();
    }

    /// Number of occupied slots.
    pub(crate) fn occupied(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Number of slots ever handed out, vacant ones included.
    #[cfg(test)]
    pub(crate) fn slots(&self) -> usize {
        self.slots.len()
    }
}

impl<T> Index<usize> for Arena<T> {
    type Output = T;

    fn index(&self, idx: usize) -> &T {
        match self.get(idx) {
            | Some(value) => value,
            | None => panic!("arena slot {idx} is vacant"),
        }
    }
}

impl<T> IndexMut<usize> for Arena<T> {
    fn index_mut(&mut self, idx: usize) -> &mut T {
        match self.get_mut(idx) {
            | Some(value) => value,
            | None => panic!("arena slot {idx} is vacant"),
        }
    }
}
