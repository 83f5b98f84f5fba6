//! Index-stable entity storage
//!
//! Slots are never shifted. Removal happens only in [`Arena::sweep`], which
//! the session runs once at the end of a tick; freed slots are recycled with
//! a bumped generation so stale [`Handle`]s stop resolving.

use serde::{Deserialize, Serialize};

use super::entity::Entity;

/// Generation-checked reference to an arena slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle {
    pub index: u32,
    pub generation: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn insert(&mut self, value: T) -> Handle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return Handle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        Handle {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.value.as_mut())
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Number of stored entries (active or not)
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate entries in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.value.as_ref().map(|v| {
                (
                    Handle {
                        index: i as u32,
                        generation: s.generation,
                    },
                    v,
                )
            })
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, s)| {
            let generation = s.generation;
            s.value.as_mut().map(|v| {
                (
                    Handle {
                        index: i as u32,
                        generation,
                    },
                    v,
                )
            })
        })
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|s| s.value.as_ref())
    }

    /// Drop every entry and invalidate all outstanding handles
    pub fn clear(&mut self) {
        self.free.clear();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.value = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(i as u32);
        }
        self.len = 0;
    }

    /// Remove entries failing `keep`, returning how many were dropped
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) -> usize {
        let mut removed = 0;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.as_ref().is_some_and(|v| !keep(v)) {
                slot.value = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(i as u32);
                removed += 1;
            }
        }
        self.len -= removed;
        removed
    }
}

impl<T: Entity> Arena<T> {
    /// Update every active entry (inactive ones are skipped)
    pub fn update_all(&mut self, dt: f32) {
        for slot in &mut self.slots {
            if let Some(entity) = slot.value.as_mut().filter(|e| e.is_active()) {
                entity.update(dt);
            }
        }
    }

    /// End-of-tick compaction: drop inactive entries
    pub fn sweep(&mut self) -> usize {
        self.retain(|e| e.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.values().filter(|e| e.is_active()).count()
    }
}
