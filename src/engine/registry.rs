//! Node Registry - Slot allocation for the document arena.
//!
//! Manages the lifecycle of node slots:
//! - Free index pool for O(1) reuse
//! - Generation counter per slot so released handles go stale
//! - Allocated count for leak checks in tests

use crate::types::NodeId;

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generation-checked arena handing out [`NodeId`] handles.
pub(crate) struct Registry<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    allocated: usize,
}

impl<T> Registry<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            allocated: 0,
        }
    }

    /// Store `value` in a free slot (or a new one) and return its handle.
    pub(crate) fn allocate(&mut self, value: T) -> NodeId {
        self.allocated += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Free the slot behind `id`. Returns the stored value, or `None` if the
    /// handle was already stale.
    pub(crate) fn release(&mut self, id: NodeId) -> Option<T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;

        // Bump so every outstanding copy of `id` goes stale
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.allocated -= 1;
        Some(value)
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&T> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    pub(crate) fn is_allocated(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Count of currently allocated slots.
    pub(crate) fn len(&self) -> usize {
        self.allocated
    }
}
