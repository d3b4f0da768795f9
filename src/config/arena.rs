//! Slot storage for tree nodes.
//!
//! Nodes live in a vector of slots addressed by [NodeId]. Freed slots are recycled, so a
//! handle is only meaningful while the node it was issued for is still in the tree.

use std::ops::{Index, IndexMut};

/// Handle to a node inside one [ConfigTree](super::ConfigTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<u32>,
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn alloc(&mut self, value: T) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                self.slots[index as usize] = Some(value);
                NodeId(index)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Some(value));
                NodeId(index)
            }
        }
    }

    pub(crate) fn release(&mut self, id: NodeId) -> Option<T> {
        let value = self.slots.get_mut(id.0 as usize)?.take()?;
        self.free.push(id.0);
        Some(value)
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&T> {
        self.slots.get(id.0 as usize)?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.slots.get_mut(id.0 as usize)?.as_mut()
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live values.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}

impl<T> Index<NodeId> for Arena<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        match self.get(id) {
            Some(value) => value,
            None => panic!("stale node handle {id:?}"),
        }
    }
}

impl<T> IndexMut<NodeId> for Arena<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        match self.get_mut(id) {
            Some(value) => value,
            None => panic!("stale node handle {id:?}"),
        }
    }
}
