//! Sparse-set component storage.
//!
//! Values live in a dense array for cache-friendly iteration. A sparse array
//! indexed by entity slot points into it. Removal swaps the last element into
//! the hole.

use std::any::Any;

use bytemuck::Pod;

use crate::component::Component;
use crate::entity::Entity;

#[derive(Debug)]
pub struct ComponentStore<T: Component> {
    sparse: Vec<Option<u32>>,
    entities: Vec<Entity>,
    data: Vec<T>,
}

impl<T: Component> Default for ComponentStore<T> {
    fn default() -> Self {
        Self {
            sparse: Vec::new(),
            entities: Vec::new(),
            data: Vec::new(),
        }
    }
}

impl<T: Component> ComponentStore<T> {
    fn dense_index(&self, entity: Entity) -> Option<usize> {
        let dense = (*self.sparse.get(entity.index() as usize)?)? as usize;
        (self.entities[dense] == entity).then_some(dense)
    }

    /// Insert or replace, returning the previous value.
    pub fn insert(&mut self, entity: Entity, value: T) -> Option<T> {
        if let Some(dense) = self.dense_index(entity) {
            return Some(std::mem::replace(&mut self.data[dense], value));
        }
        // A stale entry from an older generation is dropped first.
        self.remove_slot(entity.index() as usize);

        let slot = entity.index() as usize;
        if slot >= self.sparse.len() {
            self.sparse.resize(slot + 1, None);
        }
        self.sparse[slot] = Some(self.data.len() as u32);
        self.entities.push(entity);
        self.data.push(value);
        None
    }

    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        self.dense_index(entity)?;
        self.remove_slot(entity.index() as usize)
    }

    fn remove_slot(&mut self, slot: usize) -> Option<T> {
        let dense = self.sparse.get_mut(slot)?.take()? as usize;
        let value = self.data.swap_remove(dense);
        self.entities.swap_remove(dense);
        if let Some(moved) = self.entities.get(dense) {
            self.sparse[moved.index() as usize] = Some(dense as u32);
        }
        Some(value)
    }

    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.dense_index(entity).map(|i| &self.data[i])
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.dense_index(entity).map(|i| &mut self.data[i])
    }

    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.dense_index(entity).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Dense order, which is not entity order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.entities.iter().copied().zip(self.data.iter())
    }
}

impl<T: Component + Pod> ComponentStore<T> {
    /// The dense column as raw bytes, e.g. for upload to a GPU buffer.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

/// Type-erased view so the world can keep heterogeneous stores together.
pub(crate) trait AnyStore: Any + Send + Sync {
    fn remove_entity(&mut self, entity: Entity);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> AnyStore for ComponentStore<T> {
    fn remove_entity(&mut self, entity: Entity) {
        self.remove(entity);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
