//! Generational entity ids and their allocator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::component::ComponentMask;

/// Entity identifier with a generation to detect stale references.
///
/// Ordering is by index first, then generation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Pack into a single integer, generation in the high half.
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }

    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct EntityMeta {
    pub generation: u32,
    pub alive: bool,
    pub mask: ComponentMask,
}

/// Hands out entity slots and recycles them with a bumped generation.
#[derive(Debug, Default)]
pub(crate) struct EntityAllocator {
    meta: Vec<EntityMeta>,
    free: Vec<u32>,
}

impl EntityAllocator {
    pub fn allocate(&mut self) -> Entity {
        if let Some(index) = self.free.pop() {
            let meta = &mut self.meta[index as usize];
            meta.alive = true;
            meta.mask = ComponentMask::EMPTY;
            return Entity::new(index, meta.generation);
        }
        let index = self.meta.len() as u32;
        self.meta.push(EntityMeta {
            generation: 0,
            alive: true,
            mask: ComponentMask::EMPTY,
        });
        Entity::new(index, 0)
    }

    /// Returns the component mask the entity had, or `None` if it was not alive.
    pub fn free(&mut self, entity: Entity) -> Option<ComponentMask> {
        let meta = self.meta_mut(entity)?;
        let mask = meta.mask;
        meta.alive = false;
        meta.mask = ComponentMask::EMPTY;
        meta.generation = meta.generation.wrapping_add(1);
        self.free.push(entity.index);
        Some(mask)
    }

    pub fn meta(&self, entity: Entity) -> Option<&EntityMeta> {
        self.meta
            .get(entity.index as usize)
            .filter(|m| m.alive && m.generation == entity.generation)
    }

    pub fn meta_mut(&mut self, entity: Entity) -> Option<&mut EntityMeta> {
        self.meta
            .get_mut(entity.index as usize)
            .filter(|m| m.alive && m.generation == entity.generation)
    }

    /// Live entities in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &EntityMeta)> + '_ {
        self.meta
            .iter()
            .enumerate()
            .filter(|(_, m)| m.alive)
            .map(|(i, m)| (Entity::new(i as u32, m.generation), m))
    }

    pub fn len(&self) -> usize {
        self.meta.len() - self.free.len()
    }
}
