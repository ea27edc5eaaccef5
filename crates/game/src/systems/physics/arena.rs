//! Entity-indexed body arena.
//!
//! One slot per entity index. Removal leaves a tombstone so a later entity
//! reusing the index is never confused with the one that left.

use ecs::Entity;
use glam::Vec3;
use physics::{BodyHandle, BodyKind};

use super::factory::ColliderVariant;

/// What the physics system knows about one entity's body.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BodyEntry {
    pub entity: Entity,
    pub handle: BodyHandle,
    pub kind: BodyKind,
    pub variant: ColliderVariant,
    /// Collider origin offset, un-rotated, added to the entity translation.
    pub offset: Vec3,
    /// Entity translation the body was last placed from. Ghosts report this
    /// instead of `body - offset`, which does not round-trip in `f32`.
    pub anchor: Vec3,
}

#[derive(Clone, Debug, Default)]
enum Slot {
    #[default]
    Vacant,
    Tombstone,
    Occupied(BodyEntry),
}

#[derive(Debug, Default)]
pub struct BodyArena {
    slots: Vec<Slot>,
    len: usize,
}

impl BodyArena {
    /// Store `entry` in its entity's slot, returning whatever occupied it.
    pub fn insert(&mut self, entry: BodyEntry) -> Option<BodyEntry> {
        let index = entry.entity.index() as usize;
        if index >= self.slots.len() {
            self.slots.resize(index + 1, Slot::Vacant);
        }
        let previous = match std::mem::replace(&mut self.slots[index], Slot::Occupied(entry)) {
            Slot::Occupied(old) => Some(old),
            Slot::Vacant | Slot::Tombstone => None,
        };
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&BodyEntry> {
        match self.slots.get(entity.index() as usize)? {
            Slot::Occupied(entry) if entry.entity == entity => Some(entry),
            _ => None,
        }
    }

    pub fn remove(&mut self, entity: Entity) -> Option<BodyEntry> {
        let slot = self.slots.get_mut(entity.index() as usize)?;
        let Slot::Occupied(entry) = *slot else {
            return None;
        };
        if entry.entity != entity {
            return None;
        }
        *slot = Slot::Tombstone;
        self.len -= 1;
        Some(entry)
    }

    #[must_use]
    pub fn is_tombstone(&self, index: u32) -> bool {
        matches!(self.slots.get(index as usize), Some(Slot::Tombstone))
    }

    /// Occupied entries in ascending entity order.
    pub fn iter(&self) -> impl Iterator<Item = &BodyEntry> + '_ {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied(entry) => Some(entry),
            _ => None,
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BodyEntry> + '_ {
        self.slots.iter_mut().filter_map(|slot| match slot {
            Slot::Occupied(entry) => Some(entry),
            _ => None,
        })
    }

    /// Empty the arena, returning the entries that were live.
    pub fn drain(&mut self) -> Vec<BodyEntry> {
        let entries = self.iter().copied().collect();
        self.slots.clear();
        self.len = 0;
        entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
