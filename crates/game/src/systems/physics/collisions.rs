//! Touching pairs extracted from contact manifolds, and watcher dispatch.

use std::collections::{BTreeMap, BTreeSet};

use ecs::{Entity, QueryHandle, World};
use physics::{BodyHandle, ContactManifold};

/// Entity -> entities it touches this tick. Always symmetric.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollisionSet {
    partners: BTreeMap<Entity, BTreeSet<Entity>>,
}

impl CollisionSet {
    pub fn insert_pair(&mut self, a: Entity, b: Entity) {
        self.partners.entry(a).or_default().insert(b);
        self.partners.entry(b).or_default().insert(a);
    }

    #[must_use]
    pub fn partners(&self, entity: Entity) -> Option<&BTreeSet<Entity>> {
        self.partners.get(&entity)
    }

    #[must_use]
    pub fn touching(&self, a: Entity, b: Entity) -> bool {
        self.partners.get(&a).is_some_and(|p| p.contains(&b))
    }

    /// Number of entities with at least one partner.
    #[must_use]
    pub fn len(&self) -> usize {
        self.partners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }

    #[must_use]
    pub fn num_pairs(&self) -> usize {
        self.partners.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &BTreeSet<Entity>)> + '_ {
        self.partners.iter().map(|(e, p)| (*e, p))
    }

    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        self.partners
            .iter()
            .all(|(a, ps)| ps.iter().all(|b| self.touching(*b, *a)))
    }
}

/// Collect touching pairs. A manifold counts once its first point at
/// distance <= 0 is found; the rest of its points are not inspected.
/// Bodies the resolver does not know are ignored.
pub fn detect_collisions<'a, I, R>(manifolds: I, mut resolve: R) -> CollisionSet
where
    I: IntoIterator<Item = &'a ContactManifold>,
    R: FnMut(BodyHandle) -> Option<Entity>,
{
    let mut set = CollisionSet::default();
    for manifold in manifolds {
        if !manifold.points().iter().any(|p| p.distance <= 0.0) {
            continue;
        }
        if let (Some(a), Some(b)) = (resolve(manifold.body0()), resolve(manifold.body1())) {
            set.insert_pair(a, b);
        }
    }
    set
}

pub type WatchCallback = Box<dyn FnMut(Entity, &BTreeSet<Entity>)>;

pub(crate) struct Watch {
    pub query: QueryHandle,
    pub callback: WatchCallback,
}

/// Call each watcher, in registration order, once per member of its query
/// that has partners, in ascending entity order.
pub(crate) fn dispatch(world: &World, watches: &mut [Watch], collisions: &CollisionSet) {
    if collisions.is_empty() {
        return;
    }
    for watch in watches {
        for entity in world.matches(watch.query) {
            if let Some(partners) = collisions.partners(entity) {
                (watch.callback)(entity, partners);
            }
        }
    }
}
