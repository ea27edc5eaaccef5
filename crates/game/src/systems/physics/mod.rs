//! # Physics System
//!
//! Bridges entity data and a [`PhysicsWorld`]. Each update runs, in order:
//!
//! 1. body lifecycle from the query deltas (all exits, then all entries),
//! 2. one world step,
//! 3. collision detection and watcher dispatch,
//! 4. transform synchronization.

mod arena;
mod collisions;
mod config;
mod factory;
mod sync;

use std::any::Any;
use std::collections::BTreeSet;

use ecs::components::{BoxCollider, Position, RigidBody, SphereCollider};
use ecs::{Component, ComponentId, Entity, QueryHandle, World};
use physics::{Body, BodyKind, Isometry, PhysicsWorld};
use tracing::{debug, info, warn};

pub use arena::{BodyArena, BodyEntry};
pub use collisions::{detect_collisions, CollisionSet, WatchCallback};
pub use config::{AxisLocks, PhysicsConfig, PhysicsSnapshot};
pub use factory::{create_body, ColliderParams, ColliderVariant, FactoryError};
pub use sync::synchronize;

use collisions::{dispatch, Watch};

use crate::error::SystemError;
use crate::system::{System, SystemRecord};

pub const SYSTEM_NAME: &str = "physics";

#[derive(Copy, Clone, Debug)]
struct ColliderBinding {
    variant: ColliderVariant,
    component: ComponentId,
    query: QueryHandle,
}

pub struct PhysicsSystem {
    config: PhysicsConfig,
    world: PhysicsWorld,
    bodies: BodyArena,
    colliders: Vec<ColliderBinding>,
    rigid_body_query: QueryHandle,
    watches: Vec<Watch>,
    collisions: CollisionSet,
}

impl PhysicsSystem {
    /// Resolve the component stores and define the physics queries.
    ///
    /// # Errors
    /// [`SystemError::MissingComponent`] when `Position` or `RigidBody` is not
    /// registered, or when no collider variant is.
    pub fn new(world: &mut World, config: PhysicsConfig) -> Result<Self, SystemError> {
        let position = required::<Position>(world)?;
        let rigid_body = required::<RigidBody>(world)?;

        let mut colliders = Vec::new();
        for (variant, component) in [
            (ColliderVariant::Box, world.component_id::<BoxCollider>()),
            (ColliderVariant::Sphere, world.component_id::<SphereCollider>()),
        ] {
            if let Some(component) = component {
                colliders.push(ColliderBinding {
                    variant,
                    component,
                    query: world.query(&[position, component]),
                });
            }
        }
        if colliders.is_empty() {
            return Err(SystemError::MissingComponent(BoxCollider::NAME));
        }

        info!(
            gravity = %config.gravity,
            broadphase = %config.broadphase,
            colliders = colliders.len(),
            "physics system ready"
        );
        Ok(Self {
            world: PhysicsWorld::new(config.world_config()),
            config,
            bodies: BodyArena::default(),
            colliders,
            rigid_body_query: world.query(&[position, rigid_body]),
            watches: Vec::new(),
            collisions: CollisionSet::default(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    #[must_use]
    pub fn physics_world(&self) -> &PhysicsWorld {
        &self.world
    }

    #[must_use]
    pub fn body_entry(&self, entity: Entity) -> Option<&BodyEntry> {
        self.bodies.get(entity)
    }

    #[must_use]
    pub fn body(&self, entity: Entity) -> Option<&Body> {
        self.world.body(self.bodies.get(entity)?.handle)
    }

    /// Body transform in the entity's frame (collider offset removed).
    /// A ghost reports the translation it was last pushed from.
    #[must_use]
    pub fn body_transform(&self, entity: Entity) -> Option<Isometry> {
        let entry = self.bodies.get(entity)?;
        let iso = self.world.world_transform(entry.handle)?;
        let translation = match entry.kind {
            BodyKind::Ghost => entry.anchor,
            BodyKind::Rigid => iso.translation - entry.offset,
        };
        Some(Isometry::new(translation, iso.rotation))
    }

    #[must_use]
    pub fn num_bodies(&self) -> usize {
        self.bodies.len()
    }

    pub fn bodies(&self) -> impl Iterator<Item = &BodyEntry> + '_ {
        self.bodies.iter()
    }

    /// Pairs touching after the most recent update.
    #[must_use]
    pub fn collisions(&self) -> &CollisionSet {
        &self.collisions
    }

    /// Call `callback(entity, partners)` after every step for each member of
    /// `query` that touches something.
    pub fn watch_query<F>(&mut self, query: QueryHandle, callback: F)
    where
        F: FnMut(Entity, &BTreeSet<Entity>) + 'static,
    {
        self.watches.push(Watch {
            query,
            callback: Box::new(callback),
        });
    }

    #[must_use]
    pub fn snapshot(&self) -> PhysicsSnapshot {
        self.config.snapshot()
    }

    /// Replace the simulation world (new gravity, broadphase, locks or
    /// sub-steps) and rebuild every existing body from current component data.
    pub fn rebuild(&mut self, world: &World, config: PhysicsConfig) {
        self.config = config;
        self.world.rebuild(config.world_config());
        self.collisions = CollisionSet::default();
        let entries = self.bodies.drain();
        let mut rebuilt = 0;
        for entry in &entries {
            if self.spawn_body(world, entry.entity, entry.variant) {
                rebuilt += 1;
            }
        }
        info!(rebuilt, previous = entries.len(), "physics bodies rebuilt");
    }

    fn sync_lifecycle(&mut self, world: &mut World) {
        let colliders = self.colliders.clone();
        let mut orphaned = BTreeSet::new();
        let mut rebuild = BTreeSet::new();

        for binding in &colliders {
            for entity in world.exited(binding.query) {
                if self.bodies.get(entity).is_some_and(|e| e.variant == binding.variant) {
                    self.destroy_body(entity);
                }
                orphaned.insert(entity);
            }
        }
        for entity in world.exited(self.rigid_body_query) {
            if self.bodies.get(entity).is_some() {
                rebuild.insert(entity);
            }
        }

        let mut created = BTreeSet::new();
        for binding in &colliders {
            for entity in world.entered(binding.query) {
                if self.spawn_body(world, entity, binding.variant) {
                    created.insert(entity);
                }
            }
        }
        for entity in world.entered(self.rigid_body_query) {
            if created.contains(&entity) {
                continue;
            }
            if self.bodies.get(entity).is_some() {
                rebuild.insert(entity);
            } else if self.variants_of(world, entity).is_empty() {
                let mass = world.get::<RigidBody>(entity).map_or(0.0, |rb| rb.mass);
                if mass > 0.0 {
                    let err = FactoryError::MissingCollider { entity, mass };
                    warn!(%entity, error = %err, "skipping physics body");
                }
            }
        }

        // An entity that dropped one collider variant may still hold another.
        for entity in orphaned {
            if created.contains(&entity) || self.bodies.get(entity).is_some() || !world.is_alive(entity) {
                continue;
            }
            let variants = self.variants_of(world, entity);
            if let [variant] = variants.as_slice() {
                if self.spawn_body(world, entity, *variant) {
                    created.insert(entity);
                }
            }
        }

        for entity in rebuild {
            if created.contains(&entity) {
                continue;
            }
            if let Some(entry) = self.bodies.get(entity).copied() {
                debug!(%entity, "rigid body changed, rebuilding");
                self.destroy_body(entity);
                self.spawn_body(world, entity, entry.variant);
            }
        }
    }

    fn variants_of(&self, world: &World, entity: Entity) -> Vec<ColliderVariant> {
        self.colliders
            .iter()
            .filter(|b| world.has_component(entity, b.component))
            .map(|b| b.variant)
            .collect()
    }

    fn collider_params(world: &World, entity: Entity, variant: ColliderVariant) -> Option<ColliderParams> {
        match variant {
            ColliderVariant::Box => world.get::<BoxCollider>(entity).copied().map(ColliderParams::Box),
            ColliderVariant::Sphere => world.get::<SphereCollider>(entity).copied().map(ColliderParams::Sphere),
        }
    }

    /// Returns whether a body now exists for `entity`. Failures are logged.
    fn spawn_body(&mut self, world: &World, entity: Entity, variant: ColliderVariant) -> bool {
        let (Some(position), Some(collider)) = (
            world.get::<Position>(entity).copied(),
            Self::collider_params(world, entity, variant),
        ) else {
            return false;
        };

        let variants = self.variants_of(world, entity);
        let result = if variants.len() > 1 {
            let names: Vec<String> = variants.iter().map(ToString::to_string).collect();
            Err(FactoryError::ConflictingColliders {
                entity,
                variants: names.join(", "),
            })
        } else {
            create_body(
                &mut self.world,
                &self.config.axis_locks,
                entity,
                &position,
                Some(&collider),
                world.get::<RigidBody>(entity),
            )
        };

        match result {
            Ok(entry) => {
                debug!(%entity, handle = %entry.handle, kind = ?entry.kind, %variant, "created body");
                if let Some(stale) = self.bodies.insert(entry) {
                    if let Err(err) = self.world.remove_body(stale.handle) {
                        warn!(%entity, error = %err, "replaced body already gone");
                    }
                }
                true
            }
            Err(err) => {
                warn!(%entity, error = %err, "skipping physics body");
                false
            }
        }
    }

    fn destroy_body(&mut self, entity: Entity) {
        let Some(entry) = self.bodies.remove(entity) else {
            return;
        };
        if let Err(err) = self.world.remove_body(entry.handle) {
            warn!(%entity, error = %err, "body already gone");
        }
        debug!(%entity, handle = %entry.handle, "destroyed body");
    }
}

impl System for PhysicsSystem {
    fn name(&self) -> &str {
        SYSTEM_NAME
    }

    fn update(&mut self, world: &mut World, delta_ms: f32) -> Result<(), SystemError> {
        self.sync_lifecycle(world);
        self.world.step(delta_ms);

        let physics = &self.world;
        self.collisions = detect_collisions(physics.manifolds(), |handle| {
            physics.body(handle).map(|b| Entity::from_bits(b.user_index()))
        });
        dispatch(world, &mut self.watches, &self.collisions);

        synchronize(world, &mut self.world, &mut self.bodies)?;
        Ok(())
    }

    fn freeze(&self) -> SystemRecord {
        self.snapshot().to_record()
    }

    fn thaw(&mut self, world: &mut World, record: &SystemRecord) -> Result<(), SystemError> {
        let snapshot = PhysicsSnapshot::from_record(record).map_err(|source| SystemError::Snapshot {
            system: SYSTEM_NAME.to_owned(),
            source,
        })?;
        info!(?snapshot, "thawing physics");
        self.rebuild(world, self.config.with_snapshot(&snapshot));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn required<T: Component>(world: &World) -> Result<ComponentId, SystemError> {
    world
        .component_id::<T>()
        .ok_or(SystemError::MissingComponent(T::NAME))
}
