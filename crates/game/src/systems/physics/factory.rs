//! Turns entity component data into simulation bodies.

use std::fmt;

use ecs::components::{BoxCollider, Position, RigidBody, SphereCollider};
use ecs::Entity;
use glam::{Quat, Vec3};
use physics::{
    BodyDesc, BodyKind, CollisionFilter, CollisionFlags, Isometry, PhysicsError, PhysicsWorld, Shape,
};
use thiserror::Error;

use super::arena::BodyEntry;
use super::config::AxisLocks;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColliderVariant {
    Box,
    Sphere,
}

impl fmt::Display for ColliderVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Box => f.write_str("box"),
            Self::Sphere => f.write_str("sphere"),
        }
    }
}

/// Collider data of whichever variant the entity carries.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ColliderParams {
    Box(BoxCollider),
    Sphere(SphereCollider),
}

impl ColliderParams {
    #[must_use]
    pub fn variant(&self) -> ColliderVariant {
        match self {
            Self::Box(_) => ColliderVariant::Box,
            Self::Sphere(_) => ColliderVariant::Sphere,
        }
    }

    #[must_use]
    pub fn offset(&self) -> Vec3 {
        match self {
            Self::Box(c) => c.offset(),
            Self::Sphere(c) => c.offset(),
        }
    }

    #[must_use]
    pub fn is_trigger(&self) -> bool {
        match self {
            Self::Box(c) => c.trigger != 0,
            Self::Sphere(c) => c.trigger != 0,
        }
    }

    #[must_use]
    pub fn filter(&self) -> CollisionFilter {
        let (group, mask) = match self {
            Self::Box(c) => (c.group, c.mask),
            Self::Sphere(c) => (c.group, c.mask),
        };
        CollisionFilter { group, mask }
    }

    /// Collider size scaled by the entity scale.
    ///
    /// # Errors
    /// [`PhysicsError::InvalidShape`] for zero, negative or non-finite sizes.
    pub fn shape(&self, position: &Position) -> Result<Shape, PhysicsError> {
        let scale = position.scale();
        match self {
            Self::Box(c) => Shape::cuboid(c.size() * scale / 2.0),
            Self::Sphere(c) => Shape::ball(c.diameter * scale.max_element() / 2.0),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FactoryError {
    #[error("entity {entity} has mass {mass} but no collider")]
    MissingCollider { entity: Entity, mass: f32 },
    #[error("entity {entity} carries more than one collider variant ({variants})")]
    ConflictingColliders { entity: Entity, variants: String },
    #[error("entity {entity} has an unusable {variant} collider: {source}")]
    InvalidCollider {
        entity: Entity,
        variant: ColliderVariant,
        #[source]
        source: PhysicsError,
    },
}

/// Build and register the body for `entity`.
///
/// The translation is the entity translation plus the collider offset (not
/// rotated). Mass comes from the rigid body when positive, else the body is
/// static. A kinematic rigid body yields a ghost. Trigger colliders report
/// contacts without responding to them.
///
/// # Errors
/// Fails without touching `world` when the entity has mass but no collider,
/// or when the collider extents are unusable.
pub fn create_body(
    world: &mut PhysicsWorld,
    locks: &AxisLocks,
    entity: Entity,
    position: &Position,
    collider: Option<&ColliderParams>,
    rigid_body: Option<&RigidBody>,
) -> Result<BodyEntry, FactoryError> {
    let Some(collider) = collider else {
        return Err(FactoryError::MissingCollider {
            entity,
            mass: rigid_body.map_or(0.0, |rb| rb.mass),
        });
    };
    let shape = collider.shape(position).map_err(|source| FactoryError::InvalidCollider {
        entity,
        variant: collider.variant(),
        source,
    })?;

    let offset = collider.offset();
    let transform = Isometry::new(position.translation() + offset, initial_rotation(position));
    let kind = if rigid_body.is_some_and(RigidBody::is_kinematic) {
        BodyKind::Ghost
    } else {
        BodyKind::Rigid
    };

    let mut desc = match kind {
        BodyKind::Ghost => BodyDesc::ghost(shape),
        BodyKind::Rigid => {
            let mass = rigid_body.map_or(0.0, |rb| rb.mass).max(0.0);
            let mut inertia = rigid_body.map_or(Vec3::ZERO, RigidBody::inertia_seed);
            if mass > 0.0 {
                shape.calculate_local_inertia(mass, &mut inertia);
            } else {
                inertia = Vec3::ZERO;
            }
            BodyDesc::rigid(shape).with_mass(mass, inertia)
        }
    };
    if collider.is_trigger() {
        desc = desc.with_flags(CollisionFlags::NO_CONTACT_RESPONSE);
    }
    let desc = desc
        .with_transform(transform)
        .with_linear_factor(locks.linear)
        .with_angular_factor(locks.angular)
        .with_filter(collider.filter())
        .with_user_index(entity.to_bits());

    let handle = world.add_body(desc);
    Ok(BodyEntry {
        entity,
        handle,
        kind,
        variant: collider.variant(),
        offset,
        anchor: position.translation(),
    })
}

/// Unit rotation from the entity's quaternion; a degenerate one means identity.
fn initial_rotation(position: &Position) -> Quat {
    let q = position.rotation();
    if q.length_squared() > f32::EPSILON {
        q.normalize()
    } else {
        Quat::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use physics::WorldConfig;

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(WorldConfig::default())
    }

    #[test]
    fn scaled_static_box() {
        let mut w = world();
        let position = Position::at(1.0, 2.0, 3.0).with_scale(2.0, 2.0, 2.0);
        let collider = ColliderParams::Box(BoxCollider::default());
        let entry = create_body(
            &mut w,
            &AxisLocks::PLANAR,
            Entity::new(0, 0),
            &position,
            Some(&collider),
            Some(&RigidBody::default()),
        )
        .unwrap();

        let body = w.body(entry.handle).unwrap();
        assert!(body.is_static());
        assert_eq!(body.local_inertia(), Vec3::ZERO);
        assert_eq!(*body.shape(), Shape::Cuboid { half_extents: Vec3::ONE });
        assert_eq!(body.transform().translation, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn offset_is_added_unrotated() {
        let mut w = world();
        let position = Position::at(0.0, 1.0, 0.0).with_rotation(Quat::from_rotation_z(1.0));
        let mut collider = BoxCollider::default();
        collider.oy = 0.5;
        let entry = create_body(
            &mut w,
            &AxisLocks::FREE,
            Entity::new(0, 0),
            &position,
            Some(&ColliderParams::Box(collider)),
            None,
        )
        .unwrap();
        assert_eq!(entry.offset, Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(w.world_transform(entry.handle).unwrap().translation, Vec3::new(0.0, 1.5, 0.0));
    }

    #[test]
    fn mass_without_collider_fails_cleanly() {
        let mut w = world();
        let err = create_body(
            &mut w,
            &AxisLocks::PLANAR,
            Entity::new(4, 0),
            &Position::default(),
            None,
            Some(&RigidBody::dynamic(2.0)),
        )
        .unwrap_err();
        assert!(matches!(err, FactoryError::MissingCollider { mass, .. } if mass == 2.0));
        assert_eq!(w.num_bodies(), 0);
    }

    #[test]
    fn zero_extent_is_a_configuration_error() {
        let mut w = world();
        let collider = ColliderParams::Box(BoxCollider::sized(1.0, 0.0, 1.0));
        let err = create_body(
            &mut w,
            &AxisLocks::PLANAR,
            Entity::new(0, 0),
            &Position::default(),
            Some(&collider),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, FactoryError::InvalidCollider { variant: ColliderVariant::Box, .. }));
    }

    #[test]
    fn sphere_uses_largest_scale_axis() {
        let mut w = world();
        let position = Position::default().with_scale(1.0, 3.0, 2.0);
        let collider = ColliderParams::Sphere(SphereCollider::with_diameter(1.0));
        let entry = create_body(
            &mut w,
            &AxisLocks::PLANAR,
            Entity::new(0, 0),
            &position,
            Some(&collider),
            Some(&RigidBody::dynamic(1.0)),
        )
        .unwrap();
        assert_eq!(*w.body(entry.handle).unwrap().shape(), Shape::Ball { radius: 1.5 });
    }

    #[test]
    fn kinematic_and_trigger_flags() {
        let mut w = world();
        let mut collider = BoxCollider::default();
        collider.trigger = 1;
        let trigger = create_body(
            &mut w,
            &AxisLocks::PLANAR,
            Entity::new(0, 0),
            &Position::default(),
            Some(&ColliderParams::Box(collider)),
            Some(&RigidBody::dynamic(1.0)),
        )
        .unwrap();
        assert_eq!(trigger.kind, BodyKind::Rigid);
        assert!(!w.body(trigger.handle).unwrap().has_contact_response());
        assert!(w.body(trigger.handle).unwrap().is_dynamic());

        let ghost = create_body(
            &mut w,
            &AxisLocks::PLANAR,
            Entity::new(1, 0),
            &Position::default(),
            Some(&ColliderParams::Box(BoxCollider::default())),
            Some(&RigidBody::kinematic()),
        )
        .unwrap();
        assert_eq!(ghost.kind, BodyKind::Ghost);
        assert_eq!(w.body(ghost.handle).unwrap().mass(), 0.0);
    }
}
