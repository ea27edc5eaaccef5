//! # Body Builder
//!
//! Describes a body before it is handed to
//! [`PhysicsWorld::add_body`](crate::PhysicsWorld::add_body).

use glam::Vec3;

use crate::shapes::Shape;
use crate::transform::Isometry;
use crate::types::{BodyKind, CollisionFilter, CollisionFlags};

#[derive(Clone, Debug)]
pub struct BodyDesc {
    pub(crate) kind: BodyKind,
    pub(crate) shape: Shape,
    pub(crate) transform: Isometry,
    pub(crate) mass: f32,
    pub(crate) local_inertia: Vec3,
    pub(crate) linear_velocity: Vec3,
    pub(crate) linear_factor: Vec3,
    pub(crate) angular_factor: Vec3,
    pub(crate) flags: CollisionFlags,
    pub(crate) filter: CollisionFilter,
    pub(crate) user_index: u64,
}

impl BodyDesc {
    /// A static rigid body until [`with_mass`](Self::with_mass) says otherwise.
    #[must_use]
    pub fn rigid(shape: Shape) -> Self {
        Self::new(BodyKind::Rigid, shape)
    }

    /// Ghosts never respond to contacts and ignore any mass they are given.
    #[must_use]
    pub fn ghost(shape: Shape) -> Self {
        Self::new(BodyKind::Ghost, shape)
    }

    fn new(kind: BodyKind, shape: Shape) -> Self {
        Self {
            kind,
            shape,
            transform: Isometry::IDENTITY,
            mass: 0.0,
            local_inertia: Vec3::ZERO,
            linear_velocity: Vec3::ZERO,
            linear_factor: Vec3::ONE,
            angular_factor: Vec3::ONE,
            flags: CollisionFlags::NONE,
            filter: CollisionFilter::ALL,
            user_index: 0,
        }
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Isometry) -> Self {
        self.transform = transform;
        self
    }

    #[must_use]
    pub fn with_mass(mut self, mass: f32, local_inertia: Vec3) -> Self {
        self.mass = mass;
        self.local_inertia = local_inertia;
        self
    }

    #[must_use]
    pub fn with_linear_velocity(mut self, velocity: Vec3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    /// Per-axis multiplier on linear motion; zero locks that axis.
    #[must_use]
    pub fn with_linear_factor(mut self, factor: Vec3) -> Self {
        self.linear_factor = factor;
        self
    }

    /// Per-axis multiplier on rotation; zero locks rotation about that axis.
    #[must_use]
    pub fn with_angular_factor(mut self, factor: Vec3) -> Self {
        self.angular_factor = factor;
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: CollisionFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: CollisionFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_user_index(mut self, user_index: u64) -> Self {
        self.user_index = user_index;
        self
    }
}
