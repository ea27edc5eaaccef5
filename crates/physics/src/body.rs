//! Rigid and ghost bodies as stored inside the world.

use glam::{Mat3, Vec3};

use crate::builder::BodyDesc;
use crate::shapes::{Aabb, Shape};
use crate::transform::Isometry;
use crate::types::{BodyKind, CollisionFilter, CollisionFlags};

#[derive(Clone, Debug)]
pub struct Body {
    pub(crate) kind: BodyKind,
    pub(crate) shape: Shape,
    pub(crate) transform: Isometry,
    pub(crate) linear_velocity: Vec3,
    pub(crate) angular_velocity: Vec3,
    pub(crate) mass: f32,
    pub(crate) inv_mass: f32,
    pub(crate) local_inertia: Vec3,
    pub(crate) inv_local_inertia: Vec3,
    pub(crate) linear_factor: Vec3,
    pub(crate) angular_factor: Vec3,
    pub(crate) flags: CollisionFlags,
    pub(crate) filter: CollisionFilter,
    pub(crate) user_index: u64,
}

impl Body {
    pub(crate) fn from_desc(desc: BodyDesc) -> Self {
        let (mass, local_inertia) = match desc.kind {
            BodyKind::Rigid if desc.mass > 0.0 => (desc.mass, desc.local_inertia),
            _ => (0.0, Vec3::ZERO),
        };
        let inv_mass = if mass > 0.0 { 1.0 / mass } else { 0.0 };
        let inv_local_inertia = Vec3::new(
            recip_or_zero(local_inertia.x),
            recip_or_zero(local_inertia.y),
            recip_or_zero(local_inertia.z),
        );
        let flags = match desc.kind {
            BodyKind::Ghost => desc.flags.union(CollisionFlags::NO_CONTACT_RESPONSE),
            BodyKind::Rigid => desc.flags,
        };
        Self {
            kind: desc.kind,
            shape: desc.shape,
            transform: desc.transform,
            linear_velocity: desc.linear_velocity,
            angular_velocity: Vec3::ZERO,
            mass,
            inv_mass,
            local_inertia,
            inv_local_inertia,
            linear_factor: desc.linear_factor,
            angular_factor: desc.angular_factor,
            flags,
            filter: desc.filter,
            user_index: desc.user_index,
        }
    }

    #[must_use]
    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[must_use]
    pub fn transform(&self) -> &Isometry {
        &self.transform
    }

    #[must_use]
    pub fn linear_velocity(&self) -> Vec3 {
        self.linear_velocity
    }

    #[must_use]
    pub fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    #[must_use]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[must_use]
    pub fn inverse_mass(&self) -> f32 {
        self.inv_mass
    }

    #[must_use]
    pub fn local_inertia(&self) -> Vec3 {
        self.local_inertia
    }

    #[must_use]
    pub fn linear_factor(&self) -> Vec3 {
        self.linear_factor
    }

    #[must_use]
    pub fn angular_factor(&self) -> Vec3 {
        self.angular_factor
    }

    #[must_use]
    pub fn flags(&self) -> CollisionFlags {
        self.flags
    }

    #[must_use]
    pub fn filter(&self) -> CollisionFilter {
        self.filter
    }

    /// Opaque value attached by the owner, typically an entity id.
    #[must_use]
    pub fn user_index(&self) -> u64 {
        self.user_index
    }

    /// Rigid with zero mass.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.kind == BodyKind::Rigid && self.inv_mass == 0.0
    }

    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Rigid && self.inv_mass > 0.0
    }

    #[must_use]
    pub fn has_contact_response(&self) -> bool {
        !self.flags.contains(CollisionFlags::NO_CONTACT_RESPONSE)
    }

    pub fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.linear_velocity = velocity;
    }

    pub fn set_angular_velocity(&mut self, velocity: Vec3) {
        self.angular_velocity = velocity;
    }

    #[must_use]
    pub fn aabb(&self) -> Aabb {
        self.shape.aabb(&self.transform)
    }

    /// World-space inverse inertia tensor `R * I⁻¹ * Rᵀ`.
    #[must_use]
    pub fn inv_inertia_world(&self) -> Mat3 {
        let r = self.transform.basis();
        r * Mat3::from_diagonal(self.inv_local_inertia) * r.transpose()
    }

    pub(crate) fn velocity_at(&self, r: Vec3) -> Vec3 {
        self.linear_velocity + self.angular_velocity.cross(r)
    }

    pub(crate) fn apply_impulse(&mut self, impulse: Vec3, r: Vec3) {
        if self.inv_mass == 0.0 {
            return;
        }
        self.linear_velocity += impulse * self.linear_factor * self.inv_mass;
        self.angular_velocity += self.inv_inertia_world() * r.cross(impulse) * self.angular_factor;
    }
}

fn recip_or_zero(v: f32) -> f32 {
    if v > 0.0 {
        1.0 / v
    } else {
        0.0
    }
}
