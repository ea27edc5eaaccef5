//! Collision shapes and their derived quantities.

use glam::Vec3;

use crate::error::PhysicsError;
use crate::transform::Isometry;

/// Axis-aligned bounding box in world space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[must_use]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.min.cmple(other.min).all() && self.max.cmpge(other.max).all()
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    #[must_use]
    pub fn expanded(&self, margin: f32) -> Self {
        Self::new(self.min - Vec3::splat(margin), self.max + Vec3::splat(margin))
    }

    #[must_use]
    pub fn surface_area(&self) -> f32 {
        let d = self.max - self.min;
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Shape {
    Cuboid { half_extents: Vec3 },
    Ball { radius: f32 },
}

impl Shape {
    /// # Errors
    /// Returns [`PhysicsError::InvalidShape`] unless every half extent is finite and positive.
    pub fn cuboid(half_extents: Vec3) -> Result<Self, PhysicsError> {
        if !half_extents.is_finite() || half_extents.min_element() <= 0.0 {
            return Err(PhysicsError::InvalidShape(format!(
                "cuboid half extents must be positive, got {half_extents}"
            )));
        }
        Ok(Self::Cuboid { half_extents })
    }

    /// # Errors
    /// Returns [`PhysicsError::InvalidShape`] unless the radius is finite and positive.
    pub fn ball(radius: f32) -> Result<Self, PhysicsError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(PhysicsError::InvalidShape(format!(
                "ball radius must be positive, got {radius}"
            )));
        }
        Ok(Self::Ball { radius })
    }

    #[must_use]
    pub fn aabb(&self, iso: &Isometry) -> Aabb {
        let extent = match *self {
            Self::Cuboid { half_extents } => {
                let basis = iso.basis();
                basis.x_axis.abs() * half_extents.x
                    + basis.y_axis.abs() * half_extents.y
                    + basis.z_axis.abs() * half_extents.z
            }
            Self::Ball { radius } => Vec3::splat(radius),
        };
        Aabb::new(iso.translation - extent, iso.translation + extent)
    }

    /// Principal moments of inertia for `mass`.
    ///
    /// `inertia` is an in/out buffer: callers may seed it, and the shape
    /// overwrites it with the moments derived from its geometry. A zero mass
    /// yields zero inertia.
    pub fn calculate_local_inertia(&self, mass: f32, inertia: &mut Vec3) {
        if mass <= 0.0 {
            *inertia = Vec3::ZERO;
            return;
        }
        *inertia = match *self {
            Self::Cuboid { half_extents } => {
                let full = half_extents * 2.0;
                let sq = full * full;
                Vec3::new(sq.y + sq.z, sq.x + sq.z, sq.x + sq.y) * (mass / 12.0)
            }
            Self::Ball { radius } => Vec3::splat(0.4 * mass * radius * radius),
        };
    }
}
