//! Rigid transforms (rotation + translation, no scale).

use glam::{Mat3, Quat, Vec3};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Isometry {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Isometry {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    #[must_use]
    pub const fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    #[must_use]
    pub const fn from_translation(translation: Vec3) -> Self {
        Self::new(translation, Quat::IDENTITY)
    }

    /// Column `i` of the returned matrix is the body's local axis `i` in world space.
    #[must_use]
    pub fn basis(&self) -> Mat3 {
        Mat3::from_quat(self.rotation)
    }

    #[must_use]
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.translation + self.rotation * local
    }

    #[must_use]
    pub fn inverse_transform_point(&self, world: Vec3) -> Vec3 {
        self.rotation.conjugate() * (world - self.translation)
    }

    #[must_use]
    pub fn transform_vector(&self, local: Vec3) -> Vec3 {
        self.rotation * local
    }

    #[must_use]
    pub fn inverse_transform_vector(&self, world: Vec3) -> Vec3 {
        self.rotation.conjugate() * world
    }
}

impl Default for Isometry {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_round_trip() {
        let iso = Isometry::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        );
        let p = Vec3::new(0.5, -1.0, 2.0);
        let back = iso.inverse_transform_point(iso.transform_point(p));
        assert!((back - p).length() < 1e-5, "back={back:?}");
    }

    #[test]
    fn quarter_turn_maps_x_to_y() {
        let iso = Isometry::new(Vec3::ZERO, Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        let x = iso.basis().x_axis;
        assert!((x - Vec3::Y).length() < 1e-5, "x={x:?}");
    }
}
