//! # Integration
//!
//! Semi-implicit Euler: velocities first (gravity), then the solver, then
//! positions from the corrected velocities.

use glam::{Quat, Vec3};

use crate::body::Body;

/// Apply gravity to every dynamic body.
pub fn integrate_velocities<'a>(bodies: impl Iterator<Item = &'a mut Body>, gravity: Vec3, dt: f32) {
    for body in bodies.filter(|b| b.is_dynamic()) {
        body.linear_velocity += gravity * body.linear_factor * dt;
    }
}

/// Advance transforms of dynamic bodies. Ghosts and static bodies never move here.
pub fn integrate_positions<'a>(bodies: impl Iterator<Item = &'a mut Body>, dt: f32) {
    for body in bodies.filter(|b| b.is_dynamic()) {
        body.linear_velocity *= body.linear_factor;
        body.angular_velocity *= body.angular_factor;
        body.transform.translation += body.linear_velocity * dt;

        let w = body.angular_velocity;
        if w.length_squared() > 0.0 {
            let spin = Quat::from_xyzw(w.x, w.y, w.z, 0.0) * body.transform.rotation;
            let rotation = body.transform.rotation + spin * (0.5 * dt);
            body.transform.rotation = rotation.normalize();
        }
    }
}
