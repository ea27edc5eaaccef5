//! Sphere-sphere contact generation.

use glam::Vec3;

use super::manifold::ContactPoint;

pub fn detect_sphere_sphere(
    center_a: Vec3,
    radius_a: f32,
    center_b: Vec3,
    radius_b: f32,
    threshold: f32,
) -> Option<ContactPoint> {
    let delta = center_a - center_b;
    let center_distance = delta.length();
    let distance = center_distance - radius_a - radius_b;
    if distance > threshold {
        return None;
    }

    // Coincident centers: pick an arbitrary but stable normal.
    let normal = if center_distance > f32::EPSILON {
        delta / center_distance
    } else {
        Vec3::Y
    };
    let point_on_a = center_a - normal * radius_a;
    let point_on_b = center_b + normal * radius_b;
    Some(ContactPoint::new(point_on_a, point_on_b, normal, distance))
}
