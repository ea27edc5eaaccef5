//! Sphere-box contact generation against an oriented box.

use glam::Vec3;

use super::manifold::ContactPoint;
use crate::transform::Isometry;

/// Contact with the sphere as body A and the box as body B.
pub fn detect_sphere_box(
    center: Vec3,
    radius: f32,
    box_iso: &Isometry,
    half_extents: Vec3,
    threshold: f32,
) -> Option<ContactPoint> {
    let local = box_iso.inverse_transform_point(center);
    let clamped = local.clamp(-half_extents, half_extents);

    let (local_surface, local_normal, center_distance) = if clamped == local {
        // Center inside the box: push out through the nearest face.
        let gap = half_extents - local.abs();
        let axis = if gap.x <= gap.y && gap.x <= gap.z {
            0
        } else if gap.y <= gap.z {
            1
        } else {
            2
        };
        let sign = if local[axis] >= 0.0 { 1.0 } else { -1.0 };
        let mut normal = Vec3::ZERO;
        normal[axis] = sign;
        let mut surface = local;
        surface[axis] = sign * half_extents[axis];
        (surface, normal, -gap[axis])
    } else {
        let delta = local - clamped;
        let length = delta.length();
        (clamped, delta / length, length)
    };

    let distance = center_distance - radius;
    if distance > threshold {
        return None;
    }

    let normal = box_iso.transform_vector(local_normal);
    let point_on_b = box_iso.transform_point(local_surface);
    let point_on_a = center - normal * radius;
    Some(ContactPoint::new(point_on_a, point_on_b, normal, distance))
}
