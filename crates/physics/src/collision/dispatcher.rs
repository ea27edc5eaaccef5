//! Routes a shape pair to the matching narrow-phase routine.

use super::box_box::detect_box_box;
use super::manifold::ContactPoint;
use super::sphere_box::detect_sphere_box;
use super::sphere_sphere::detect_sphere_sphere;
use crate::shapes::Shape;
use crate::transform::Isometry;

/// Candidate contacts between A and B no further apart than `threshold`.
/// Normals always point from B toward A.
pub fn collide(shape_a: &Shape, iso_a: &Isometry, shape_b: &Shape, iso_b: &Isometry, threshold: f32) -> Vec<ContactPoint> {
    match (*shape_a, *shape_b) {
        (Shape::Cuboid { half_extents: ha }, Shape::Cuboid { half_extents: hb }) => {
            detect_box_box(iso_a, ha, iso_b, hb, threshold)
        }
        (Shape::Ball { radius: ra }, Shape::Ball { radius: rb }) => {
            detect_sphere_sphere(iso_a.translation, ra, iso_b.translation, rb, threshold)
                .into_iter()
                .collect()
        }
        (Shape::Ball { radius }, Shape::Cuboid { half_extents }) => {
            detect_sphere_box(iso_a.translation, radius, iso_b, half_extents, threshold)
                .into_iter()
                .collect()
        }
        (Shape::Cuboid { half_extents }, Shape::Ball { radius }) => {
            detect_sphere_box(iso_b.translation, radius, iso_a, half_extents, threshold)
                .map(ContactPoint::flipped)
                .into_iter()
                .collect()
        }
    }
}
