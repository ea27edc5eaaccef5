//! Box-box contact generation using the separating axis test.
//!
//! The least-separated of the 15 candidate axes picks the contact normal.
//! Face axes produce up to four points by testing each box's corners against
//! the other box's most aligned face. Edge axes produce a single point
//! between the two closest edges.

use glam::Vec3;

use super::manifold::{ContactPoint, MAX_CONTACT_POINTS};
use crate::transform::Isometry;

/// Edge axes must beat the best face axis by this much to win, which keeps
/// resting contacts on stable face normals.
const EDGE_BIAS: f32 = 1.0e-3;
/// A corner may lie this far outside the reference face and still count.
const FACE_SLACK: f32 = 1.0e-3;

#[derive(Copy, Clone, Debug)]
enum Feature {
    Face,
    Edge(usize, usize),
}

struct OrientedBox {
    center: Vec3,
    axes: [Vec3; 3],
    half_extents: Vec3,
}

impl OrientedBox {
    fn new(iso: &Isometry, half_extents: Vec3) -> Self {
        let basis = iso.basis();
        Self {
            center: iso.translation,
            axes: [basis.x_axis, basis.y_axis, basis.z_axis],
            half_extents,
        }
    }

    fn projected_radius(&self, axis: Vec3) -> f32 {
        (0..3)
            .map(|i| (self.axes[i].dot(axis) * self.half_extents[i]).abs())
            .sum()
    }

    fn corners(&self) -> [Vec3; 8] {
        let mut out = [Vec3::ZERO; 8];
        for (n, corner) in out.iter_mut().enumerate() {
            let mut p = self.center;
            for i in 0..3 {
                let sign = if n & (1 << i) == 0 { -1.0 } else { 1.0 };
                p += self.axes[i] * self.half_extents[i] * sign;
            }
            *corner = p;
        }
        out
    }

    fn support(&self, direction: Vec3) -> Vec3 {
        let mut p = self.center;
        for i in 0..3 {
            let sign = if self.axes[i].dot(direction) >= 0.0 { 1.0 } else { -1.0 };
            p += self.axes[i] * self.half_extents[i] * sign;
        }
        p
    }

    /// Midpoint of the edge parallel to `axis` that lies furthest along `direction`.
    fn support_edge(&self, axis: usize, direction: Vec3) -> (Vec3, Vec3) {
        let mut mid = self.center;
        for i in (0..3).filter(|&i| i != axis) {
            let sign = if self.axes[i].dot(direction) >= 0.0 { 1.0 } else { -1.0 };
            mid += self.axes[i] * self.half_extents[i] * sign;
        }
        (mid, self.axes[axis] * self.half_extents[axis])
    }

    /// The face whose outward normal best matches `direction`, as (axis, outward normal).
    fn face_towards(&self, direction: Vec3) -> (usize, Vec3) {
        let mut best = 0;
        let mut best_dot = f32::MIN;
        for i in 0..3 {
            let d = self.axes[i].dot(direction).abs();
            if d > best_dot {
                best_dot = d;
                best = i;
            }
        }
        let sign = if self.axes[best].dot(direction) >= 0.0 { 1.0 } else { -1.0 };
        (best, self.axes[best] * sign)
    }
}

struct SatSearch {
    separation: f32,
    normal: Vec3,
    feature: Feature,
}

impl SatSearch {
    /// Returns `false` once a separating axis beyond `threshold` is found.
    fn test(&mut self, a: &OrientedBox, b: &OrientedBox, axis: Vec3, feature: Feature, threshold: f32) -> bool {
        let offset = (a.center - b.center).dot(axis);
        let separation = offset.abs() - a.projected_radius(axis) - b.projected_radius(axis);
        if separation > threshold {
            return false;
        }
        let bias = match feature {
            Feature::Face => 0.0,
            Feature::Edge(..) => EDGE_BIAS,
        };
        if separation > self.separation + bias {
            self.separation = separation;
            self.normal = if offset < 0.0 { -axis } else { axis };
            self.feature = feature;
        }
        true
    }
}

/// Contacts between box A and box B, normals pointing from B toward A.
pub fn detect_box_box(
    iso_a: &Isometry,
    half_extents_a: Vec3,
    iso_b: &Isometry,
    half_extents_b: Vec3,
    threshold: f32,
) -> Vec<ContactPoint> {
    let a = OrientedBox::new(iso_a, half_extents_a);
    let b = OrientedBox::new(iso_b, half_extents_b);

    let mut sat = SatSearch {
        separation: f32::MIN,
        normal: Vec3::Y,
        feature: Feature::Face,
    };
    for axis in a.axes.iter().chain(b.axes.iter()) {
        if !sat.test(&a, &b, *axis, Feature::Face, threshold) {
            return Vec::new();
        }
    }
    for i in 0..3 {
        for j in 0..3 {
            let cross = a.axes[i].cross(b.axes[j]);
            if cross.length_squared() < 1.0e-8 {
                continue;
            }
            if !sat.test(&a, &b, cross.normalize(), Feature::Edge(i, j), threshold) {
                return Vec::new();
            }
        }
    }

    let normal = sat.normal;
    match sat.feature {
        Feature::Face => {
            let mut points = face_contacts(&a, &b, normal, threshold);
            if points.is_empty() {
                let on_a = a.support(-normal);
                points.push(ContactPoint::new(on_a, on_a - normal * sat.separation, normal, sat.separation));
            }
            points
        }
        Feature::Edge(i, j) => {
            let (mid_a, half_a) = a.support_edge(i, -normal);
            let (mid_b, half_b) = b.support_edge(j, normal);
            let on_a = closest_on_segment_pair(mid_a, half_a, mid_b, half_b);
            vec![ContactPoint::new(on_a, on_a - normal * sat.separation, normal, sat.separation)]
        }
    }
}

fn face_contacts(a: &OrientedBox, b: &OrientedBox, normal: Vec3, threshold: f32) -> Vec<ContactPoint> {
    let mut points = Vec::with_capacity(8);

    // corners of A against B's face looking at A
    let (k, face) = b.face_towards(normal);
    for corner in a.corners() {
        if let Some(distance) = corner_depth(b, k, face, corner, threshold) {
            points.push(ContactPoint::new(corner, corner - normal * distance, normal, distance));
        }
    }

    // corners of B against A's face looking at B
    let (k, face) = a.face_towards(-normal);
    for corner in b.corners() {
        if let Some(distance) = corner_depth(a, k, face, corner, threshold) {
            points.push(ContactPoint::new(corner + normal * distance, corner, normal, distance));
        }
    }

    points.sort_by(|p, q| p.distance.total_cmp(&q.distance));
    points.truncate(MAX_CONTACT_POINTS);
    points
}

/// Signed height of `corner` above face `axis` of `reference`, if the corner
/// lies over the face and no further than `threshold` from it.
fn corner_depth(reference: &OrientedBox, axis: usize, face: Vec3, corner: Vec3, threshold: f32) -> Option<f32> {
    let local = corner - reference.center;
    let height = local.dot(face) - reference.half_extents[axis];
    if height > threshold || height < -2.0 * reference.half_extents[axis] {
        return None;
    }
    let over_face = (0..3)
        .filter(|&i| i != axis)
        .all(|i| local.dot(reference.axes[i]).abs() <= reference.half_extents[i] + FACE_SLACK);
    over_face.then_some(height)
}

/// Point on segment A closest to segment B. Segments are given as midpoint and half vector.
fn closest_on_segment_pair(mid_a: Vec3, half_a: Vec3, mid_b: Vec3, half_b: Vec3) -> Vec3 {
    let da = half_a * 2.0;
    let db = half_b * 2.0;
    let pa = mid_a - half_a;
    let pb = mid_b - half_b;
    let r = pa - pb;
    let aa = da.dot(da);
    let bb = db.dot(db);
    let ab = da.dot(db);
    let ar = da.dot(r);
    let br = db.dot(r);
    let denom = aa * bb - ab * ab;
    let s = if denom.abs() > f32::EPSILON {
        ((ab * br - ar * bb) / denom).clamp(0.0, 1.0)
    } else {
        0.5
    };
    pa + da * s
}
