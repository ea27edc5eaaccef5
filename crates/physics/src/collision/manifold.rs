//! Persistent contact manifolds.
//!
//! A manifold holds up to [`MAX_CONTACT_POINTS`] points for one body pair.
//! Points are stored in both bodies' local frames so they can be re-projected
//! after the bodies move, which keeps accumulated impulses warm across steps.

use glam::Vec3;

use crate::transform::Isometry;
use crate::types::BodyHandle;

pub const MAX_CONTACT_POINTS: usize = 4;

/// One contact between bodies A and B.
///
/// `normal_on_b` points from B toward A and `distance` is measured along it:
/// negative values mean the shapes interpenetrate.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ContactPoint {
    pub point_on_a: Vec3,
    pub point_on_b: Vec3,
    pub normal_on_b: Vec3,
    pub distance: f32,
    pub local_point_a: Vec3,
    pub local_point_b: Vec3,
    pub applied_impulse: f32,
    pub lifetime: u32,
}

impl ContactPoint {
    #[must_use]
    pub fn new(point_on_a: Vec3, point_on_b: Vec3, normal_on_b: Vec3, distance: f32) -> Self {
        Self {
            point_on_a,
            point_on_b,
            normal_on_b,
            distance,
            local_point_a: Vec3::ZERO,
            local_point_b: Vec3::ZERO,
            applied_impulse: 0.0,
            lifetime: 0,
        }
    }

    /// Swap the roles of A and B.
    #[must_use]
    pub fn flipped(self) -> Self {
        Self {
            point_on_a: self.point_on_b,
            point_on_b: self.point_on_a,
            normal_on_b: -self.normal_on_b,
            local_point_a: self.local_point_b,
            local_point_b: self.local_point_a,
            ..self
        }
    }
}

#[derive(Clone, Debug)]
pub struct ContactManifold {
    body0: BodyHandle,
    body1: BodyHandle,
    points: Vec<ContactPoint>,
}

impl ContactManifold {
    #[must_use]
    pub fn new(body0: BodyHandle, body1: BodyHandle) -> Self {
        Self {
            body0,
            body1,
            points: Vec::with_capacity(MAX_CONTACT_POINTS),
        }
    }

    #[must_use]
    pub fn body0(&self) -> BodyHandle {
        self.body0
    }

    #[must_use]
    pub fn body1(&self) -> BodyHandle {
        self.body1
    }

    #[must_use]
    pub fn num_contacts(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn contact(&self, index: usize) -> Option<&ContactPoint> {
        self.points.get(index)
    }

    #[must_use]
    pub fn points(&self) -> &[ContactPoint] {
        &self.points
    }

    pub(crate) fn points_mut(&mut self) -> &mut [ContactPoint] {
        &mut self.points
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Add a fresh point, merging with a nearby existing one.
    ///
    /// A merged point keeps the old accumulated impulse. When the manifold is
    /// full the shallowest point gives way to a deeper newcomer.
    pub fn add_point(&mut self, iso_a: &Isometry, iso_b: &Isometry, mut point: ContactPoint, merge_threshold: f32) {
        point.local_point_a = iso_a.inverse_transform_point(point.point_on_a);
        point.local_point_b = iso_b.inverse_transform_point(point.point_on_b);

        let merge_sq = merge_threshold * merge_threshold;
        if let Some(existing) = self
            .points
            .iter_mut()
            .find(|p| (p.local_point_a - point.local_point_a).length_squared() < merge_sq)
        {
            point.applied_impulse = existing.applied_impulse;
            point.lifetime = existing.lifetime;
            *existing = point;
            return;
        }

        if self.points.len() < MAX_CONTACT_POINTS {
            self.points.push(point);
            return;
        }

        let shallowest = self
            .points
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.distance.total_cmp(&b.distance))
            .map(|(i, p)| (i, p.distance));
        if let Some((index, distance)) = shallowest {
            if point.distance < distance {
                self.points[index] = point;
            }
        }
    }

    /// Re-project points with the bodies' current transforms and drop those
    /// that separated past `breaking_threshold` or slid apart tangentially.
    pub fn refresh(&mut self, iso_a: &Isometry, iso_b: &Isometry, breaking_threshold: f32) {
        let breaking_sq = breaking_threshold * breaking_threshold;
        self.points.retain_mut(|p| {
            p.point_on_a = iso_a.transform_point(p.local_point_a);
            p.point_on_b = iso_b.transform_point(p.local_point_b);
            p.distance = (p.point_on_a - p.point_on_b).dot(p.normal_on_b);
            p.lifetime += 1;
            if p.distance > breaking_threshold {
                return false;
            }
            let projected = p.point_on_a - p.normal_on_b * p.distance;
            (projected - p.point_on_b).length_squared() <= breaking_sq
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_at(x: f32, distance: f32) -> ContactPoint {
        let on_b = Vec3::new(x, 0.0, 0.0);
        ContactPoint::new(on_b + Vec3::Y * distance, on_b, Vec3::Y, distance)
    }

    #[test]
    fn caps_at_four_points() {
        let mut m = ContactManifold::new(BodyHandle(0), BodyHandle(1));
        let id = Isometry::IDENTITY;
        for i in 0..6 {
            m.add_point(&id, &id, point_at(i as f32, -0.01 * i as f32), 0.02);
        }
        assert_eq!(m.num_contacts(), MAX_CONTACT_POINTS);
        // the two deepest newcomers replaced the shallowest originals
        assert!(m.points().iter().any(|p| (p.distance + 0.05).abs() < 1e-6));
    }

    #[test]
    fn nearby_points_merge() {
        let mut m = ContactManifold::new(BodyHandle(0), BodyHandle(1));
        let id = Isometry::IDENTITY;
        m.add_point(&id, &id, point_at(0.0, -0.01), 0.02);
        m.points_mut()[0].applied_impulse = 3.0;
        m.add_point(&id, &id, point_at(0.001, -0.02), 0.02);
        assert_eq!(m.num_contacts(), 1);
        assert_eq!(m.points()[0].applied_impulse, 3.0);
        assert_eq!(m.points()[0].distance, -0.02);
    }

    #[test]
    fn refresh_drops_separated_points() {
        let mut m = ContactManifold::new(BodyHandle(0), BodyHandle(1));
        let id = Isometry::IDENTITY;
        m.add_point(&id, &id, point_at(0.0, -0.01), 0.02);
        let lifted = Isometry::from_translation(Vec3::new(0.0, 1.0, 0.0));
        m.refresh(&lifted, &id, 0.02);
        assert_eq!(m.num_contacts(), 0);
    }
}
