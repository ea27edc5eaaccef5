//! # Contact Solver
//!
//! Sequential impulses over every manifold point that belongs to a pair of
//! responsive bodies. Penetration is corrected with a Baumgarte velocity bias;
//! points that are still apart let the bodies close the gap within one step.

use std::collections::BTreeMap;

use glam::Vec3;

use crate::body::Body;
use crate::collision::ContactManifold;
use crate::types::BodyHandle;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SolverSettings {
    pub iterations: u32,
    pub baumgarte: f32,
    pub slop: f32,
    pub max_bias: f32,
    pub friction: f32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            iterations: 10,
            baumgarte: 0.2,
            slop: 0.005,
            max_bias: 5.0,
            friction: 0.5,
        }
    }
}

#[derive(Debug)]
struct ContactRow {
    a: usize,
    b: usize,
    pair: (BodyHandle, BodyHandle),
    point: usize,
    normal: Vec3,
    tangents: [Vec3; 2],
    r_a: Vec3,
    r_b: Vec3,
    normal_mass: f32,
    tangent_mass: [f32; 2],
    bias: f32,
    normal_impulse: f32,
    tangent_impulse: [f32; 2],
}

/// Run `settings.iterations` passes over all contacts, then store the
/// accumulated normal impulses back into the manifolds.
pub fn solve_contacts(
    bodies: &mut [Option<Body>],
    manifolds: &mut BTreeMap<(BodyHandle, BodyHandle), ContactManifold>,
    settings: &SolverSettings,
    dt: f32,
) {
    let mut rows = prepare(bodies, manifolds, settings, dt);
    if rows.is_empty() {
        return;
    }

    for _ in 0..settings.iterations {
        for row in &mut rows {
            let Some((a, b)) = pair_mut(bodies, row.a, row.b) else {
                continue;
            };
            solve_normal(row, a, b);
            solve_friction(row, a, b, settings.friction);
        }
    }

    for row in &rows {
        if let Some(point) = manifolds
            .get_mut(&row.pair)
            .and_then(|m| m.points_mut().get_mut(row.point))
        {
            point.applied_impulse = row.normal_impulse;
        }
    }
}

fn prepare(
    bodies: &[Option<Body>],
    manifolds: &BTreeMap<(BodyHandle, BodyHandle), ContactManifold>,
    settings: &SolverSettings,
    dt: f32,
) -> Vec<ContactRow> {
    let mut rows = Vec::new();
    for (&pair, manifold) in manifolds {
        let (Some(Some(a)), Some(Some(b))) = (bodies.get(pair.0.index()), bodies.get(pair.1.index())) else {
            continue;
        };
        if !a.has_contact_response() || !b.has_contact_response() {
            continue;
        }
        if a.inverse_mass() == 0.0 && b.inverse_mass() == 0.0 {
            continue;
        }
        for (index, p) in manifold.points().iter().enumerate() {
            let normal = p.normal_on_b;
            let r_a = p.point_on_a - a.transform.translation;
            let r_b = p.point_on_b - b.transform.translation;
            let tangents = tangent_basis(normal);
            let bias = if p.distance < 0.0 {
                (settings.baumgarte * (-p.distance - settings.slop).max(0.0) / dt).min(settings.max_bias)
            } else {
                -p.distance / dt
            };
            rows.push(ContactRow {
                a: pair.0.index(),
                b: pair.1.index(),
                pair,
                point: index,
                normal,
                tangents,
                r_a,
                r_b,
                normal_mass: effective_mass(a, b, r_a, r_b, normal),
                tangent_mass: [
                    effective_mass(a, b, r_a, r_b, tangents[0]),
                    effective_mass(a, b, r_a, r_b, tangents[1]),
                ],
                bias,
                normal_impulse: 0.0,
                tangent_impulse: [0.0; 2],
            });
        }
    }
    rows
}

fn solve_normal(row: &mut ContactRow, a: &mut Body, b: &mut Body) {
    let vn = (a.velocity_at(row.r_a) - b.velocity_at(row.r_b)).dot(row.normal);
    let lambda = row.normal_mass * (row.bias - vn);
    let old = row.normal_impulse;
    row.normal_impulse = (old + lambda).max(0.0);
    let impulse = row.normal * (row.normal_impulse - old);
    a.apply_impulse(impulse, row.r_a);
    b.apply_impulse(-impulse, row.r_b);
}

fn solve_friction(row: &mut ContactRow, a: &mut Body, b: &mut Body, friction: f32) {
    let limit = friction * row.normal_impulse;
    for k in 0..2 {
        let vt = (a.velocity_at(row.r_a) - b.velocity_at(row.r_b)).dot(row.tangents[k]);
        let lambda = -row.tangent_mass[k] * vt;
        let old = row.tangent_impulse[k];
        row.tangent_impulse[k] = (old + lambda).clamp(-limit, limit);
        let impulse = row.tangents[k] * (row.tangent_impulse[k] - old);
        a.apply_impulse(impulse, row.r_a);
        b.apply_impulse(-impulse, row.r_b);
    }
}

fn effective_mass(a: &Body, b: &Body, r_a: Vec3, r_b: Vec3, direction: Vec3) -> f32 {
    let angular = |body: &Body, r: Vec3| {
        let rn = r.cross(direction);
        (body.inv_inertia_world() * rn * body.angular_factor).dot(rn)
    };
    let k = a.inverse_mass() * (direction * a.linear_factor).dot(direction)
        + b.inverse_mass() * (direction * b.linear_factor).dot(direction)
        + angular(a, r_a)
        + angular(b, r_b);
    if k > f32::EPSILON {
        1.0 / k
    } else {
        0.0
    }
}

fn tangent_basis(normal: Vec3) -> [Vec3; 2] {
    let t1 = if normal.x.abs() >= 0.577_35 {
        Vec3::new(normal.y, -normal.x, 0.0).normalize()
    } else {
        Vec3::new(0.0, normal.z, -normal.y).normalize()
    };
    [t1, normal.cross(t1)]
}

/// Two distinct bodies borrowed mutably at once.
fn pair_mut(bodies: &mut [Option<Body>], a: usize, b: usize) -> Option<(&mut Body, &mut Body)> {
    if a == b || a.max(b) >= bodies.len() {
        return None;
    }
    let (lo, hi) = (a.min(b), a.max(b));
    let (head, tail) = bodies.split_at_mut(hi);
    let (first, second) = (head[lo].as_mut()?, tail[0].as_mut()?);
    if a < b {
        Some((first, second))
    } else {
        Some((second, first))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BodyDesc;
    use crate::collision::ContactPoint;
    use crate::shapes::Shape;
    use crate::transform::Isometry;

    #[test]
    fn falling_ball_is_stopped_by_static_ground() {
        let ball = Shape::ball(0.5).unwrap();
        let ground = Shape::cuboid(Vec3::new(5.0, 0.5, 5.0)).unwrap();
        let mut inertia = Vec3::ZERO;
        ball.calculate_local_inertia(1.0, &mut inertia);
        let mut bodies = vec![
            Some(Body::from_desc(
                BodyDesc::rigid(ball)
                    .with_mass(1.0, inertia)
                    .with_transform(Isometry::from_translation(Vec3::new(0.0, 0.99, 0.0)))
                    .with_linear_velocity(Vec3::new(0.0, -3.0, 0.0)),
            )),
            Some(Body::from_desc(BodyDesc::rigid(ground))),
        ];

        let pair = (BodyHandle(0), BodyHandle(1));
        let mut manifold = ContactManifold::new(pair.0, pair.1);
        let contact = ContactPoint::new(Vec3::new(0.0, 0.49, 0.0), Vec3::new(0.0, 0.5, 0.0), Vec3::Y, -0.01);
        let (iso_a, iso_b) = (bodies[0].as_ref().unwrap().transform, bodies[1].as_ref().unwrap().transform);
        manifold.add_point(&iso_a, &iso_b, contact, 0.02);
        let mut manifolds = BTreeMap::from([(pair, manifold)]);

        solve_contacts(&mut bodies, &mut manifolds, &SolverSettings::default(), 1.0 / 60.0);

        let v = bodies[0].as_ref().unwrap().linear_velocity();
        assert!(v.y >= -1e-4, "v={v:?}");
        assert!(manifolds[&pair].points()[0].applied_impulse > 0.0);
    }

    #[test]
    fn non_responsive_pairs_are_skipped() {
        let ball = Shape::ball(0.5).unwrap();
        let mut bodies = vec![
            Some(Body::from_desc(
                BodyDesc::rigid(ball)
                    .with_mass(1.0, Vec3::splat(0.1))
                    .with_linear_velocity(Vec3::new(0.0, -3.0, 0.0)),
            )),
            Some(Body::from_desc(BodyDesc::ghost(ball))),
        ];
        let pair = (BodyHandle(0), BodyHandle(1));
        let mut manifold = ContactManifold::new(pair.0, pair.1);
        manifold.add_point(
            &Isometry::IDENTITY,
            &Isometry::IDENTITY,
            ContactPoint::new(Vec3::ZERO, Vec3::ZERO, Vec3::Y, -0.5),
            0.02,
        );
        let mut manifolds = BTreeMap::from([(pair, manifold)]);
        solve_contacts(&mut bodies, &mut manifolds, &SolverSettings::default(), 1.0 / 60.0);
        assert_eq!(bodies[0].as_ref().unwrap().linear_velocity(), Vec3::new(0.0, -3.0, 0.0));
    }
}
