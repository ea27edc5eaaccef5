//! # Physics World
//!
//! Owns every body, the broad phase and the persistent manifolds, and
//! advances them in fixed sub-steps:
//!
//! 1. gravity is folded into dynamic velocities,
//! 2. the broad phase is refreshed and candidate pairs are narrowed into
//!    manifolds,
//! 3. the contact solver corrects velocities,
//! 4. transforms are integrated.
//!
//! Bodies, pairs and manifolds are always visited in ascending handle order,
//! so two worlds fed the same calls produce identical results.

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::body::Body;
use crate::builder::BodyDesc;
use crate::collision::{collide, create_broad_phase, BroadPhase, Broadphase, ContactManifold};
use crate::error::PhysicsError;
use crate::integrator::{integrate_positions, integrate_velocities};
use crate::solver::{solve_contacts, SolverSettings};
use crate::transform::Isometry;
use crate::types::BodyHandle;

/// Fixed at construction. Changing any of these means building a new world.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub gravity: Vec3,
    pub broadphase: Broadphase,
    /// Sub-steps taken by every [`PhysicsWorld::step`] call.
    pub substeps: u32,
    pub solver_iterations: u32,
    /// Points further apart than this are dropped from manifolds. Closer
    /// ones are kept even with positive distance.
    pub contact_breaking_threshold: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            broadphase: Broadphase::AxisSweep,
            substeps: 10,
            solver_iterations: 10,
            contact_breaking_threshold: 0.02,
        }
    }
}

pub struct PhysicsWorld {
    config: WorldConfig,
    solver: SolverSettings,
    bodies: Vec<Option<Body>>,
    free: Vec<u32>,
    broad_phase: Box<dyn BroadPhase>,
    manifolds: BTreeMap<(BodyHandle, BodyHandle), ContactManifold>,
    elapsed: f64,
}

impl PhysicsWorld {
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        debug!(
            gravity = %config.gravity,
            broadphase = %config.broadphase,
            substeps = config.substeps,
            "creating physics world"
        );
        Self {
            solver: SolverSettings {
                iterations: config.solver_iterations,
                ..SolverSettings::default()
            },
            broad_phase: create_broad_phase(config.broadphase),
            config,
            bodies: Vec::new(),
            free: Vec::new(),
            manifolds: BTreeMap::new(),
            elapsed: 0.0,
        }
    }

    /// Replace the world with an empty one built from `config`. Every body,
    /// handle and manifold is discarded.
    pub fn rebuild(&mut self, config: WorldConfig) {
        info!(
            bodies = self.num_bodies(),
            gravity = %config.gravity,
            broadphase = %config.broadphase,
            "rebuilding physics world"
        );
        *self = Self::new(config);
    }

    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    #[must_use]
    pub fn gravity(&self) -> Vec3 {
        self.config.gravity
    }

    #[must_use]
    pub fn broadphase(&self) -> Broadphase {
        self.config.broadphase
    }

    /// Simulated seconds since construction.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn add_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let body = Body::from_desc(desc);
        let aabb = body.aabb().expanded(self.config.contact_breaking_threshold);
        let handle = match self.free.pop() {
            Some(index) => {
                self.bodies[index as usize] = Some(body);
                BodyHandle(index)
            }
            None => {
                // More than u32::MAX live bodies is not a supported workload.
                let index = u32::try_from(self.bodies.len()).unwrap_or(u32::MAX);
                self.bodies.push(Some(body));
                BodyHandle(index)
            }
        };
        self.broad_phase.insert(handle, aabb);
        trace!(%handle, "added body");
        handle
    }

    /// # Errors
    /// Returns [`PhysicsError::UnknownBody`] if the handle is not live.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<Body, PhysicsError> {
        let body = self
            .bodies
            .get_mut(handle.index())
            .and_then(Option::take)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        self.broad_phase.remove(handle);
        self.manifolds.retain(|&(a, b), _| a != handle && b != handle);
        self.free.push(handle.0);
        trace!(%handle, "removed body");
        Ok(body)
    }

    #[must_use]
    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle.index()).and_then(Option::as_ref)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(handle.index()).and_then(Option::as_mut)
    }

    /// Live bodies in ascending handle order.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body)> + '_ {
        self.bodies
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|b| (BodyHandle(i as u32), b)))
    }

    #[must_use]
    pub fn num_bodies(&self) -> usize {
        self.bodies.iter().flatten().count()
    }

    #[must_use]
    pub fn world_transform(&self, handle: BodyHandle) -> Option<Isometry> {
        self.body(handle).map(|b| b.transform)
    }

    /// Teleport a body. This is how ghosts follow externally driven data.
    ///
    /// # Errors
    /// Returns [`PhysicsError::UnknownBody`] if the handle is not live.
    pub fn set_world_transform(&mut self, handle: BodyHandle, transform: Isometry) -> Result<(), PhysicsError> {
        let margin = self.config.contact_breaking_threshold;
        let body = self
            .bodies
            .get_mut(handle.index())
            .and_then(Option::as_mut)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        body.transform = transform;
        let aabb = body.aabb().expanded(margin);
        self.broad_phase.update(handle, aabb);
        Ok(())
    }

    /// Manifolds of all currently overlapping pairs, ascending by handle pair.
    /// Valid until the next mutation of the world.
    pub fn manifolds(&self) -> impl Iterator<Item = &ContactManifold> + '_ {
        self.manifolds.values()
    }

    #[must_use]
    pub fn num_manifolds(&self) -> usize {
        self.manifolds.len()
    }

    /// Advance by `delta_ms` milliseconds split into equal sub-steps.
    ///
    /// A zero (or negative, or non-finite) delta moves nothing but still
    /// refreshes contacts, so newly added or teleported bodies show up in
    /// [`manifolds`](Self::manifolds).
    pub fn step(&mut self, delta_ms: f32) {
        if !delta_ms.is_finite() || delta_ms <= 0.0 {
            self.detect_contacts();
            return;
        }
        let substeps = self.config.substeps.max(1);
        let dt = delta_ms / 1000.0 / substeps as f32;
        for _ in 0..substeps {
            self.substep(dt);
        }
        let threshold = self.config.contact_breaking_threshold;
        for (&(a, b), manifold) in &mut self.manifolds {
            if let (Some(Some(ba)), Some(Some(bb))) = (self.bodies.get(a.index()), self.bodies.get(b.index())) {
                manifold.refresh(&ba.transform, &bb.transform, threshold);
            }
        }
        trace!(
            delta_ms,
            substeps,
            manifolds = self.manifolds.len(),
            "stepped physics world"
        );
    }

    fn substep(&mut self, dt: f32) {
        integrate_velocities(self.bodies.iter_mut().flatten(), self.config.gravity, dt);
        self.detect_contacts();
        solve_contacts(&mut self.bodies, &mut self.manifolds, &self.solver, dt);
        integrate_positions(self.bodies.iter_mut().flatten(), dt);
        self.elapsed += f64::from(dt);
    }

    fn detect_contacts(&mut self) {
        let threshold = self.config.contact_breaking_threshold;
        for (i, body) in self.bodies.iter().enumerate() {
            if let Some(body) = body {
                self.broad_phase
                    .update(BodyHandle(i as u32), body.aabb().expanded(threshold));
            }
        }

        let mut live = BTreeMap::new();
        for (a, b) in self.broad_phase.overlapping_pairs() {
            let (Some(Some(body_a)), Some(Some(body_b))) = (self.bodies.get(a.index()), self.bodies.get(b.index()))
            else {
                continue;
            };
            if !needs_collision(body_a, body_b) {
                continue;
            }
            let mut manifold = self
                .manifolds
                .remove(&(a, b))
                .unwrap_or_else(|| ContactManifold::new(a, b));
            manifold.refresh(&body_a.transform, &body_b.transform, threshold);
            for point in collide(&body_a.shape, &body_a.transform, &body_b.shape, &body_b.transform, threshold) {
                manifold.add_point(&body_a.transform, &body_b.transform, point, threshold);
            }
            live.insert((a, b), manifold);
        }
        self.manifolds = live;
    }
}

fn needs_collision(a: &Body, b: &Body) -> bool {
    if a.is_static() && b.is_static() {
        return false;
    }
    a.filter.accepts(b.filter)
}
