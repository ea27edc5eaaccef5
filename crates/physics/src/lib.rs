#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::missing_panics_doc,
    clippy::many_single_char_names
)]
//! # Bitwise Physics Engine
//!
//! A small rigid-body engine with persistent contact manifolds, used by the
//! game layer to simulate and report collisions between entities.
//!
//! ## Key Components
//!
//! -   **Bodies:** [`BodyDesc`] describes a rigid or ghost body with a
//!     [`Shape`], mass, axis factors and collision filter. Bodies live inside a
//!     [`PhysicsWorld`] and are addressed by [`BodyHandle`].
//! -   **Broad phase:** [`Broadphase::AxisSweep`] (sweep and prune) or
//!     [`Broadphase::Dbvt`] (dynamic AABB tree), chosen per world.
//! -   **Manifolds:** each overlapping pair keeps a [`ContactManifold`] of up
//!     to four [`ContactPoint`]s with signed distances (negative means
//!     penetrating).
//!
//! ## Usage
//!
//! ```rust
//! use glam::Vec3;
//! use physics::{BodyDesc, Isometry, PhysicsWorld, Shape, WorldConfig};
//!
//! let mut world = PhysicsWorld::new(WorldConfig::default());
//! let ground = Shape::cuboid(Vec3::new(10.0, 0.5, 10.0)).unwrap();
//! world.add_body(BodyDesc::rigid(ground));
//!
//! let cube = Shape::cuboid(Vec3::splat(0.5)).unwrap();
//! let mut inertia = Vec3::ZERO;
//! cube.calculate_local_inertia(1.0, &mut inertia);
//! let body = world.add_body(
//!     BodyDesc::rigid(cube)
//!         .with_mass(1.0, inertia)
//!         .with_transform(Isometry::from_translation(Vec3::new(0.0, 3.0, 0.0))),
//! );
//!
//! for _ in 0..60 {
//!     world.step(1000.0 / 60.0);
//! }
//! assert!(world.world_transform(body).unwrap().translation.y < 3.0);
//! ```

pub mod body;
pub mod builder;
pub mod collision;
pub mod error;
pub mod integrator;
pub mod shapes;
pub mod simulation;
pub mod solver;
pub mod transform;
pub mod types;

pub use body::Body;
pub use builder::BodyDesc;
pub use collision::{Broadphase, ContactManifold, ContactPoint, MAX_CONTACT_POINTS};
pub use error::PhysicsError;
pub use shapes::{Aabb, Shape};
pub use simulation::{PhysicsWorld, WorldConfig};
pub use solver::SolverSettings;
pub use transform::Isometry;
pub use types::{BodyHandle, BodyKind, CollisionFilter, CollisionFlags};

pub use glam;
