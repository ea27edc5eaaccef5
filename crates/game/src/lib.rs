#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Bitwise Game Runtime
//!
//! Frame-driven systems over an [`ecs::World`]. The centrepiece is
//! [`PhysicsSystem`], which keeps a [`physics::PhysicsWorld`] in step with
//! entity data:
//!
//! 1. bodies are created and destroyed as entities enter and leave the
//!    physics queries,
//! 2. the simulation advances,
//! 3. touching pairs are collected into a [`CollisionSet`] and handed to
//!    watchers,
//! 4. transforms flow back to `Position` (or, for ghosts, into the bodies).

pub mod error;
pub mod scene;
pub mod system;
pub mod systems;

pub use error::SystemError;
pub use scene::Scene;
pub use system::{System, SystemRecord};
pub use systems::physics::{
    AxisLocks, BodyEntry, CollisionSet, ColliderVariant, PhysicsConfig, PhysicsSnapshot, PhysicsSystem,
};
