#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::cast_possible_truncation)]
//! # Bitwise ECS
//!
//! A compact entity-component store: generational [`Entity`] ids, one
//! sparse-set [`ComponentStore`] per registered component kind, and
//! queries that report which entities entered or left them each tick.
//!
//! ```rust
//! use ecs::{components::Position, World};
//!
//! let mut world = World::new();
//! let position = world.register::<Position>().unwrap();
//! let movers = world.query(&[position]);
//!
//! let e = world.spawn();
//! world.insert(e, Position::at(0.0, 1.0, 0.0)).unwrap();
//! world.advance_tick();
//! assert_eq!(world.entered(movers), vec![e]);
//! ```

pub mod component;
pub mod components;
pub mod entity;
pub mod error;
pub mod query;
pub mod store;
pub mod world;

pub use component::{Component, ComponentId, ComponentMask, MAX_COMPONENTS};
pub use entity::Entity;
pub use error::EcsError;
pub use query::QueryHandle;
pub use store::ComponentStore;
pub use world::World;
