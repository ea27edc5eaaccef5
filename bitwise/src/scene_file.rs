//! JSON scene description: an optional physics snapshot plus entities with
//! optional components.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use ecs::components::{BoxCollider, Position, RigidBody, SphereCollider};
use ecs::{Entity, World};
use game::PhysicsSnapshot;
use serde::Deserialize;

pub const DEMO: &str = include_str!("../scenes/demo.json");

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneFile {
    #[serde(default)]
    pub physics: Option<PhysicsSnapshot>,
    #[serde(default)]
    pub entities: Vec<EntityDef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityDef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub rigid_body: Option<RigidBody>,
    #[serde(default)]
    pub box_collider: Option<BoxCollider>,
    #[serde(default)]
    pub sphere_collider: Option<SphereCollider>,
}

impl SceneFile {
    /// # Errors
    /// Malformed JSON or unknown fields.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid scene file")
    }

    /// # Errors
    /// Unreadable file or [`parse`](Self::parse) failure.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("loading {}", path.display()))
    }

    /// Spawn every entity, returning them with their display names.
    ///
    /// # Errors
    /// If a component kind is not registered with `world`.
    pub fn spawn_into(&self, world: &mut World) -> Result<Vec<(Entity, String)>> {
        let mut spawned = Vec::with_capacity(self.entities.len());
        for (i, def) in self.entities.iter().enumerate() {
            let entity = world.spawn();
            if let Some(position) = def.position {
                world.insert(entity, position)?;
            }
            if let Some(rigid_body) = def.rigid_body {
                world.insert(entity, rigid_body)?;
            }
            if let Some(collider) = def.box_collider {
                world.insert(entity, collider)?;
            }
            if let Some(collider) = def.sphere_collider {
                world.insert(entity, collider)?;
            }
            let name = def.name.clone().unwrap_or_else(|| format!("entity-{i}"));
            spawned.push((entity, name));
        }
        Ok(spawned)
    }
}
