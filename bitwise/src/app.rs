//! Headless frame loop.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::{Context, Result};
use ecs::components::{self, Position, RigidBody};
use ecs::{Entity, World};
use game::{PhysicsConfig, PhysicsSystem, Scene};
use tracing::{debug, info};

use crate::scene_file::{SceneFile, DEMO};
use crate::Cli;

/// Load the scene, simulate `cli.frames` frames and report.
///
/// # Errors
/// Scene loading, system construction or a failing frame.
pub fn run(cli: &Cli) -> Result<()> {
    let file = match &cli.scene {
        Some(path) => SceneFile::load(path)?,
        None => SceneFile::parse(DEMO).context("built-in demo scene")?,
    };

    let mut config = PhysicsConfig::default();
    if let Some(snapshot) = &file.physics {
        config = config.with_snapshot(snapshot);
    }
    if let Some(broadphase) = cli.broadphase {
        config.broadphase = broadphase;
    }

    let mut world = World::new();
    components::register_all(&mut world)?;
    let names: BTreeMap<Entity, String> = file.spawn_into(&mut world)?.into_iter().collect();
    let mut physics = PhysicsSystem::new(&mut world, config)?;

    let contacts: Rc<RefCell<Vec<(Entity, Vec<Entity>)>>> = Rc::default();
    let position = world.component_id::<Position>().context("Position not registered")?;
    let rigid_body = world.component_id::<RigidBody>().context("RigidBody not registered")?;
    let watched = world.query(&[position, rigid_body]);
    let sink = Rc::clone(&contacts);
    physics.watch_query(watched, move |entity, partners| {
        sink.borrow_mut().push((entity, partners.iter().copied().collect()));
    });

    let mut scene = Scene::new(world);
    scene.add_system(Box::new(physics));

    info!(
        entities = names.len(),
        frames = cli.frames,
        frame_ms = cli.frame_ms,
        broadphase = %config.broadphase,
        "starting simulation"
    );
    for _ in 0..cli.frames {
        scene.update(cli.frame_ms)?;
        for (entity, partners) in contacts.borrow_mut().drain(..) {
            let partners: Vec<&str> = partners.iter().map(|p| label(&names, *p)).collect();
            debug!(frame = scene.frame(), entity = label(&names, entity), ?partners, "touching");
        }
        if scene.frame() % 30 == 0 {
            if let Some(physics) = scene.system::<PhysicsSystem>() {
                info!(
                    frame = scene.frame(),
                    bodies = physics.num_bodies(),
                    pairs = physics.collisions().num_pairs(),
                    "progress"
                );
            }
        }
    }

    for (entity, name) in &names {
        if let Some(p) = scene.world().get::<Position>(*entity) {
            info!(entity = %name, x = p.x, y = p.y, z = p.z, "final position");
        }
    }
    let frozen = serde_json::to_string(&scene.freeze())?;
    info!(%frozen, "final snapshot");
    Ok(())
}

fn label<'a>(names: &'a BTreeMap<Entity, String>, entity: Entity) -> &'a str {
    names.get(&entity).map_or("?", String::as_str)
}
