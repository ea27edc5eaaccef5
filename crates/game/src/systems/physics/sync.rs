//! Transform reconciliation between `Position` and bodies.

use ecs::components::Position;
use ecs::World;
use physics::{BodyKind, Isometry, PhysicsError, PhysicsWorld};

use super::arena::{BodyArena, BodyEntry};

/// Pull simulated transforms into `Position` for moving rigid bodies and push
/// `Position` into ghosts. Scale is never touched and quaternions are copied
/// as they are.
///
/// # Errors
/// [`PhysicsError::UnknownBody`] if the arena and the world disagree.
pub fn synchronize(world: &mut World, physics: &mut PhysicsWorld, bodies: &mut BodyArena) -> Result<(), PhysicsError> {
    for entry in bodies.iter_mut() {
        match entry.kind {
            BodyKind::Rigid => pull(world, physics, entry)?,
            BodyKind::Ghost => push(world, physics, entry)?,
        }
    }
    Ok(())
}

/// Static bodies are skipped: nothing moves them, and writing back
/// `translation + offset - offset` could perturb the entity by an ulp.
pub fn pull(world: &mut World, physics: &PhysicsWorld, entry: &BodyEntry) -> Result<(), PhysicsError> {
    let body = physics
        .body(entry.handle)
        .ok_or(PhysicsError::UnknownBody(entry.handle))?;
    if body.is_static() {
        return Ok(());
    }
    if let Some(position) = world.get_mut::<Position>(entry.entity) {
        let iso = body.transform();
        position.set_translation(iso.translation - entry.offset);
        position.set_rotation(iso.rotation);
    }
    Ok(())
}

/// Records the pushed translation as the entry's anchor so reading the ghost
/// back in entity space returns exactly what was pushed.
pub fn push(world: &World, physics: &mut PhysicsWorld, entry: &mut BodyEntry) -> Result<(), PhysicsError> {
    let Some(position) = world.get::<Position>(entry.entity) else {
        return Ok(());
    };
    let transform = Isometry::new(position.translation() + entry.offset, position.rotation());
    physics.set_world_transform(entry.handle, transform)?;
    entry.anchor = position.translation();
    Ok(())
}
