use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use ecs::components::{self, BoxCollider, Position, RigidBody, SphereCollider};
use ecs::{Entity, World};
use game::{PhysicsConfig, PhysicsSystem, Scene, SystemError};
use glam::{Quat, Vec3};
use physics::{BodyKind, Broadphase, Shape};
use serde_json::{json, Value};

const FRAME_MS: f32 = 16.0;

fn scene(config: PhysicsConfig) -> Scene {
    let mut world = World::new();
    components::register_all(&mut world).unwrap();
    let physics = PhysicsSystem::new(&mut world, config).unwrap();
    let mut scene = Scene::new(world);
    scene.add_system(Box::new(physics));
    scene
}

fn weightless() -> PhysicsConfig {
    PhysicsConfig {
        gravity: Vec3::ZERO,
        ..PhysicsConfig::default()
    }
}

fn spawn(scene: &mut Scene, position: Position, rigid_body: Option<RigidBody>, collider: Option<BoxCollider>) -> Entity {
    let world = scene.world_mut();
    let e = world.spawn();
    world.insert(e, position).unwrap();
    if let Some(rb) = rigid_body {
        world.insert(e, rb).unwrap();
    }
    if let Some(c) = collider {
        world.insert(e, c).unwrap();
    }
    e
}

fn physics(scene: &Scene) -> &PhysicsSystem {
    scene.system::<PhysicsSystem>().unwrap()
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` and return everything logged at warn level or above.
fn warnings_during(f: impl FnOnce()) -> String {
    let buffer = LogBuffer::default();
    let sink = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || sink.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.0.lock().unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[test]
fn body_exists_after_entering_tick() {
    let mut scene = scene(PhysicsConfig::default());
    let e = spawn(&mut scene, Position::at(0.0, 5.0, 0.0), Some(RigidBody::dynamic(1.0)), Some(BoxCollider::default()));
    assert!(physics(&scene).body(e).is_none());

    scene.update(FRAME_MS).unwrap();
    let body = physics(&scene).body(e).unwrap();
    assert!(body.is_dynamic());
    assert_eq!(body.user_index(), e.to_bits());
    assert_eq!(physics(&scene).num_bodies(), 1);
}

#[test]
fn leaving_entity_loses_its_body_once() {
    let mut scene = scene(weightless());
    let e = spawn(&mut scene, Position::default(), Some(RigidBody::dynamic(1.0)), Some(BoxCollider::default()));
    scene.update(FRAME_MS).unwrap();
    assert_eq!(physics(&scene).physics_world().num_bodies(), 1);

    scene.world_mut().despawn(e);
    scene.update(FRAME_MS).unwrap();
    assert!(physics(&scene).body(e).is_none());
    assert_eq!(physics(&scene).num_bodies(), 0);
    assert_eq!(physics(&scene).physics_world().num_bodies(), 0);

    scene.update(FRAME_MS).unwrap();
    assert_eq!(physics(&scene).physics_world().num_bodies(), 0);
}

#[test]
fn recycled_index_gets_a_fresh_body() {
    let mut scene = scene(weightless());
    let old = spawn(&mut scene, Position::at(-3.0, 0.0, 0.0), Some(RigidBody::dynamic(1.0)), Some(BoxCollider::default()));
    scene.update(FRAME_MS).unwrap();

    scene.world_mut().despawn(old);
    let new = spawn(&mut scene, Position::at(3.0, 0.0, 0.0), None, Some(BoxCollider::default()));
    assert_eq!(new.index(), old.index());
    scene.update(FRAME_MS).unwrap();

    let physics = physics(&scene);
    assert!(physics.body(old).is_none());
    let body = physics.body(new).unwrap();
    assert!(body.is_static());
    assert_eq!(body.transform().translation, Vec3::new(3.0, 0.0, 0.0));
    assert_eq!(physics.num_bodies(), 1);
    assert_eq!(physics.physics_world().num_bodies(), 1);
}

#[test]
fn scaled_static_box() {
    let mut scene = scene(PhysicsConfig::default());
    let position = Position::at(1.0, -2.0, 0.5).with_scale(2.0, 2.0, 2.0);
    let e = spawn(&mut scene, position, Some(RigidBody::default()), Some(BoxCollider::default()));
    scene.update(FRAME_MS).unwrap();

    let body = physics(&scene).body(e).unwrap();
    assert!(body.is_static());
    assert_eq!(*body.shape(), Shape::Cuboid { half_extents: Vec3::ONE });
    assert_eq!(body.transform().translation, Vec3::new(1.0, -2.0, 0.5));
    assert_eq!(body.local_inertia(), Vec3::ZERO);
    // static bodies are never written back
    assert_eq!(*scene.world().get::<Position>(e).unwrap(), position);
}

#[test]
fn dynamic_inertia_comes_from_the_shape() {
    let mut scene = scene(weightless());
    let rb = RigidBody {
        mass: 5.0,
        vx: 1.0,
        vy: 1.0,
        vz: 1.0,
        kinematic: 0,
    };
    let e = spawn(&mut scene, Position::default(), Some(rb), Some(BoxCollider::default()));
    scene.update(FRAME_MS).unwrap();

    let mut expected = rb.inertia_seed();
    Shape::cuboid(Vec3::splat(0.5)).unwrap().calculate_local_inertia(5.0, &mut expected);
    let body = physics(&scene).body(e).unwrap();
    assert_eq!(body.mass(), 5.0);
    assert_eq!(body.local_inertia(), expected);
    assert!(expected.cmpgt(Vec3::ZERO).all());
}

#[test]
fn overlapping_pair_is_reported_once_and_symmetrically() {
    let mut scene = scene(PhysicsConfig::default());
    let floor = spawn(&mut scene, Position::default(), Some(RigidBody::default()), Some(BoxCollider::sized(4.0, 1.0, 1.0)));
    let ghost = spawn(&mut scene, Position::at(0.0, 0.5, 0.0), Some(RigidBody::kinematic()), Some(BoxCollider::default()));
    let loner = spawn(&mut scene, Position::at(20.0, 0.0, 0.0), Some(RigidBody::default()), Some(BoxCollider::default()));
    scene.update(FRAME_MS).unwrap();

    let collisions = physics(&scene).collisions();
    assert_eq!(collisions.num_pairs(), 1);
    assert!(collisions.touching(floor, ghost));
    assert!(collisions.touching(ghost, floor));
    assert!(collisions.partners(loner).is_none());
    assert!(collisions.is_symmetric());
}

#[test]
fn watcher_runs_once_per_colliding_member() {
    let mut scene = scene(PhysicsConfig::default());
    let floor = spawn(&mut scene, Position::default(), Some(RigidBody::default()), Some(BoxCollider::sized(8.0, 1.0, 1.0)));
    let a = spawn(&mut scene, Position::at(-2.0, 0.5, 0.0), Some(RigidBody::kinematic()), Some(BoxCollider::default()));
    let b = spawn(&mut scene, Position::at(2.0, 0.5, 0.0), Some(RigidBody::kinematic()), Some(BoxCollider::default()));
    // touches `a` but is not in the watched query
    let bare = spawn(&mut scene, Position::at(-2.0, 1.2, 0.0), None, Some(BoxCollider::default()));

    let calls: Rc<RefCell<Vec<(Entity, usize)>>> = Rc::default();
    {
        let (world, physics) = scene.world_and_system_mut::<PhysicsSystem>();
        let position = world.component_id::<Position>().unwrap();
        let rigid_body = world.component_id::<RigidBody>().unwrap();
        let query = world.query(&[position, rigid_body]);
        let log = Rc::clone(&calls);
        physics
            .unwrap()
            .watch_query(query, move |entity, partners| log.borrow_mut().push((entity, partners.len())));
    }

    scene.update(FRAME_MS).unwrap();
    let calls = calls.borrow();
    assert_eq!(*calls, vec![(floor, 2), (a, 2), (b, 1)]);
    assert!(calls.iter().all(|(e, _)| *e != bare));
}

#[test]
fn watchers_run_in_registration_order() {
    let mut scene = scene(PhysicsConfig::default());
    let a = spawn(&mut scene, Position::at(0.0, 0.5, 0.0), Some(RigidBody::kinematic()), Some(BoxCollider::default()));
    let b = spawn(&mut scene, Position::default(), Some(RigidBody::default()), Some(BoxCollider::sized(4.0, 1.0, 1.0)));

    let calls: Rc<RefCell<Vec<(u8, Entity)>>> = Rc::default();
    {
        let (world, physics) = scene.world_and_system_mut::<PhysicsSystem>();
        let physics = physics.unwrap();
        let position = world.component_id::<Position>().unwrap();
        let rigid_body = world.component_id::<RigidBody>().unwrap();
        let collider = world.component_id::<BoxCollider>().unwrap();
        let bodies = world.query(&[position, rigid_body]);
        let colliders = world.query(&[position, collider]);

        let log = Rc::clone(&calls);
        physics.watch_query(bodies, move |entity, _| log.borrow_mut().push((1, entity)));
        let log = Rc::clone(&calls);
        physics.watch_query(colliders, move |entity, _| log.borrow_mut().push((2, entity)));
    }

    scene.update(FRAME_MS).unwrap();
    assert_eq!(*calls.borrow(), vec![(1, a), (1, b), (2, a), (2, b)]);
}

#[test]
fn ghost_follows_position_exactly() {
    let mut scene = scene(PhysicsConfig::default());
    let rotation = Quat::from_rotation_z(0.3);
    let e = spawn(
        &mut scene,
        Position::at(1.5, 2.25, 0.0).with_rotation(rotation),
        Some(RigidBody::kinematic()),
        Some(BoxCollider::default()),
    );
    scene.update(FRAME_MS).unwrap();
    assert_eq!(physics(&scene).body_entry(e).unwrap().kind, BodyKind::Ghost);

    let moved = Position::at(-4.0, 0.125, 0.0).with_rotation(Quat::from_rotation_z(-1.1));
    *scene.world_mut().get_mut::<Position>(e).unwrap() = moved;
    scene.update(FRAME_MS).unwrap();

    let iso = physics(&scene).body_transform(e).unwrap();
    assert_eq!(iso.translation, moved.translation());
    assert_eq!(iso.rotation, moved.rotation());
    assert_eq!(*scene.world().get::<Position>(e).unwrap(), moved);
}

#[test]
fn offset_ghost_reads_back_what_was_pushed() {
    for offset in [Vec3::new(0.3, 0.1, 0.0), Vec3::new(0.0, 1e4, 0.0)] {
        let mut scene = scene(PhysicsConfig::default());
        let mut collider = BoxCollider::default();
        collider.ox = offset.x;
        collider.oy = offset.y;
        let e = spawn(&mut scene, Position::default(), Some(RigidBody::kinematic()), Some(collider));

        let mut mismatched = Vec::new();
        for i in 0..1000 {
            let step = i as f32;
            let p = Position::at(step * 0.0137 - 5.0, step * 0.0071 + 0.2, 0.0)
                .with_rotation(Quat::from_rotation_z(step * 0.01));
            *scene.world_mut().get_mut::<Position>(e).unwrap() = p;
            scene.update(FRAME_MS).unwrap();

            let iso = physics(&scene).body_transform(e).unwrap();
            if iso.translation != p.translation() || iso.rotation != p.rotation() {
                mismatched.push(i);
            }
        }
        assert!(mismatched.is_empty(), "offset {offset}: {} mismatched, first {:?}", mismatched.len(), mismatched.first());

        // the simulated body itself still sits at the offset origin
        let physics = physics(&scene);
        let handle = physics.body_entry(e).unwrap().handle;
        let body_y = physics.physics_world().world_transform(handle).unwrap().translation.y;
        let entity_y = scene.world().get::<Position>(e).unwrap().y;
        assert!((body_y - (entity_y + offset.y)).abs() <= 1e-3 * offset.y.max(1.0));
    }
}

#[test]
fn falling_body_writes_back_position() {
    let mut scene = scene(PhysicsConfig::default());
    let e = spawn(&mut scene, Position::at(0.0, 10.0, 0.0).with_scale(3.0, 3.0, 3.0), Some(RigidBody::dynamic(1.0)), Some(BoxCollider::default()));
    for _ in 0..10 {
        scene.update(FRAME_MS).unwrap();
    }
    let position = *scene.world().get::<Position>(e).unwrap();
    assert!(position.y < 10.0);
    assert_eq!(position.scale(), Vec3::splat(3.0));
    assert_eq!(position.x, 0.0);
}

#[test]
fn collider_offset_is_not_written_back() {
    let mut scene = scene(weightless());
    let mut collider = BoxCollider::default();
    collider.oy = 0.5;
    let e = spawn(&mut scene, Position::at(0.0, 1.0, 0.0), Some(RigidBody::dynamic(1.0)), Some(collider));
    for _ in 0..5 {
        scene.update(FRAME_MS).unwrap();
    }
    let physics = physics(&scene);
    let entry = physics.body_entry(e).unwrap();
    assert_eq!(entry.offset, Vec3::new(0.0, 0.5, 0.0));
    assert_eq!(physics.physics_world().world_transform(entry.handle).unwrap().translation.y, 1.5);
    assert_eq!(scene.world().get::<Position>(e).unwrap().y, 1.0);
}

#[test]
fn planar_profile_keeps_motion_in_xy() {
    let config = PhysicsConfig {
        gravity: Vec3::new(2.0, -9.81, 3.0),
        ..PhysicsConfig::default()
    };
    let mut scene = scene(config);
    let e = spawn(&mut scene, Position::at(0.0, 10.0, 0.0), Some(RigidBody::dynamic(1.0)), Some(BoxCollider::default()));
    for _ in 0..20 {
        scene.update(FRAME_MS).unwrap();
    }
    let position = scene.world().get::<Position>(e).unwrap();
    assert_eq!(position.z, 0.0);
    assert!(position.x > 0.0);
}

#[test]
fn failing_entities_are_isolated() {
    let mut scene = scene(PhysicsConfig::default());
    let no_collider = spawn(&mut scene, Position::default(), Some(RigidBody::dynamic(2.0)), None);
    let flat = spawn(&mut scene, Position::default(), None, Some(BoxCollider::sized(1.0, 0.0, 1.0)));
    let good = spawn(&mut scene, Position::at(5.0, 0.0, 0.0), Some(RigidBody::dynamic(1.0)), Some(BoxCollider::default()));
    let warnings = warnings_during(|| scene.update(FRAME_MS).unwrap());
    assert_eq!(warnings.matches("skipping physics body").count(), 2, "{warnings}");

    let physics = physics(&scene);
    assert!(physics.body(no_collider).is_none());
    assert!(physics.body(flat).is_none());
    assert!(physics.body(good).is_some());
    assert_eq!(physics.num_bodies(), 1);
}

#[test]
fn collider_added_and_removed_within_a_tick_is_never_seen() {
    let mut scene = scene(PhysicsConfig::default());
    let e = spawn(&mut scene, Position::default(), None, None);
    scene.world_mut().insert(e, BoxCollider::default()).unwrap();
    scene.world_mut().remove::<BoxCollider>(e);

    let warnings = warnings_during(|| scene.update(FRAME_MS).unwrap());
    assert!(warnings.is_empty(), "{warnings}");
    assert!(physics(&scene).body(e).is_none());
    assert_eq!(physics(&scene).num_bodies(), 0);
    assert_eq!(physics(&scene).physics_world().num_bodies(), 0);

    scene.update(FRAME_MS).unwrap();
    assert_eq!(physics(&scene).physics_world().num_bodies(), 0);
}

#[test]
fn conflicting_colliders_resolve_when_one_leaves() {
    let mut scene = scene(weightless());
    let e = spawn(&mut scene, Position::default(), Some(RigidBody::dynamic(1.0)), Some(BoxCollider::default()));
    scene.world_mut().insert(e, SphereCollider::default()).unwrap();
    scene.update(FRAME_MS).unwrap();
    assert!(physics(&scene).body(e).is_none());

    scene.world_mut().remove::<SphereCollider>(e);
    scene.update(FRAME_MS).unwrap();
    assert_eq!(*physics(&scene).body(e).unwrap().shape(), Shape::Cuboid { half_extents: Vec3::splat(0.5) });
}

#[test]
fn sphere_collider_builds_a_ball() {
    let mut scene = scene(weightless());
    let e = {
        let world = scene.world_mut();
        let e = world.spawn();
        world.insert(e, Position::default().with_scale(1.0, 4.0, 1.0)).unwrap();
        world.insert(e, SphereCollider::with_diameter(0.5)).unwrap();
        e
    };
    scene.update(FRAME_MS).unwrap();
    assert_eq!(*physics(&scene).body(e).unwrap().shape(), Shape::Ball { radius: 1.0 });
}

#[test]
fn adding_a_rigid_body_rebuilds_with_mass() {
    let mut scene = scene(weightless());
    let e = spawn(&mut scene, Position::default(), None, Some(BoxCollider::default()));
    scene.update(FRAME_MS).unwrap();
    assert!(physics(&scene).body(e).unwrap().is_static());

    scene.world_mut().insert(e, RigidBody::dynamic(2.0)).unwrap();
    let warnings = warnings_during(|| scene.update(FRAME_MS).unwrap());
    assert!(warnings.is_empty(), "{warnings}");
    assert_eq!(physics(&scene).body(e).unwrap().mass(), 2.0);
    assert_eq!(physics(&scene).physics_world().num_bodies(), 1);

    scene.world_mut().remove::<RigidBody>(e);
    scene.update(FRAME_MS).unwrap();
    assert!(physics(&scene).body(e).unwrap().is_static());
    assert_eq!(physics(&scene).physics_world().num_bodies(), 1);
}

#[test]
fn freeze_and_thaw_rebuild_the_world() {
    let mut scene = scene(PhysicsConfig::default());
    let e = spawn(&mut scene, Position::at(0.0, 3.0, 0.0), Some(RigidBody::dynamic(1.0)), Some(BoxCollider::default()));
    spawn(&mut scene, Position::at(6.0, 0.0, 0.0), None, Some(BoxCollider::default()));
    scene.update(FRAME_MS).unwrap();

    let frozen = scene.freeze();
    let record = frozen["physics"].as_object().unwrap();
    assert_eq!(record["broadphase"], "axis_sweep");
    assert!((record["gy"].as_f64().unwrap() + 9.81).abs() < 1e-5);

    let Value::Object(thawed) = json!({ "physics": { "gx": 0.0, "gy": 0.0, "gz": 0.0, "broadphase": "dbvt" } }) else {
        unreachable!()
    };
    scene.thaw(&thawed).unwrap();

    let physics = physics(&scene);
    assert_eq!(physics.physics_world().broadphase(), Broadphase::Dbvt);
    assert_eq!(physics.physics_world().gravity(), Vec3::ZERO);
    assert_eq!(physics.num_bodies(), 2);
    assert_eq!(physics.physics_world().num_bodies(), 2);
    let y = scene.world().get::<Position>(e).unwrap().y;
    assert_eq!(physics.body_transform(e).unwrap().translation.y, y);

    scene.update(FRAME_MS).unwrap();
    assert_eq!(scene.world().get::<Position>(e).unwrap().y, y);
    assert_eq!(scene.freeze()["physics"]["broadphase"], "dbvt");
}

#[test]
fn unreadable_snapshot_is_rejected() {
    let mut scene = scene(PhysicsConfig::default());
    let Value::Object(record) = json!({ "physics": { "broadphase": "octree" } }) else {
        unreachable!()
    };
    let err = scene.thaw(&record).unwrap_err();
    assert!(matches!(err, SystemError::Snapshot { ref system, .. } if system == "physics"));
    assert_eq!(physics(&scene).physics_world().broadphase(), Broadphase::AxisSweep);
}

#[test]
fn construction_needs_registered_components() {
    let mut world = World::new();
    world.register::<Position>().unwrap();
    let err = PhysicsSystem::new(&mut world, PhysicsConfig::default()).err().unwrap();
    assert!(matches!(err, SystemError::MissingComponent("RigidBody")));

    world.register::<RigidBody>().unwrap();
    let err = PhysicsSystem::new(&mut world, PhysicsConfig::default()).err().unwrap();
    assert!(matches!(err, SystemError::MissingComponent("BoxCollider")));

    world.register::<SphereCollider>().unwrap();
    assert!(PhysicsSystem::new(&mut world, PhysicsConfig::default()).is_ok());
}
