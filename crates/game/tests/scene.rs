use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use ecs::World;
use game::{Scene, System, SystemError, SystemRecord};
use serde_json::Value;

/// Records the order it runs in and persists a frame counter.
struct Counter {
    name: &'static str,
    runs: u32,
    log: Rc<RefCell<Vec<(&'static str, u64)>>>,
}

impl System for Counter {
    fn name(&self) -> &str {
        self.name
    }

    fn update(&mut self, world: &mut World, _delta_ms: f32) -> Result<(), SystemError> {
        self.runs += 1;
        self.log.borrow_mut().push((self.name, world.tick()));
        Ok(())
    }

    fn freeze(&self) -> SystemRecord {
        let mut record = SystemRecord::new();
        record.insert("runs".into(), self.runs.into());
        record
    }

    fn thaw(&mut self, _world: &mut World, record: &SystemRecord) -> Result<(), SystemError> {
        if let Some(runs) = record.get("runs").and_then(Value::as_u64) {
            self.runs = u32::try_from(runs).unwrap_or(u32::MAX);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn counters() -> (Scene, Rc<RefCell<Vec<(&'static str, u64)>>>) {
    let log = Rc::default();
    let mut scene = Scene::new(World::new());
    for name in ["input", "logic"] {
        scene.add_system(Box::new(Counter {
            name,
            runs: 0,
            log: Rc::clone(&log),
        }));
    }
    (scene, log)
}

#[test]
fn systems_run_in_order_on_a_fresh_tick() {
    let (mut scene, log) = counters();
    scene.update(16.0).unwrap();
    scene.update(16.0).unwrap();

    assert_eq!(scene.frame(), 2);
    assert_eq!(*log.borrow(), vec![("input", 1), ("logic", 1), ("input", 2), ("logic", 2)]);
}

#[test]
fn freeze_keys_records_by_system_name() {
    let (mut scene, _) = counters();
    scene.update(16.0).unwrap();
    let frozen = scene.freeze();
    assert_eq!(frozen.len(), 2);
    assert_eq!(frozen["input"]["runs"], 1);

    let mut record = SystemRecord::new();
    record.insert("logic".into(), serde_json::json!({ "runs": 40 }));
    scene.thaw(&record).unwrap();

    assert_eq!(scene.system::<Counter>().unwrap().runs, 1);
    assert_eq!(scene.freeze()["logic"]["runs"], 40);
}
