//! A world plus the ordered systems that run over it each frame.

use ecs::World;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::SystemError;
use crate::system::{System, SystemRecord};

pub struct Scene {
    world: World,
    systems: Vec<Box<dyn System>>,
    frame: u64,
}

impl Scene {
    #[must_use]
    pub fn new(world: World) -> Self {
        Self {
            world,
            systems: Vec::new(),
            frame: 0,
        }
    }

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Systems run in the order they were added.
    pub fn add_system(&mut self, system: Box<dyn System>) {
        debug!(system = system.name(), "adding system");
        self.systems.push(system);
    }

    #[must_use]
    pub fn system<T: System>(&self) -> Option<&T> {
        self.systems.iter().find_map(|s| s.as_any().downcast_ref())
    }

    pub fn system_mut<T: System>(&mut self) -> Option<&mut T> {
        self.systems.iter_mut().find_map(|s| s.as_any_mut().downcast_mut())
    }

    /// Split borrow so a caller can configure a system against the world.
    pub fn world_and_system_mut<T: System>(&mut self) -> (&mut World, Option<&mut T>) {
        let system = self.systems.iter_mut().find_map(|s| s.as_any_mut().downcast_mut());
        (&mut self.world, system)
    }

    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Start a new tick, then run every system once.
    ///
    /// # Errors
    /// The first system error aborts the frame.
    pub fn update(&mut self, delta_ms: f32) -> Result<(), SystemError> {
        self.world.advance_tick();
        for system in &mut self.systems {
            system.update(&mut self.world, delta_ms)?;
        }
        self.frame += 1;
        Ok(())
    }

    /// Every system's record, keyed by system name.
    #[must_use]
    pub fn freeze(&self) -> SystemRecord {
        self.systems
            .iter()
            .map(|s| (s.name().to_owned(), Value::Object(s.freeze())))
            .collect()
    }

    /// Hand each system the record stored under its name. Systems without a
    /// record keep their current configuration.
    ///
    /// # Errors
    /// The first system that rejects its record.
    pub fn thaw(&mut self, record: &SystemRecord) -> Result<(), SystemError> {
        for system in &mut self.systems {
            if let Some(Value::Object(data)) = record.get(system.name()) {
                info!(system = system.name(), "thawing system");
                system.thaw(&mut self.world, data)?;
            }
        }
        Ok(())
    }
}
