//! The contract every frame-driven system implements.

use std::any::Any;

use ecs::World;

use crate::error::SystemError;

/// Flat key-value record a system persists its configuration into.
pub type SystemRecord = serde_json::Map<String, serde_json::Value>;

pub trait System: Any {
    /// Unique within a [`Scene`](crate::Scene); keys the system's frozen record.
    fn name(&self) -> &str;

    /// Run one frame. `delta_ms` is the wall time since the previous frame.
    ///
    /// # Errors
    /// Only for failures that should stop the frame loop. Per-entity problems
    /// are logged and skipped instead.
    fn update(&mut self, world: &mut World, delta_ms: f32) -> Result<(), SystemError>;

    fn freeze(&self) -> SystemRecord {
        SystemRecord::new()
    }

    /// # Errors
    /// If the record cannot be interpreted by this system.
    fn thaw(&mut self, _world: &mut World, _record: &SystemRecord) -> Result<(), SystemError> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
