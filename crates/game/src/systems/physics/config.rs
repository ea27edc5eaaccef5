//! Physics system configuration and its persisted snapshot.

use glam::Vec3;
use physics::{Broadphase, WorldConfig};
use serde::{Deserialize, Serialize};

use crate::system::SystemRecord;

/// Per-axis motion multipliers applied to every dynamic body.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisLocks {
    pub linear: Vec3,
    pub angular: Vec3,
}

impl AxisLocks {
    /// Translate in x/y, rotate about z.
    pub const PLANAR: Self = Self {
        linear: Vec3::new(1.0, 1.0, 0.0),
        angular: Vec3::new(0.0, 0.0, 1.0),
    };
    pub const FREE: Self = Self {
        linear: Vec3::ONE,
        angular: Vec3::ONE,
    };
}

impl Default for AxisLocks {
    fn default() -> Self {
        Self::PLANAR
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: Vec3,
    pub broadphase: Broadphase,
    pub axis_locks: AxisLocks,
    pub substeps: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        let world = WorldConfig::default();
        Self {
            gravity: world.gravity,
            broadphase: world.broadphase,
            axis_locks: AxisLocks::PLANAR,
            substeps: world.substeps,
        }
    }
}

impl PhysicsConfig {
    #[must_use]
    pub fn world_config(&self) -> WorldConfig {
        WorldConfig {
            gravity: self.gravity,
            broadphase: self.broadphase,
            substeps: self.substeps,
            ..WorldConfig::default()
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> PhysicsSnapshot {
        PhysicsSnapshot {
            gx: self.gravity.x,
            gy: self.gravity.y,
            gz: self.gravity.z,
            broadphase: self.broadphase,
        }
    }

    #[must_use]
    pub fn with_snapshot(self, snapshot: &PhysicsSnapshot) -> Self {
        Self {
            gravity: Vec3::new(snapshot.gx, snapshot.gy, snapshot.gz),
            broadphase: snapshot.broadphase,
            ..self
        }
    }
}

/// What a frozen scene remembers about physics. Missing fields read as zero
/// gravity and the default broadphase.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSnapshot {
    pub gx: f32,
    pub gy: f32,
    pub gz: f32,
    pub broadphase: Broadphase,
}

impl PhysicsSnapshot {
    #[must_use]
    pub fn to_record(&self) -> SystemRecord {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => SystemRecord::new(),
        }
    }

    /// # Errors
    /// If a field has the wrong type or the broadphase name is unknown.
    pub fn from_record(record: &SystemRecord) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(record.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_flat() {
        let snapshot = PhysicsSnapshot {
            gx: 1.0,
            gy: -9.0,
            gz: 0.5,
            broadphase: Broadphase::Dbvt,
        };
        let record = snapshot.to_record();
        assert_eq!(record.len(), 4);
        assert_eq!(record["broadphase"], "dbvt");
        assert_eq!(PhysicsSnapshot::from_record(&record).unwrap(), snapshot);
    }

    #[test]
    fn empty_record_thaws_to_zero_gravity() {
        let snapshot = PhysicsSnapshot::from_record(&SystemRecord::new()).unwrap();
        assert_eq!(snapshot, PhysicsSnapshot::default());
        let config = PhysicsConfig::default().with_snapshot(&snapshot);
        assert_eq!(config.gravity, Vec3::ZERO);
        assert_eq!(config.axis_locks, AxisLocks::PLANAR);
    }

    #[test]
    fn bad_broadphase_is_rejected() {
        let mut record = SystemRecord::new();
        record.insert("broadphase".into(), "grid".into());
        assert!(PhysicsSnapshot::from_record(&record).is_err());
    }
}
