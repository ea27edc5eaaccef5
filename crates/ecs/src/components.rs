//! The component kinds shared by the game systems.
//!
//! All of them are `#[repr(C)]` plain data so a column can be viewed as bytes
//! (see [`ComponentStore::as_bytes`](crate::ComponentStore::as_bytes)), and
//! serde-friendly so scene files can spell them out field by field. Flags are
//! stored as `u32` (non-zero means set).

use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::component::Component;
use crate::error::EcsError;
use crate::world::World;

/// Translation, rotation quaternion (x, y, z, w) and per-axis scale.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rx: f32,
    pub ry: f32,
    pub rz: f32,
    pub rw: f32,
    pub sx: f32,
    pub sy: f32,
    pub sz: f32,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            rx: 0.0,
            ry: 0.0,
            rz: 0.0,
            rw: 1.0,
            sx: 1.0,
            sy: 1.0,
            sz: 1.0,
        }
    }
}

impl Position {
    #[must_use]
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_scale(self, sx: f32, sy: f32, sz: f32) -> Self {
        Self { sx, sy, sz, ..self }
    }

    #[must_use]
    pub fn with_rotation(self, rotation: Quat) -> Self {
        let [rx, ry, rz, rw] = rotation.to_array();
        Self { rx, ry, rz, rw, ..self }
    }

    #[must_use]
    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Raw quaternion, not re-normalized.
    #[must_use]
    pub fn rotation(&self) -> Quat {
        Quat::from_xyzw(self.rx, self.ry, self.rz, self.rw)
    }

    #[must_use]
    pub fn scale(&self) -> Vec3 {
        Vec3::new(self.sx, self.sy, self.sz)
    }

    pub fn set_translation(&mut self, t: Vec3) {
        self.x = t.x;
        self.y = t.y;
        self.z = t.z;
    }

    pub fn set_rotation(&mut self, q: Quat) {
        [self.rx, self.ry, self.rz, self.rw] = q.to_array();
    }
}

impl Component for Position {
    const NAME: &'static str = "Position";
}

/// Mass and initial inertia seed. `kinematic != 0` makes the body a ghost
/// that follows its [`Position`] instead of being simulated.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[serde(default)]
pub struct RigidBody {
    pub mass: f32,
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
    pub kinematic: u32,
}

impl RigidBody {
    #[must_use]
    pub fn dynamic(mass: f32) -> Self {
        Self {
            mass,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn kinematic() -> Self {
        Self {
            kinematic: 1,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn inertia_seed(&self) -> Vec3 {
        Vec3::new(self.vx, self.vy, self.vz)
    }

    #[must_use]
    pub fn is_kinematic(&self) -> bool {
        self.kinematic != 0
    }
}

impl Component for RigidBody {
    const NAME: &'static str = "RigidBody";
}

/// Box extents relative to the entity scale, plus an origin offset.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxCollider {
    pub sx: f32,
    pub sy: f32,
    pub sz: f32,
    pub ox: f32,
    pub oy: f32,
    pub oz: f32,
    pub trigger: u32,
    pub group: u32,
    pub mask: u32,
}

impl Default for BoxCollider {
    fn default() -> Self {
        Self {
            sx: 1.0,
            sy: 1.0,
            sz: 1.0,
            ox: 0.0,
            oy: 0.0,
            oz: 0.0,
            trigger: 0,
            group: 1,
            mask: u32::MAX,
        }
    }
}

impl BoxCollider {
    #[must_use]
    pub fn sized(sx: f32, sy: f32, sz: f32) -> Self {
        Self {
            sx,
            sy,
            sz,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        Vec3::new(self.sx, self.sy, self.sz)
    }

    #[must_use]
    pub fn offset(&self) -> Vec3 {
        Vec3::new(self.ox, self.oy, self.oz)
    }
}

impl Component for BoxCollider {
    const NAME: &'static str = "BoxCollider";
}

/// Sphere of `diameter` (relative to the largest entity scale axis).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereCollider {
    pub diameter: f32,
    pub ox: f32,
    pub oy: f32,
    pub oz: f32,
    pub trigger: u32,
    pub group: u32,
    pub mask: u32,
}

impl Default for SphereCollider {
    fn default() -> Self {
        Self {
            diameter: 1.0,
            ox: 0.0,
            oy: 0.0,
            oz: 0.0,
            trigger: 0,
            group: 1,
            mask: u32::MAX,
        }
    }
}

impl SphereCollider {
    #[must_use]
    pub fn with_diameter(diameter: f32) -> Self {
        Self {
            diameter,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn offset(&self) -> Vec3 {
        Vec3::new(self.ox, self.oy, self.oz)
    }
}

impl Component for SphereCollider {
    const NAME: &'static str = "SphereCollider";
}

/// Register every component kind above.
///
/// # Errors
/// Propagates [`EcsError::TooManyComponents`].
pub fn register_all(world: &mut World) -> Result<(), EcsError> {
    world.register::<Position>()?;
    world.register::<RigidBody>()?;
    world.register::<BoxCollider>()?;
    world.register::<SphereCollider>()?;
    Ok(())
}
