//! Small value types shared by every stage of the pipeline.

use std::fmt;

/// Stable handle to a body owned by a [`PhysicsWorld`](crate::PhysicsWorld).
///
/// Handles are recycled after [`PhysicsWorld::remove_body`](crate::PhysicsWorld::remove_body),
/// so callers must drop theirs when the body goes away.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u32);

impl BodyHandle {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a body's transform is driven.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BodyKind {
    /// Integrated by the solver. Mass zero makes it static.
    Rigid,
    /// Positioned from outside; only reports overlaps.
    Ghost,
}

/// Per-body collision flags.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CollisionFlags(u32);

impl CollisionFlags {
    pub const NONE: Self = Self(0);
    /// Contacts are generated and reported but never solved.
    pub const NO_CONTACT_RESPONSE: Self = Self(1 << 2);

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Group/mask filtering. Two bodies collide only when each one's group is
/// accepted by the other's mask.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CollisionFilter {
    pub group: u32,
    pub mask: u32,
}

impl CollisionFilter {
    pub const ALL: Self = Self {
        group: 1,
        mask: u32::MAX,
    };

    #[must_use]
    pub const fn accepts(self, other: Self) -> bool {
        self.group & other.mask != 0 && other.group & self.mask != 0
    }
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self::ALL
    }
}
