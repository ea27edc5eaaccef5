//! Component kinds and the bitmask used to match entities against queries.

use std::fmt;

/// Upper bound on registered component kinds; one bit each in [`ComponentMask`].
pub const MAX_COMPONENTS: usize = 64;

/// Plain-data component stored column-wise in a [`ComponentStore`](crate::ComponentStore).
pub trait Component: Copy + Send + Sync + 'static {
    /// Human-readable name used in errors and logs.
    const NAME: &'static str;
}

/// Registration index of a component kind within one [`World`](crate::World).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) u8);

impl ComponentId {
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct ComponentMask(u64);

impl ComponentMask {
    pub const EMPTY: Self = Self(0);

    #[must_use]
    pub fn from_ids(ids: &[ComponentId]) -> Self {
        ids.iter().fold(Self::EMPTY, |mask, id| mask.with(*id))
    }

    #[must_use]
    pub fn with(self, id: ComponentId) -> Self {
        Self(self.0 | 1 << id.0)
    }

    #[must_use]
    pub fn without(self, id: ComponentId) -> Self {
        Self(self.0 & !(1 << id.0))
    }

    #[must_use]
    pub fn has(self, id: ComponentId) -> bool {
        self.0 & (1 << id.0) != 0
    }

    /// True when every bit of `required` is set here.
    #[must_use]
    pub fn contains(self, required: Self) -> bool {
        self.0 & required.0 == required.0
    }

    pub fn ids(self) -> impl Iterator<Item = ComponentId> {
        (0..MAX_COMPONENTS as u8).filter(move |i| self.0 & (1 << i) != 0).map(ComponentId)
    }
}

impl fmt::Debug for ComponentMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentMask({:#066b})", self.0)
    }
}
