//! Queries: component-mask filters with per-tick entered/exited deltas.

use std::collections::BTreeSet;

use crate::component::ComponentMask;
use crate::entity::Entity;

/// Index of a query registered with [`World::query`](crate::World::query).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryHandle(pub(crate) usize);

/// Membership snapshot plus the deltas computed from it.
///
/// The snapshot advances at most once per tick: the first call to
/// `entered`/`exited` in a tick computes both deltas and later calls in the
/// same tick return the cached lists.
#[derive(Debug)]
pub(crate) struct QueryState {
    pub mask: ComponentMask,
    snapshot: BTreeSet<Entity>,
    delta_tick: Option<u64>,
    entered: Vec<Entity>,
    exited: Vec<Entity>,
}

impl QueryState {
    pub fn new(mask: ComponentMask) -> Self {
        Self {
            mask,
            snapshot: BTreeSet::new(),
            delta_tick: None,
            entered: Vec::new(),
            exited: Vec::new(),
        }
    }

    pub fn is_fresh(&self, tick: u64) -> bool {
        self.delta_tick == Some(tick)
    }

    pub fn advance(&mut self, current: BTreeSet<Entity>, tick: u64) {
        self.entered = current.difference(&self.snapshot).copied().collect();
        self.exited = self.snapshot.difference(&current).copied().collect();
        self.snapshot = current;
        self.delta_tick = Some(tick);
    }

    pub fn entered(&self) -> &[Entity] {
        &self.entered
    }

    pub fn exited(&self) -> &[Entity] {
        &self.exited
    }
}
