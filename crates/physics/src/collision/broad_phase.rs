//! Broad-phase pair finding.
//!
//! Two interchangeable algorithms sit behind [`BroadPhase`]: an incremental
//! sweep-and-prune along the x axis ([`AxisSweep`]) and a dynamic bounding
//! volume tree ([`DynamicTree`]). Both report each overlapping pair once,
//! lower handle first, in ascending order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::dynamic_tree::DynamicTree;
use crate::error::PhysicsError;
use crate::shapes::Aabb;
use crate::types::BodyHandle;

pub trait BroadPhase: Send + fmt::Debug {
    fn insert(&mut self, handle: BodyHandle, aabb: Aabb);
    fn remove(&mut self, handle: BodyHandle);
    fn update(&mut self, handle: BodyHandle, aabb: Aabb);
    /// Candidate pairs `(a, b)` with `a < b`, sorted.
    fn overlapping_pairs(&self) -> Vec<(BodyHandle, BodyHandle)>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Which broad-phase algorithm a world uses.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Broadphase {
    #[default]
    AxisSweep,
    Dbvt,
}

impl fmt::Display for Broadphase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AxisSweep => f.write_str("axis-sweep"),
            Self::Dbvt => f.write_str("dbvt"),
        }
    }
}

impl FromStr for Broadphase {
    type Err = PhysicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "axis-sweep" | "axis_sweep" | "axissweep" | "sap" => Ok(Self::AxisSweep),
            "dbvt" | "dynamic-tree" | "dynamic_tree" => Ok(Self::Dbvt),
            _ => Err(PhysicsError::UnknownBroadphase(s.to_owned())),
        }
    }
}

#[must_use]
pub fn create_broad_phase(kind: Broadphase) -> Box<dyn BroadPhase> {
    match kind {
        Broadphase::AxisSweep => Box::new(AxisSweep::default()),
        Broadphase::Dbvt => Box::new(DynamicTree::default()),
    }
}

/// Sweep-and-prune on the x axis.
///
/// Entries are kept sorted by `min.x` with an insertion sort on update, which
/// is close to linear when bodies move a little each step.
#[derive(Debug, Default)]
pub struct AxisSweep {
    entries: Vec<(BodyHandle, Aabb)>,
}

impl AxisSweep {
    fn position(&self, handle: BodyHandle) -> Option<usize> {
        self.entries.iter().position(|(h, _)| *h == handle)
    }

    fn resort(&mut self) {
        for i in 1..self.entries.len() {
            let mut j = i;
            while j > 0 && self.entries[j - 1].1.min.x > self.entries[j].1.min.x {
                self.entries.swap(j - 1, j);
                j -= 1;
            }
        }
    }
}

impl BroadPhase for AxisSweep {
    fn insert(&mut self, handle: BodyHandle, aabb: Aabb) {
        if let Some(i) = self.position(handle) {
            self.entries[i].1 = aabb;
        } else {
            self.entries.push((handle, aabb));
        }
        self.resort();
    }

    fn remove(&mut self, handle: BodyHandle) {
        if let Some(i) = self.position(handle) {
            self.entries.remove(i);
        }
    }

    fn update(&mut self, handle: BodyHandle, aabb: Aabb) {
        self.insert(handle, aabb);
    }

    fn overlapping_pairs(&self) -> Vec<(BodyHandle, BodyHandle)> {
        let mut pairs = Vec::new();
        for (i, (ha, a)) in self.entries.iter().enumerate() {
            for (hb, b) in &self.entries[i + 1..] {
                if b.min.x > a.max.x {
                    break;
                }
                if a.overlaps(b) {
                    pairs.push(if ha < hb { (*ha, *hb) } else { (*hb, *ha) });
                }
            }
        }
        pairs.sort_unstable();
        pairs
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
