//! # Collision Detection
//!
//! Broad phase (candidate pairs from bounding boxes), narrow phase (contact
//! points per shape pair) and the persistent manifolds that carry contacts
//! from one step to the next.

mod box_box;
mod broad_phase;
mod dispatcher;
mod dynamic_tree;
mod manifold;
mod sphere_box;
mod sphere_sphere;

pub use box_box::detect_box_box;
pub use broad_phase::{create_broad_phase, AxisSweep, BroadPhase, Broadphase};
pub use dispatcher::collide;
pub use dynamic_tree::DynamicTree;
pub use manifold::{ContactManifold, ContactPoint, MAX_CONTACT_POINTS};
pub use sphere_box::detect_sphere_box;
pub use sphere_sphere::detect_sphere_sphere;
