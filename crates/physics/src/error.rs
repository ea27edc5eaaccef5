use thiserror::Error;

use crate::types::BodyHandle;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("invalid shape: {0}")]
    InvalidShape(String),
    #[error("no body registered for handle {0}")]
    UnknownBody(BodyHandle),
    #[error("unknown broadphase `{0}` (expected `axis-sweep` or `dbvt`)")]
    UnknownBroadphase(String),
}
