use thiserror::Error;

use crate::entity::Entity;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    #[error("component `{0}` is not registered")]
    UnregisteredComponent(&'static str),
    #[error("entity {0} is not alive")]
    DeadEntity(Entity),
    #[error("cannot register `{0}`: at most {max} component kinds", max = crate::component::MAX_COMPONENTS)]
    TooManyComponents(&'static str),
}
