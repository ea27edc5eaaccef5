use ecs::EcsError;
use physics::PhysicsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SystemError {
    #[error("required component `{0}` is not registered with the world")]
    MissingComponent(&'static str),
    #[error("invalid snapshot for system `{system}`: {source}")]
    Snapshot {
        system: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Ecs(#[from] EcsError),
    #[error(transparent)]
    Physics(#[from] PhysicsError),
}
