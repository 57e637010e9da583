use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActuatorError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("bus write failed: {0}")]
    Io(String),
    #[error("power control failed: {0}")]
    Power(String),
    #[error("step table allocation failed")]
    Allocation,
    #[error("actuator not ready: step table not built")]
    NotReady,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("region table is empty")]
    EmptyRegions,
    #[error("region {index} does not increase step_bound")]
    UnorderedRegions { index: usize },
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
