//! Error types for the simulation core.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("particle capacity reached ({max})")]
    CapacityExceeded { max: usize },

    #[error("no particle is selected")]
    NoSelection,

    #[error("speed index {0} is out of range")]
    InvalidSpeedIndex(usize),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failures inside the validation scenario. These never leave the orchestrator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("validation initial conditions were not recorded")]
    MissingInitialState,

    #[error("validation particle is missing")]
    NoParticle,
}

pub type Result<T> = std::result::Result<T, SimError>;
