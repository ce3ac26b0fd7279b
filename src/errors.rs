// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::manager::{HandlerId, Priority};

#[derive(Error, Debug)]
pub enum EventMgrError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Handler {0} is not (or no longer) present in the arena")]
    StaleHandle(HandlerId),

    #[error("Event '{0}' cannot be re-bound while its handler is active")]
    RebindWhileActive(String),

    #[error("Priority {0} is reserved for armed handlers")]
    ReservedPriority(Priority),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, EventMgrError>;
