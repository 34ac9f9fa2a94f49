// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! These cover startup failures only. A command that fails to spawn or exits
//! non-zero is reported through [`crate::exec::CommandError`] and never
//! reaches this type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Message bus error: {0}")]
    BusError(String),
}

impl From<rumqttc::ClientError> for DispatchError {
    fn from(err: rumqttc::ClientError) -> Self {
        DispatchError::BusError(err.to_string())
    }
}

impl From<rumqttc::ConnectionError> for DispatchError {
    fn from(err: rumqttc::ConnectionError) -> Self {
        DispatchError::BusError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
