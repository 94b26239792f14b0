// SPDX-License-Identifier: MIT

//! Typed error handling for openeo-grass-rs
//!
//! Every fallible operation of the driver returns a [`DriverError`]. Each
//! variant has a stable machine-readable kind (see [`DriverError::kind`]) and
//! a human-readable message through `Display`.

use std::time::Duration;
use thiserror::Error;

/// Top-level error type for openeo-grass-rs
#[derive(Debug, Error)]
pub enum DriverError {
    /// A process id that is not present in the registry
    #[error("Process '{0}' is not supported")]
    UnknownProcess(String),

    /// A required process parameter was not supplied
    #[error("Parameter '{0}' is required")]
    MissingParameter(String),

    /// A process parameter does not match its declared schema
    #[error("Parameter '{name}' is invalid: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// A `from_node` reference points to a node that is not in the graph
    #[error("Node '{0}' is referenced but not defined in the process graph")]
    DanglingReference(String),

    /// The reference graph contains a cycle through the named node
    #[error("Cyclic process graph detected at node '{0}'")]
    CyclicGraph(String),

    /// Unknown job or process graph id
    #[error("'{0}' not found")]
    NotFound(String),

    /// Malformed job request or forbidden job transition
    #[error("Invalid job: {0}")]
    InvalidJob(String),

    /// The remote engine answered with a non-success status code
    #[error("Engine error {code}: {detail}")]
    Engine { code: u16, detail: String },

    /// A call to the remote engine did not complete in time
    #[error("Engine call '{operation}' timed out after {timeout:?}")]
    TransportTimeout { operation: String, timeout: Duration },

    /// The remote engine could not be reached
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Configuration errors (invalid env vars)
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DriverError>;

impl DriverError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing parameter error
    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingParameter(name.into())
    }

    /// Create an engine error
    pub fn engine(code: u16, detail: impl Into<String>) -> Self {
        Self::Engine {
            code,
            detail: detail.into(),
        }
    }

    /// Create a timeout error for an engine operation
    pub fn timeout(operation: impl Into<String>, timeout: Duration) -> Self {
        Self::TransportTimeout {
            operation: operation.into(),
            timeout,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Stable machine-readable kind of this error
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownProcess(_) => "UnknownProcess",
            Self::MissingParameter(_) => "MissingParameter",
            Self::InvalidParameter { .. } => "InvalidParameter",
            Self::DanglingReference(_) => "DanglingReference",
            Self::CyclicGraph(_) => "CyclicGraph",
            Self::NotFound(_) => "NotFound",
            Self::InvalidJob(_) => "InvalidJob",
            Self::Engine { .. } => "EngineError",
            Self::TransportTimeout { .. } => "TransportTimeout",
            Self::Transport(_) => "TransportError",
            Self::Config(_) => "ConfigError",
            Self::Json(_) | Self::Yaml(_) => "ParseError",
            Self::Io(_) => "IoError",
        }
    }

    /// True for errors raised while compiling a process graph
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownProcess(_)
                | Self::MissingParameter(_)
                | Self::InvalidParameter { .. }
                | Self::DanglingReference(_)
                | Self::CyclicGraph(_)
        )
    }
}
