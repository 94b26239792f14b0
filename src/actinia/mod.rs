// SPDX-License-Identifier: MIT

//! Actinia module - the remote execution engine boundary
//!
//! This module provides:
//! - `Engine` - the capability set the driver consumes
//! - `ActiniaEngine` - HTTP implementation against the actinia REST API
//! - `ProcessChain` / `Instruction` - the plan format the engine executes
//! - `LayerName` - the engine's dataset naming convention

mod chain;
mod client;
mod layer;

pub use chain::{ImportDescr, InputBinding, Instruction, OutputBinding, ProcessChain};
pub use client::ActiniaEngine;
pub use layer::{DataType, LayerName};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier the engine assigns to a submitted process chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunHandle {
    pub resource_id: String,
}

/// Run state as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Accepted,
    Running,
    Finished,
    Error,
    Terminated,
}

impl RunStatus {
    /// Parse the engine's status string; unknown values count as accepted
    pub fn parse(value: &str) -> Self {
        match value {
            "running" => Self::Running,
            "finished" => Self::Finished,
            "error" => Self::Error,
            "terminated" => Self::Terminated,
            _ => Self::Accepted,
        }
    }
}

/// Snapshot of a run returned by [`Engine::submit`] and [`Engine::status`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub handle: RunHandle,
    pub status: RunStatus,
    #[serde(default)]
    pub results: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Capability set of the remote execution engine.
///
/// Every call either succeeds or fails with an error; a non-success status
/// from the engine is reported as `DriverError::Engine`, never as an empty
/// result.
#[async_trait]
pub trait Engine: Send + Sync {
    /// List the mapsets of a location
    async fn list_mapsets(&self, location: &str) -> Result<Vec<String>>;

    /// List the raster layers of a mapset
    async fn list_raster(&self, location: &str, mapset: &str) -> Result<Vec<String>>;

    /// List the vector layers of a mapset
    async fn list_vector(&self, location: &str, mapset: &str) -> Result<Vec<String>>;

    /// List the space-time raster datasets of a mapset
    async fn list_strds(&self, location: &str, mapset: &str) -> Result<Vec<String>>;

    /// Module catalogue in the engine's own description format
    async fn list_modules(&self) -> Result<Vec<Value>>;

    /// Submit a process chain for asynchronous execution in `location`
    async fn submit(&self, location: &str, chain: &ProcessChain) -> Result<RunReport>;

    /// Current state of a submitted run
    async fn status(&self, handle: &RunHandle) -> Result<RunReport>;

    /// Request termination of a submitted run
    async fn cancel(&self, handle: &RunHandle) -> Result<()>;
}
