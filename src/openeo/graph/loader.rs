//! Graph loader - process graph file loading and parsing
//!
//! Accepts JSON or YAML, either a bare process graph or a job document that
//! wraps it under a `process` key.

use super::types::ProcessGraph;
use crate::error::Result;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Loads process graphs from files
pub struct GraphLoader;

impl GraphLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a process graph from a `.json`, `.yaml` or `.yml` file
    pub fn load_graph<P: AsRef<Path>>(&self, path: P) -> Result<ProcessGraph> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::parse_yaml(&content),
            _ => Self::parse_json(&content),
        }
    }

    /// Parse a process graph from a JSON string
    pub fn parse_json(content: &str) -> Result<ProcessGraph> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(value)
    }

    /// Parse a process graph from a YAML string
    pub fn parse_yaml(content: &str) -> Result<ProcessGraph> {
        let value: Value = serde_yaml::from_str(content)?;
        Self::from_value(value)
    }

    fn from_value(mut value: Value) -> Result<ProcessGraph> {
        if let Some(process) = value.get_mut("process") {
            value = process.take();
        }
        Ok(serde_json::from_value(value)?)
    }
}

impl Default for GraphLoader {
    fn default() -> Self {
        Self::new()
    }
}
