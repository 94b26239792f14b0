// SPDX-License-Identifier: MIT

//! Processes - translation rules from graph nodes to engine instructions
//!
//! This module provides:
//! - `Process` - the trait every supported process implements
//! - `ProcessRegistry` - process id to implementation mapping
//! - `ProcessDescription` - static metadata served to clients
//! - the built-in translators and the engine-module pseudo-processes

mod description;
mod engine_module;
mod filter_temporal;
mod hants;
mod load_collection;
mod params;
mod registry;
mod save_result;
mod udf_reduce_time;

pub use description::{Parameter, ProcessDescription, ProcessExample, ReturnValue};
pub use engine_module::{module_processes, EngineModuleProcess};
pub use filter_temporal::FilterTemporal;
pub use hants::Hants;
pub use load_collection::LoadCollection;
pub use registry::ProcessRegistry;
pub use save_result::SaveResult;
pub use udf_reduce_time::UdfReduceTime;

use crate::actinia::Instruction;
use crate::error::{DriverError, Result};
use crate::openeo::graph::{Argument, ProcessNode};
use serde_json::Value;
use std::collections::BTreeMap;

/// A process the driver knows how to translate.
///
/// Translation is pure: it only looks at the node's arguments and the
/// resolved outputs of its parents, validates everything before emitting
/// anything, and derives output names deterministically.
pub trait Process: Send + Sync {
    /// Process id as used in `process_id` of graph nodes
    fn id(&self) -> &str;

    /// Static description served to clients
    fn describe(&self) -> ProcessDescription;

    /// Translate one node into output names and engine instructions
    fn translate(&self, ctx: &NodeContext<'_>) -> Result<Translation>;
}

/// A node together with the resolved outputs of the nodes it references
pub struct NodeContext<'a> {
    /// Name of the node within its graph
    pub name: &'a str,
    pub node: &'a ProcessNode,
    inputs: BTreeMap<String, Vec<String>>,
}

impl<'a> NodeContext<'a> {
    /// `inputs` maps argument names to the outputs of the referenced nodes
    pub fn new(name: &'a str, node: &'a ProcessNode, inputs: BTreeMap<String, Vec<String>>) -> Self {
        Self { name, node, inputs }
    }

    /// Outputs of the node(s) referenced by `argument`
    pub fn inputs(&self, argument: &str) -> Result<&[String]> {
        match self.node.argument(argument) {
            None => Err(DriverError::missing_parameter(argument)),
            Some(arg) if arg.references().is_empty() => Err(DriverError::invalid_parameter(
                argument,
                "expected a reference to another node ({\"from_node\": ...})",
            )),
            Some(arg) if !arg.is_reference_list() => Err(DriverError::invalid_parameter(
                argument,
                "node references cannot be mixed with literal values",
            )),
            Some(_) => Ok(self
                .inputs
                .get(argument)
                .map(Vec::as_slice)
                .unwrap_or(&[])),
        }
    }

    /// Literal value of `argument`; `None` when absent or `null`
    pub fn literal(&self, argument: &str) -> Result<Option<Value>> {
        match self.node.argument(argument) {
            None => Ok(None),
            Some(Argument::Literal(Value::Null)) => Ok(None),
            Some(arg) if !arg.references().is_empty() => Err(DriverError::invalid_parameter(
                argument,
                "expected a literal value, not a node reference",
            )),
            Some(arg) => Ok(Some(arg.to_value())),
        }
    }
}

/// Result of translating one node
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Translation {
    pub output_names: Vec<String>,
    pub instructions: Vec<Instruction>,
}

impl Translation {
    /// Record an output produced by `instruction`
    pub fn push(&mut self, output_name: String, instruction: Instruction) {
        self.output_names.push(output_name);
        self.instructions.push(instruction);
    }

    /// Forward an input unchanged
    pub fn pass_through(&mut self, input_name: &str) {
        self.output_names.push(input_name.to_string());
    }
}
