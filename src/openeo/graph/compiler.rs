// SPDX-License-Identifier: MIT

//! Graph compiler - resolves node dependencies and emits the execution plan
//!
//! Walks the reference graph from the result node in post-order with an
//! explicit stack, so deep graphs cannot overflow the call stack.

use super::types::ProcessGraph;
use crate::actinia::{Instruction, LayerName, ProcessChain};
use crate::error::{DriverError, Result};
use crate::openeo::processes::{NodeContext, ProcessRegistry};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Output of a compilation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compilation {
    /// Outputs of the compiled node
    pub output_names: Vec<String>,
    /// Instructions in dependency order
    pub instructions: Vec<Instruction>,
    /// Outputs of every node visited along the way
    pub node_outputs: BTreeMap<String, Vec<String>>,
}

impl Compilation {
    /// First engine location named by a visited node's outputs
    pub fn location(&self) -> Option<String> {
        self.node_outputs
            .values()
            .flatten()
            .find_map(|name| LayerName::parse(name).location)
    }

    pub fn into_chain(self) -> ProcessChain {
        ProcessChain::new(self.instructions)
    }
}

enum Frame<'g> {
    /// Visit the node's parents
    Enter(&'g str),
    /// All parents are compiled; translate the node itself
    Exit(&'g str),
}

/// Compiles process graphs against a registry
pub struct Compiler<'r> {
    registry: &'r ProcessRegistry,
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r ProcessRegistry) -> Self {
        Self { registry }
    }

    /// Compile the graph's result node
    pub fn compile(&self, graph: &ProcessGraph) -> Result<Compilation> {
        let result = graph.result_node()?;
        self.compile_node(graph, result)
    }

    /// Compile `node_name` and everything it depends on
    pub fn compile_node(&self, graph: &ProcessGraph, node_name: &str) -> Result<Compilation> {
        let (root, _) = graph
            .process_graph
            .get_key_value(node_name)
            .ok_or_else(|| DriverError::DanglingReference(node_name.to_string()))?;

        let mut stack = vec![Frame::Enter(root.as_str())];
        let mut on_path: HashSet<&str> = HashSet::new();
        let mut compiled: HashMap<&str, Vec<String>> = HashMap::new();
        let mut instructions = Vec::new();

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(name) => {
                    if compiled.contains_key(name) {
                        continue;
                    }
                    if !on_path.insert(name) {
                        return Err(DriverError::CyclicGraph(name.to_string()));
                    }

                    let node = graph
                        .node(name)
                        .ok_or_else(|| DriverError::DanglingReference(name.to_string()))?;
                    if !self.registry.contains(&node.process_id) {
                        return Err(DriverError::UnknownProcess(node.process_id.clone()));
                    }

                    stack.push(Frame::Exit(name));

                    // Reversed so parents are compiled in argument order
                    for parent in node.parents().into_iter().rev() {
                        if graph.node(parent).is_none() {
                            return Err(DriverError::DanglingReference(parent.to_string()));
                        }
                        if on_path.contains(parent) {
                            return Err(DriverError::CyclicGraph(parent.to_string()));
                        }
                        if !compiled.contains_key(parent) {
                            stack.push(Frame::Enter(parent));
                        }
                    }
                }
                Frame::Exit(name) => {
                    let node = graph
                        .node(name)
                        .ok_or_else(|| DriverError::DanglingReference(name.to_string()))?;

                    let mut inputs = BTreeMap::new();
                    for (argument_name, argument) in &node.arguments {
                        let references = argument.references();
                        if references.is_empty() {
                            continue;
                        }
                        let outputs: Vec<String> = references
                            .iter()
                            .filter_map(|r| compiled.get(r))
                            .flatten()
                            .cloned()
                            .collect();
                        inputs.insert(argument_name.clone(), outputs);
                    }

                    let process = self.registry.get(&node.process_id)?;
                    let translation = process.translate(&NodeContext::new(name, node, inputs))?;

                    log::debug!(
                        "Compiled node '{}' ({}): {} output(s), {} instruction(s)",
                        name,
                        node.process_id,
                        translation.output_names.len(),
                        translation.instructions.len()
                    );

                    instructions.extend(translation.instructions);
                    compiled.insert(name, translation.output_names);
                    on_path.remove(name);
                }
            }
        }

        let output_names = compiled.get(root.as_str()).cloned().unwrap_or_default();
        Ok(Compilation {
            output_names,
            instructions,
            node_outputs: compiled
                .into_iter()
                .map(|(name, outputs)| (name.to_string(), outputs))
                .collect(),
        })
    }
}
