//! Process graph type definitions
//!
//! This module defines the client-facing graph model: named nodes whose
//! arguments are literals or `{"from_node": ...}` references to other nodes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{DriverError, Result};

/// A process graph with its optional metadata
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct ProcessGraph {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Nodes keyed by their name
    #[serde(default)]
    pub process_graph: BTreeMap<String, ProcessNode>,
}

impl ProcessGraph {
    /// Create a graph from `(name, node)` pairs
    pub fn from_nodes<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = (S, ProcessNode)>,
        S: Into<String>,
    {
        Self {
            process_graph: nodes.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..Default::default()
        }
    }

    pub fn node(&self, name: &str) -> Option<&ProcessNode> {
        self.process_graph.get(name)
    }

    /// Name of the node whose outputs are the graph's outputs.
    ///
    /// This is the node flagged `"result": true`; a graph with a single node
    /// may omit the flag.
    pub fn result_node(&self) -> Result<&str> {
        let flagged: Vec<&str> = self
            .process_graph
            .iter()
            .filter(|(_, node)| node.result)
            .map(|(name, _)| name.as_str())
            .collect();

        match flagged.as_slice() {
            [name] => Ok(*name),
            [] if self.process_graph.len() == 1 => Ok(self
                .process_graph
                .keys()
                .next()
                .map(String::as_str)
                .unwrap_or_default()),
            [] => Err(DriverError::InvalidJob(
                "The process graph has no result node".to_string(),
            )),
            many => Err(DriverError::InvalidJob(format!(
                "The process graph has more than one result node: {}",
                many.join(", ")
            ))),
        }
    }
}

/// A node in the process graph
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ProcessNode {
    /// Id of the process in the registry
    pub process_id: String,
    #[serde(default)]
    pub arguments: BTreeMap<String, Argument>,
    /// Marks the result node of the graph
    #[serde(default, skip_serializing_if = "is_false")]
    pub result: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ProcessNode {
    pub fn new(process_id: impl Into<String>) -> Self {
        Self {
            process_id: process_id.into(),
            arguments: BTreeMap::new(),
            result: false,
            description: None,
        }
    }

    pub fn with_argument(mut self, name: &str, argument: impl Into<Argument>) -> Self {
        self.arguments.insert(name.to_string(), argument.into());
        self
    }

    pub fn as_result(mut self) -> Self {
        self.result = true;
        self
    }

    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.get(name)
    }

    /// Names of the nodes this node consumes, without duplicates, in argument order
    pub fn parents(&self) -> Vec<&str> {
        let mut parents: Vec<&str> = Vec::new();
        for argument in self.arguments.values() {
            for name in argument.references() {
                if !parents.contains(&name) {
                    parents.push(name);
                }
            }
        }
        parents
    }
}

/// Reference to the output of another node
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NodeReference {
    pub from_node: String,
}

/// Value of a node argument
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Argument {
    /// `{"from_node": "<name>"}`
    Reference(NodeReference),
    /// Array that may contain references
    Array(Vec<Argument>),
    /// Object that may contain references
    Object(BTreeMap<String, Argument>),
    /// Any other JSON value
    Literal(Value),
}

impl Argument {
    /// Create a reference to another node
    pub fn from_node(name: &str) -> Self {
        Self::Reference(NodeReference {
            from_node: name.to_string(),
        })
    }

    /// The referenced node when this argument is a plain reference
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Self::Reference(r) => Some(&r.from_node),
            _ => None,
        }
    }

    /// True for a reference or a non-empty array made only of references
    pub fn is_reference_list(&self) -> bool {
        match self {
            Self::Reference(_) => true,
            Self::Array(items) => {
                !items.is_empty() && items.iter().all(|i| matches!(i, Self::Reference(_)))
            }
            _ => false,
        }
    }

    /// All referenced node names in document order
    pub fn references(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_references(&mut names);
        names
    }

    fn collect_references<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::Reference(r) => names.push(&r.from_node),
            Self::Array(items) => items.iter().for_each(|i| i.collect_references(names)),
            Self::Object(map) => map.values().for_each(|v| v.collect_references(names)),
            Self::Literal(_) => {}
        }
    }

    /// Convert back to plain JSON
    pub fn to_value(&self) -> Value {
        match self {
            Self::Reference(r) => {
                let mut map = Map::new();
                map.insert("from_node".to_string(), Value::String(r.from_node.clone()));
                Value::Object(map)
            }
            Self::Array(items) => Value::Array(items.iter().map(Argument::to_value).collect()),
            Self::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect(),
            ),
            Self::Literal(v) => v.clone(),
        }
    }
}

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        // Re-run the untagged classification so nested references are found
        serde_json::from_value(value.clone()).unwrap_or(Self::Literal(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_argument_deserialize_reference() {
        let arg: Argument = serde_json::from_value(json!({"from_node": "load"})).unwrap();
        assert_eq!(arg.as_reference(), Some("load"));
    }

    #[test]
    fn test_argument_deserialize_literals() {
        let arg: Argument = serde_json::from_value(json!(6)).unwrap();
        assert_eq!(arg, Argument::Literal(json!(6)));

        let arg: Argument = serde_json::from_value(json!(["2015-01-01", null])).unwrap();
        assert_eq!(arg.to_value(), json!(["2015-01-01", null]));
        assert!(arg.references().is_empty());
    }

    #[test]
    fn test_reference_with_extra_keys_is_object() {
        let arg: Argument =
            serde_json::from_value(json!({"from_node": "a", "other": 1})).unwrap();
        assert!(arg.as_reference().is_none());
        assert_eq!(arg.references(), vec!["a"]);
    }

    #[test]
    fn test_nested_references_in_document_order() {
        let arg: Argument = serde_json::from_value(json!([
            {"from_node": "b"},
            {"inner": {"from_node": "a"}}
        ]))
        .unwrap();
        assert_eq!(arg.references(), vec!["b", "a"]);
    }

    #[test]
    fn test_reference_list() {
        assert!(Argument::from_node("a").is_reference_list());
        let both = Argument::from(json!([{"from_node": "a"}, {"from_node": "b"}]));
        assert!(both.is_reference_list());
        assert!(!Argument::from(json!([{"from_node": "a"}, "x"])).is_reference_list());
        assert!(!Argument::from(json!({"inner": {"from_node": "a"}})).is_reference_list());
        assert!(!Argument::from(json!([])).is_reference_list());
    }

    #[test]
    fn test_argument_from_value() {
        let arg = Argument::from(json!({"from_node": "x"}));
        assert_eq!(arg.as_reference(), Some("x"));
        assert_eq!(arg.to_value(), json!({"from_node": "x"}));
    }

    #[test]
    fn test_node_parents_deduplicated() {
        let node = ProcessNode::new("merge")
            .with_argument("a", Argument::from_node("load"))
            .with_argument("b", Argument::from_node("load"))
            .with_argument("c", Argument::from_node("other"));
        assert_eq!(node.parents(), vec!["load", "other"]);
    }

    #[test]
    fn test_deserialize_graph() {
        let graph: ProcessGraph = serde_json::from_value(json!({
            "process_graph": {
                "load": {
                    "process_id": "load_collection",
                    "arguments": {"id": "nc_spm_08.landsat.strds.lsat5_1987_10"}
                },
                "filter": {
                    "process_id": "filter_temporal",
                    "arguments": {
                        "data": {"from_node": "load"},
                        "extent": ["2001-01-01", "2005-01-01"]
                    },
                    "result": true
                }
            }
        }))
        .unwrap();

        assert_eq!(graph.process_graph.len(), 2);
        assert_eq!(graph.result_node().unwrap(), "filter");
        assert_eq!(graph.node("filter").unwrap().parents(), vec!["load"]);
    }

    #[test]
    fn test_single_node_graph_is_its_own_result() {
        let graph = ProcessGraph::from_nodes([("only", ProcessNode::new("load_collection"))]);
        assert_eq!(graph.result_node().unwrap(), "only");
    }

    #[test]
    fn test_result_node_errors() {
        let graph = ProcessGraph::from_nodes([
            ("a", ProcessNode::new("load_collection")),
            ("b", ProcessNode::new("load_collection")),
        ]);
        assert_eq!(graph.result_node().unwrap_err().kind(), "InvalidJob");

        let graph = ProcessGraph::from_nodes([
            ("a", ProcessNode::new("load_collection").as_result()),
            ("b", ProcessNode::new("load_collection").as_result()),
        ]);
        assert_eq!(graph.result_node().unwrap_err().kind(), "InvalidJob");
    }

    #[test]
    fn test_result_flag_not_serialized_when_false() {
        let node = ProcessNode::new("hants");
        let value = serde_json::to_value(&node).unwrap();
        assert!(value.get("result").is_none());
    }
}
