// SPDX-License-Identifier: MIT

//! Process metadata served by the process listing

use crate::openeo::graph::ProcessNode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Schema of a raster data cube
pub fn raster_cube_schema() -> Value {
    json!({"type": "object", "subtype": "raster-cube"})
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessDescription {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub returns: ReturnValue,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<ProcessExample>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub schema: Value,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Parameter {
    pub fn required(name: &str, description: &str, schema: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            schema,
            optional: false,
            default: None,
        }
    }

    pub fn optional(name: &str, description: &str, schema: Value, default: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            schema,
            optional: true,
            default: if default.is_null() { None } else { Some(default) },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnValue {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub schema: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessExample {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub process_graph: Value,
}

impl ProcessDescription {
    pub fn new(id: &str, summary: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            summary: summary.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    pub fn category(mut self, category: &str) -> Self {
        self.categories.push(category.to_string());
        self
    }

    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn returns(mut self, description: &str, schema: Value) -> Self {
        self.returns = ReturnValue {
            description: description.to_string(),
            schema,
        };
        self
    }

    /// Add an example made of the given nodes
    pub fn example(mut self, title: &str, nodes: Vec<(&str, ProcessNode)>) -> Self {
        let graph: BTreeMap<&str, ProcessNode> = nodes.into_iter().collect();
        self.examples.push(ProcessExample {
            title: title.to_string(),
            description: String::new(),
            process_graph: serde_json::to_value(graph).unwrap_or(Value::Null),
        });
        self
    }

    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn required_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(|p| !p.optional)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openeo::graph::Argument;

    #[test]
    fn test_builder() {
        let description = ProcessDescription::new("hants", "HANTS", "Harmonic analysis")
            .parameter(Parameter::required("data", "input", raster_cube_schema()))
            .parameter(Parameter::optional("dod", "degree", json!({"type": "integer"}), json!(0)))
            .returns("Processed EO data.", raster_cube_schema())
            .example(
                "Simple",
                vec![(
                    "hants_1",
                    ProcessNode::new("hants").with_argument("data", Argument::from_node("load")),
                )],
            );

        assert_eq!(description.parameter_names(), vec!["data", "dod"]);
        assert_eq!(description.required_parameters().count(), 1);
        assert_eq!(
            description.examples[0].process_graph["hants_1"]["arguments"]["data"],
            json!({"from_node": "load"})
        );
    }

    #[test]
    fn test_deserialize_engine_module_shape() {
        let description: ProcessDescription = serde_json::from_value(json!({
            "id": "r.slope.aspect",
            "description": "Generates raster layers of slope",
            "categories": ["grass-module"],
            "parameters": [
                {"name": "elevation", "description": "Name of input", "optional": false,
                 "schema": {"type": "object", "subtype": "raster-cube"}},
                {"name": "format", "optional": true, "schema": {"type": "string"}, "default": "degrees"}
            ],
            "returns": {"name": "slope", "description": "Slope", "schema": {"type": "string"}}
        }))
        .unwrap();

        assert_eq!(description.summary, "");
        assert_eq!(description.required_parameters().count(), 1);
        assert_eq!(description.parameters[1].default, Some(json!("degrees")));
        assert_eq!(description.returns.description, "Slope");
    }
}
