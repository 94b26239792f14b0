// SPDX-License-Identifier: MIT

//! Pseudo-processes generated from the engine's module catalogue

use super::description::raster_cube_schema;
use super::{NodeContext, Process, ProcessDescription, Translation};
use crate::actinia::{Instruction, LayerName};
use crate::error::{DriverError, Result};
use serde_json::{json, Value};

/// One engine module exposed as a process.
///
/// Modules with several outputs yield one process per output.
pub struct EngineModuleProcess {
    id: String,
    module: String,
    return_param: Option<String>,
    description: ProcessDescription,
}

impl EngineModuleProcess {
    /// Engine module executed by this process
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Output parameter of the module bound by this process, if any
    pub fn return_param(&self) -> Option<&str> {
        self.return_param.as_deref()
    }
}

/// Build the processes for one entry of the engine's module catalogue.
///
/// Entries without an `id`, or whose description does not parse, are skipped.
pub fn module_processes(module: &Value) -> Vec<EngineModuleProcess> {
    let module_id = match module.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            log::warn!("Skipping engine module without id");
            return Vec::new();
        }
    };

    let mut module = module.clone();
    if let Some(parameters) = module.get_mut("parameters").and_then(Value::as_array_mut) {
        parameters.iter_mut().for_each(normalize_schema);
    }
    if let Some(returns) = module.get_mut("returns").and_then(Value::as_array_mut) {
        returns.iter_mut().for_each(normalize_schema);
    }

    let base = module_id.replace('.', "_");
    let returns: Vec<Value> = module
        .get("returns")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let variants: Vec<(String, Option<String>, Value)> = if returns.is_empty() {
        vec![(base, None, json!({}))]
    } else {
        returns
            .into_iter()
            .map(|ret| {
                let name = ret
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("output")
                    .to_string();
                (format!("{}_{}", base, name), Some(name), ret)
            })
            .collect()
    };

    variants
        .into_iter()
        .filter_map(|(id, return_param, returns)| {
            let mut raw = module.clone();
            raw["id"] = Value::String(id.clone());
            raw["returns"] = returns;

            match serde_json::from_value::<ProcessDescription>(raw) {
                Ok(description) => Some(EngineModuleProcess {
                    id,
                    module: module_id.clone(),
                    return_param,
                    description,
                }),
                Err(e) => {
                    log::warn!("Skipping engine module '{}': {}", id, e);
                    None
                }
            }
        })
        .collect()
}

/// Engine-specific `cell`/`strds` subtypes become raster cubes; other schema
/// keys are kept
fn normalize_schema(entry: &mut Value) {
    let schema = match entry.get_mut("schema").and_then(Value::as_object_mut) {
        Some(schema) => schema,
        None => return,
    };
    if matches!(
        schema.get("subtype").and_then(Value::as_str),
        Some("cell") | Some("strds")
    ) {
        if let Value::Object(cube) = raster_cube_schema() {
            schema.extend(cube);
        }
    }
}

impl Process for EngineModuleProcess {
    fn id(&self) -> &str {
        &self.id
    }

    fn describe(&self) -> ProcessDescription {
        self.description.clone()
    }

    fn translate(&self, ctx: &NodeContext<'_>) -> Result<Translation> {
        for parameter in self.description.required_parameters() {
            if ctx.node.argument(&parameter.name).is_none() {
                return Err(DriverError::missing_parameter(parameter.name.as_str()));
            }
        }

        let mut instruction = Instruction::new(&self.module);
        let mut first_layer: Option<String> = None;

        for (name, argument) in &ctx.node.arguments {
            if argument.references().is_empty() {
                let value = match argument.to_value() {
                    Value::Null => continue,
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                instruction = instruction.input(name, value);
            } else {
                let layers: Vec<LayerName> =
                    ctx.inputs(name)?.iter().map(|i| LayerName::parse(i)).collect();
                if first_layer.is_none() {
                    first_layer = layers.first().map(|l| l.layer.clone());
                }
                let maps: Vec<String> = layers.iter().map(LayerName::map_name).collect();
                instruction = instruction.input(name, maps.join(","));
            }
        }

        let mut translation = Translation::default();
        match &self.return_param {
            Some(param) => {
                let base = first_layer.unwrap_or_else(|| ctx.name.to_string());
                let output = format!("{}_{}", base, self.id);
                instruction = instruction.output(param, &output);
                translation.push(output, instruction);
            }
            None => translation.instructions.push(instruction),
        }
        Ok(translation)
    }
}
