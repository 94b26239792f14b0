// SPDX-License-Identifier: MIT

use super::description::raster_cube_schema;
use super::{NodeContext, Parameter, Process, ProcessDescription, Translation};
use crate::actinia::LayerName;
use crate::error::{DriverError, Result};
use crate::openeo::graph::ProcessNode;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

pub const PROCESS_NAME: &str = "load_collection";

static DESCRIPTION: Lazy<ProcessDescription> = Lazy::new(|| {
    ProcessDescription::new(
        PROCESS_NAME,
        "Selects a collection.",
        "Selects one or more collections by their full layer definition \
         (location.mapset.datatype.layer). Produces no engine instructions.",
    )
    .category("import")
    .parameter(Parameter::required(
        "id",
        "The collection id or a list of collection ids",
        json!({"anyOf": [
            {"type": "string"},
            {"type": "array", "items": {"type": "string"}}
        ]}),
    ))
    .returns("Processed EO data.", raster_cube_schema())
    .example(
        "Load a space-time raster dataset",
        vec![(
            "load_1",
            ProcessNode::new(PROCESS_NAME)
                .with_argument("id", json!("nc_spm_08.landsat.strds.lsat5_1987_10")),
        )],
    )
});

/// Names the collections a graph starts from
pub struct LoadCollection;

impl Process for LoadCollection {
    fn id(&self) -> &str {
        PROCESS_NAME
    }

    fn describe(&self) -> ProcessDescription {
        DESCRIPTION.clone()
    }

    fn translate(&self, ctx: &NodeContext<'_>) -> Result<Translation> {
        let ids = match ctx.literal("id")? {
            None => return Err(DriverError::missing_parameter("id")),
            Some(Value::String(id)) => vec![id],
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(id) => Ok(id),
                    _ => Err(DriverError::invalid_parameter(
                        "id",
                        "every collection id must be a string",
                    )),
                })
                .collect::<Result<Vec<_>>>()?,
            Some(_) => {
                return Err(DriverError::invalid_parameter(
                    "id",
                    "expected a string or an array of strings",
                ))
            }
        };

        if ids.is_empty() || ids.iter().any(|id| id.trim().is_empty()) {
            return Err(DriverError::invalid_parameter(
                "id",
                "collection ids must not be empty",
            ));
        }

        if let Some(id) = ids.iter().find(|id| LayerName::parse_checked(id).is_none()) {
            return Err(DriverError::invalid_parameter(
                "id",
                format!("'{}' contains a reserved character", id),
            ));
        }

        Ok(Translation {
            output_names: ids,
            instructions: Vec::new(),
        })
    }
}
