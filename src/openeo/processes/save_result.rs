// SPDX-License-Identifier: MIT

use super::description::raster_cube_schema;
use super::params::required_string;
use super::{NodeContext, Parameter, Process, ProcessDescription, Translation};
use crate::error::{DriverError, Result};
use once_cell::sync::Lazy;
use serde_json::{json, Value};

pub const PROCESS_NAME: &str = "save_result";

static DESCRIPTION: Lazy<ProcessDescription> = Lazy::new(|| {
    ProcessDescription::new(
        PROCESS_NAME,
        "Save processed data.",
        "Marks the data as job result. The engine exports every result layer; \
         the format is recorded but the export format is chosen by the engine.",
    )
    .category("export")
    .parameter(Parameter::required("data", "The data to save", raster_cube_schema()))
    .parameter(Parameter::required(
        "format",
        "The output format, e.g. GTiff",
        json!({"type": "string"}),
    ))
    .parameter(Parameter::optional(
        "options",
        "Format specific parameters",
        json!({"type": "object"}),
        json!({}),
    ))
    .returns("true if the data was saved", json!({"type": "boolean"}))
});

pub struct SaveResult;

impl Process for SaveResult {
    fn id(&self) -> &str {
        PROCESS_NAME
    }

    fn describe(&self) -> ProcessDescription {
        DESCRIPTION.clone()
    }

    fn translate(&self, ctx: &NodeContext<'_>) -> Result<Translation> {
        let inputs = ctx.inputs("data")?;
        let format = required_string(ctx, "format")?;
        match ctx.literal("options")? {
            None | Some(Value::Object(_)) => {}
            Some(_) => {
                return Err(DriverError::invalid_parameter(
                    "options",
                    "expected an object",
                ))
            }
        }
        log::debug!("save_result: {} layer(s) as {}", inputs.len(), format);

        let mut translation = Translation::default();
        for input in inputs {
            translation.pass_through(input);
        }
        Ok(translation)
    }
}
