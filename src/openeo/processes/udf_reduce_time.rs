// SPDX-License-Identifier: MIT

use super::description::raster_cube_schema;
use super::params::required_string;
use super::{NodeContext, Parameter, Process, ProcessDescription, Translation};
use crate::actinia::{ImportDescr, Instruction, LayerName};
use crate::error::Result;
use crate::openeo::graph::{Argument, ProcessNode};
use once_cell::sync::Lazy;
use serde_json::json;

pub const PROCESS_NAME: &str = "udf_reduce_time";

const MODULE: &str = "t.rast.aggr_func";

/// Entry point the engine calls inside the downloaded python file
const PYFILE_FUNCTION: &str = "$file::my_py_func";

static DESCRIPTION: Lazy<ProcessDescription> = Lazy::new(|| {
    ProcessDescription::new(
        PROCESS_NAME,
        "Reduce the time dimension with a user defined function.",
        "Applies a python UDF to every pixel time series. The python file is \
         downloaded by the engine and must define `my_py_func`.",
    )
    .category("udf")
    .parameter(Parameter::required(
        "data",
        "A space-time raster dataset",
        raster_cube_schema(),
    ))
    .parameter(Parameter::required(
        "python_file_url",
        "URL of the python file that implements the UDF",
        json!({"type": "string", "format": "uri"}),
    ))
    .returns("A single raster layer.", raster_cube_schema())
    .example(
        "Reduce with a remote python function",
        vec![(
            "udf_1",
            ProcessNode::new(PROCESS_NAME)
                .with_argument("data", Argument::from_node("load_1"))
                .with_argument(
                    "python_file_url",
                    json!("https://example.com/udf/reduce_mean.py"),
                ),
        )],
    )
});

/// Reduces space-time raster datasets with a remote python function
pub struct UdfReduceTime;

impl Process for UdfReduceTime {
    fn id(&self) -> &str {
        PROCESS_NAME
    }

    fn describe(&self) -> ProcessDescription {
        DESCRIPTION.clone()
    }

    fn translate(&self, ctx: &NodeContext<'_>) -> Result<Translation> {
        let inputs = ctx.inputs("data")?;
        let url = required_string(ctx, "python_file_url")?;

        let mut translation = Translation::default();
        for input in inputs {
            let layer = LayerName::parse(input);
            if !layer.is_time_series() {
                translation.pass_through(input);
                continue;
            }

            let output = layer.derived(PROCESS_NAME);
            let instruction = Instruction::new(MODULE)
                .import(
                    "pyfile",
                    PYFILE_FUNCTION,
                    ImportDescr {
                        source: url.clone(),
                        kind: "file".to_string(),
                    },
                )
                .input("input", layer.map_name())
                .input("output", output.as_str());
            translation.push(output, instruction);
        }
        Ok(translation)
    }
}
