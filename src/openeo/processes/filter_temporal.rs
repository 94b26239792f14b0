// SPDX-License-Identifier: MIT

use super::description::raster_cube_schema;
use super::{NodeContext, Parameter, Process, ProcessDescription, Translation};
use crate::actinia::{Instruction, LayerName};
use crate::error::{DriverError, Result};
use crate::openeo::graph::{Argument, ProcessNode};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use serde_json::{json, Value};

pub const PROCESS_NAME: &str = "filter_temporal";

const MODULE: &str = "t.rast.extract";

static DESCRIPTION: Lazy<ProcessDescription> = Lazy::new(|| {
    ProcessDescription::new(
        PROCESS_NAME,
        "Temporal filter based on temporal intervals.",
        "Limits the data cube to the specified interval of dates and/or times. \
         The lower boundary is included, the upper boundary is excluded.",
    )
    .category("filter")
    .parameter(Parameter::required(
        "data",
        "A space-time raster dataset",
        raster_cube_schema(),
    ))
    .parameter(Parameter::required(
        "extent",
        "Left-closed temporal interval. One of the boundaries may be null.",
        json!({
            "type": "array",
            "minItems": 2,
            "maxItems": 2,
            "items": {"anyOf": [
                {"type": "string", "format": "date-time"},
                {"type": "string", "format": "date"},
                {"type": "null"}
            ]}
        }),
    ))
    .parameter(Parameter::optional(
        "dimension",
        "The name of the temporal dimension to filter on",
        json!({"type": ["string", "null"]}),
        Value::Null,
    ))
    .returns("Processed EO data.", raster_cube_schema())
    .example(
        "Extract one year",
        vec![
            (
                "load_1",
                ProcessNode::new("load_collection")
                    .with_argument("id", json!("nc_spm_08.modis_lst.strds.LST_Day_monthly")),
            ),
            (
                "filter_1",
                ProcessNode::new(PROCESS_NAME)
                    .with_argument("data", Argument::from_node("load_1"))
                    .with_argument("extent", json!(["2015-01-01", "2016-01-01"]))
                    .as_result(),
            ),
        ],
    )
});

/// Extracts a time range from space-time raster datasets
pub struct FilterTemporal;

impl Process for FilterTemporal {
    fn id(&self) -> &str {
        PROCESS_NAME
    }

    fn describe(&self) -> ProcessDescription {
        DESCRIPTION.clone()
    }

    fn translate(&self, ctx: &NodeContext<'_>) -> Result<Translation> {
        let inputs = ctx.inputs("data")?;
        let where_clause = where_clause(ctx)?;

        let mut translation = Translation::default();
        for input in inputs {
            let layer = LayerName::parse(input);
            if !layer.is_time_series() {
                translation.pass_through(input);
                continue;
            }

            let output = layer.derived(PROCESS_NAME);
            let map_name = layer.map_name();
            let instruction = Instruction::new(MODULE)
                .input("input", map_name.as_str())
                .input("where", where_clause.as_str())
                .input("output", output.as_str())
                .input("expression", format!("1.0 * {}", map_name))
                .input("basename", format!("{}_extract", layer.layer))
                .input("suffix", "num");
            translation.push(output, instruction);
        }
        Ok(translation)
    }
}

fn where_clause(ctx: &NodeContext<'_>) -> Result<String> {
    let extent = match ctx.literal("extent")? {
        Some(Value::Array(items)) if items.len() == 2 => items,
        Some(_) => {
            return Err(DriverError::invalid_parameter(
                "extent",
                "expected an array of two boundaries",
            ))
        }
        None => return Err(DriverError::missing_parameter("extent")),
    };

    let start = boundary(&extent[0])?;
    let end = boundary(&extent[1])?;

    let mut predicates = Vec::new();
    if let Some(start) = start {
        predicates.push(format!("start_time >= '{}'", start));
    }
    if let Some(end) = end {
        predicates.push(format!("end_time < '{}'", end));
    }
    if predicates.is_empty() {
        return Err(DriverError::invalid_parameter(
            "extent",
            "at most one boundary may be null",
        ));
    }
    Ok(predicates.join(" AND "))
}

const ENGINE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// `2015-01-01` becomes `2015-01-01 00:00:00`, `2015-01-01T10:00:00` becomes
/// `2015-01-01 10:00:00`. RFC 3339 values keep their local time and lose the
/// offset.
fn boundary(value: &Value) -> Result<Option<String>> {
    let text = match value {
        Value::Null => return Ok(None),
        Value::String(s) => s.trim(),
        _ => {
            return Err(DriverError::invalid_parameter(
                "extent",
                "boundaries must be date strings or null",
            ))
        }
    };

    parse_boundary(text)
        .map(|time| Some(time.format(ENGINE_FORMAT).to_string()))
        .ok_or_else(|| {
            DriverError::invalid_parameter(
                "extent",
                format!("'{}' is not a date or date-time", text),
            )
        })
}

fn parse_boundary(text: &str) -> Option<NaiveDateTime> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Some(time.naive_local());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}
