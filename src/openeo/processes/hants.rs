// SPDX-License-Identifier: MIT

use super::description::raster_cube_schema;
use super::params::{optional_bool, optional_f64, optional_i64, required_i64};
use super::{NodeContext, Parameter, Process, ProcessDescription, Translation};
use crate::actinia::{Instruction, LayerName};
use crate::error::{DriverError, Result};
use crate::openeo::graph::{Argument, ProcessNode};
use once_cell::sync::Lazy;
use serde_json::json;

pub const PROCESS_NAME: &str = "hants";

const MODULE: &str = "t.rast.hants";

static DESCRIPTION: Lazy<ProcessDescription> = Lazy::new(|| {
    let number = json!({"type": "number"});
    let boolean = json!({"type": "boolean"});

    ProcessDescription::new(
        PROCESS_NAME,
        "Harmonic analysis of time series.",
        "Approximates a time series with a periodic function made of a number of \
         frequencies and rejects outliers (Harmonic ANalysis of Time Series).",
    )
    .category("time series")
    .parameter(Parameter::required(
        "data",
        "A space-time raster dataset",
        raster_cube_schema(),
    ))
    .parameter(Parameter::required(
        "nf",
        "Number of frequencies",
        json!({"type": "integer", "minimum": 1}),
    ))
    .parameter(Parameter::optional(
        "dod",
        "Degree of over-determination",
        json!({"type": "integer", "minimum": 0}),
        json!(0),
    ))
    .parameter(Parameter::optional(
        "fet",
        "Fit error tolerance when filtering outliers",
        number.clone(),
        json!(f64::MAX),
    ))
    .parameter(Parameter::optional(
        "range_low",
        "Ignore values below this limit",
        number.clone(),
        json!(-f64::MAX),
    ))
    .parameter(Parameter::optional(
        "range_high",
        "Ignore values above this limit",
        number,
        json!(f64::MAX),
    ))
    .parameter(Parameter::optional(
        "reject_low",
        "Reject low outliers",
        boolean.clone(),
        json!(false),
    ))
    .parameter(Parameter::optional(
        "reject_high",
        "Reject high outliers",
        boolean,
        json!(false),
    ))
    .returns("Processed EO data.", raster_cube_schema())
    .example(
        "Six frequencies, rejecting low outliers",
        vec![(
            "hants_1",
            ProcessNode::new(PROCESS_NAME)
                .with_argument("data", Argument::from_node("load_1"))
                .with_argument("nf", json!(6))
                .with_argument("reject_low", json!(true)),
        )],
    )
});

/// Harmonic analysis of space-time raster datasets
pub struct Hants;

struct HantsOptions {
    nf: i64,
    dod: i64,
    fet: f64,
    range: String,
    flags: String,
}

impl HantsOptions {
    fn from_context(ctx: &NodeContext<'_>) -> Result<Self> {
        let nf = required_i64(ctx, "nf")?;
        if nf < 1 {
            return Err(DriverError::invalid_parameter("nf", "must be at least 1"));
        }
        let dod = optional_i64(ctx, "dod", 0)?;
        if dod < 0 {
            return Err(DriverError::invalid_parameter("dod", "must not be negative"));
        }
        let fet = optional_f64(ctx, "fet", f64::MAX)?;
        let range_low = optional_f64(ctx, "range_low", -f64::MAX)?;
        let range_high = optional_f64(ctx, "range_high", f64::MAX)?;

        let mut flags = String::new();
        if optional_bool(ctx, "reject_low", false)? {
            flags.push('l');
        }
        if optional_bool(ctx, "reject_high", false)? {
            flags.push('h');
        }

        Ok(Self {
            nf,
            dod,
            fet,
            range: format!("{},{}", format_g(range_low), format_g(range_high)),
            flags,
        })
    }
}

impl Process for Hants {
    fn id(&self) -> &str {
        PROCESS_NAME
    }

    fn describe(&self) -> ProcessDescription {
        DESCRIPTION.clone()
    }

    fn translate(&self, ctx: &NodeContext<'_>) -> Result<Translation> {
        let inputs = ctx.inputs("data")?;
        let options = HantsOptions::from_context(ctx)?;

        let mut translation = Translation::default();
        for input in inputs {
            let layer = LayerName::parse(input);
            if !layer.is_time_series() {
                translation.pass_through(input);
                continue;
            }

            let output = layer.derived(PROCESS_NAME);
            let instruction = Instruction::new(MODULE)
                .input("input", layer.map_name())
                .input("nf", options.nf)
                .input("dod", options.dod)
                .input("fet", options.fet)
                .input("range", options.range.as_str())
                .input("output", output.as_str())
                .flags(options.flags.clone());
            translation.push(output, instruction);
        }
        Ok(translation)
    }
}

/// Shortest representation with six significant digits, like C's `%g`
fn format_g(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let scientific = format!("{:.5e}", value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some(parts) => parts,
        None => return scientific,
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if !(-4..6).contains(&exponent) {
        let mantissa = trim_fraction(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    } else {
        let precision = (5 - exponent).max(0) as usize;
        trim_fraction(&format!("{:.*}", precision, value)).to_string()
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}
