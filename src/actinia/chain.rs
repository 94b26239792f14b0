// SPDX-License-Identifier: MIT

//! Process chain types consumed by the engine

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Version of the process chain format the engine accepts
pub const PROCESS_CHAIN_VERSION: &str = "1";

/// A complete execution plan as submitted to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessChain {
    pub version: String,
    pub list: Vec<Instruction>,
}

impl ProcessChain {
    pub fn new(list: Vec<Instruction>) -> Self {
        Self {
            version: PROCESS_CHAIN_VERSION.to_string(),
            list,
        }
    }
}

/// One entry of the process chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub id: String,
    pub module: String,
    #[serde(default)]
    pub inputs: Vec<InputBinding>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<OutputBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,
}

impl Instruction {
    /// Start an instruction for `module` with a collision-avoiding id
    pub fn new(module: &str) -> Self {
        Self {
            id: instruction_id(module),
            module: module.to_string(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            flags: None,
        }
    }

    pub fn input(mut self, param: &str, value: impl Into<Value>) -> Self {
        self.inputs.push(InputBinding {
            param: param.to_string(),
            value: value.into(),
            import_descr: None,
        });
        self
    }

    pub fn import(mut self, param: &str, value: &str, import_descr: ImportDescr) -> Self {
        self.inputs.push(InputBinding {
            param: param.to_string(),
            value: Value::String(value.to_string()),
            import_descr: Some(import_descr),
        });
        self
    }

    pub fn output(mut self, param: &str, value: &str) -> Self {
        self.outputs.push(OutputBinding {
            param: param.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// Set the flags; an empty string leaves the instruction without flags
    pub fn flags(mut self, flags: String) -> Self {
        self.flags = if flags.is_empty() { None } else { Some(flags) };
        self
    }

    /// Value bound to an input parameter
    pub fn input_value(&self, param: &str) -> Option<&Value> {
        self.inputs
            .iter()
            .find(|i| i.param == param)
            .map(|i| &i.value)
    }
}

/// A module parameter bound to a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputBinding {
    pub param: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_descr: Option<ImportDescr>,
}

/// A module output parameter bound to a layer name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputBinding {
    pub param: String,
    pub value: String,
}

/// Describes a resource the engine must download before running a module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDescr {
    pub source: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// `t.rast.extract` becomes `t_rast_extract_<n>` with `n` in `0..=1_000_000`
fn instruction_id(module: &str) -> String {
    let suffix = Uuid::new_v4().as_u128() % 1_000_001;
    format!("{}_{}", module.replace('.', "_"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_instruction_id_prefix() {
        let instruction = Instruction::new("t.rast.extract");
        let suffix = instruction.id.strip_prefix("t_rast_extract_").unwrap();
        let n: u64 = suffix.parse().unwrap();
        assert!(n <= 1_000_000);
    }

    #[test]
    fn test_serialization_omits_empty_parts() {
        let instruction = Instruction::new("t.rast.hants")
            .input("nf", 6)
            .flags(String::new());
        let value = serde_json::to_value(&instruction).unwrap();
        assert!(value.get("flags").is_none());
        assert!(value.get("outputs").is_none());
        assert_eq!(value["inputs"][0], json!({"param": "nf", "value": 6}));
    }

    #[test]
    fn test_import_descr_serialization() {
        let instruction = Instruction::new("t.rast.aggr_func").import(
            "pyfile",
            "$file::my_py_func",
            ImportDescr {
                source: "https://example.com/udf.py".to_string(),
                kind: "file".to_string(),
            },
        );
        let value = serde_json::to_value(&instruction).unwrap();
        assert_eq!(
            value["inputs"][0]["import_descr"],
            json!({"source": "https://example.com/udf.py", "type": "file"})
        );
    }

    #[test]
    fn test_chain_version() {
        let chain = ProcessChain::new(vec![]);
        assert_eq!(
            serde_json::to_value(&chain).unwrap(),
            json!({"version": "1", "list": []})
        );
    }
}
