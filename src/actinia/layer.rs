// SPDX-License-Identifier: MIT

//! Dataset naming used by the engine
//!
//! Collections are addressed as `location.mapset.datatype.layer`. Intermediate
//! outputs produced by translators are bare layer names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of dataset a layer name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Raster,
    Vector,
    Strds,
}

impl DataType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "raster" => Some(Self::Raster),
            "vector" => Some(Self::Vector),
            "strds" => Some(Self::Strds),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raster => "raster",
            Self::Vector => "vector",
            Self::Strds => "strds",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The components of a layer definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerName {
    pub location: Option<String>,
    pub mapset: Option<String>,
    pub datatype: Option<DataType>,
    pub layer: String,
}

impl LayerName {
    /// Split a layer definition into its components.
    ///
    /// `nc_spm_08.landsat.strds.lsat5_1987_10` yields all four parts, while a
    /// bare `lsat5_1987_10_filter_temporal` only has a layer name. A bare name
    /// may carry its mapset as `layer@mapset`.
    pub fn parse(name: &str) -> Self {
        let parts: Vec<&str> = name.splitn(4, '.').collect();
        if parts.len() == 4 {
            if let Some(datatype) = DataType::parse(parts[2]) {
                return Self {
                    location: Some(parts[0].to_string()),
                    mapset: Some(parts[1].to_string()),
                    datatype: Some(datatype),
                    layer: parts[3].to_string(),
                };
            }
        }

        match name.split_once('@') {
            Some((layer, mapset)) if !layer.is_empty() && !mapset.is_empty() => Self {
                location: None,
                mapset: Some(mapset.to_string()),
                datatype: None,
                layer: layer.to_string(),
            },
            _ => Self {
                location: None,
                mapset: None,
                datatype: None,
                layer: name.to_string(),
            },
        }
    }

    /// Like [`LayerName::parse`], but `None` when a component contains `/`,
    /// `?` or `#`, which would leave its path segment in an engine URL
    pub fn parse_checked(name: &str) -> Option<Self> {
        let parsed = Self::parse(name);
        let components = [
            parsed.location.as_deref(),
            parsed.mapset.as_deref(),
            Some(parsed.layer.as_str()),
        ];
        let reserved = |c: char| matches!(c, '/' | '?' | '#');
        if components.iter().flatten().any(|part| part.contains(reserved)) {
            None
        } else {
            Some(parsed)
        }
    }

    /// Name of the map as the engine expects it: `layer@mapset` or `layer`
    pub fn map_name(&self) -> String {
        match &self.mapset {
            Some(mapset) => format!("{}@{}", self.layer, mapset),
            None => self.layer.clone(),
        }
    }

    /// True when the layer is a space-time raster dataset or its type is unknown
    pub fn is_time_series(&self) -> bool {
        matches!(self.datatype, None | Some(DataType::Strds))
    }

    /// Deterministic name of the output a process derives from this layer
    pub fn derived(&self, process_name: &str) -> String {
        format!("{}_{}", self.layer, process_name)
    }
}
