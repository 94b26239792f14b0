// SPDX-License-Identifier: MIT

//! Driver configuration read from the environment

use crate::error::{DriverError, Result};
use std::env;
use std::time::Duration;
use url::Url;

const DEFAULT_HOST: &str = "https://actinia.mundialis.de";
const DEFAULT_VERSION: &str = "v3";
const DEFAULT_USER: &str = "demouser";
const DEFAULT_PASSWORD: &str = "gu3st!pa55w0rd";
const DEFAULT_LOCATION: &str = "nc_spm_08";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection and startup settings
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the actinia server
    pub host: Url,
    /// API version path segment, e.g. `v3`
    pub version: String,
    pub user: String,
    pub password: String,
    /// Locations scanned for collections; the first one is the default job location
    pub locations: Vec<String>,
    /// Upper bound for every engine call
    pub timeout: Duration,
    /// Whether to import the engine's module catalogue into the process registry
    pub register_modules: bool,
}

impl Config {
    /// Build the configuration from process environment variables.
    ///
    /// Reads `ACTINIA_HOST`, `ACTINIA_VERSION`, `ACTINIA_USER`,
    /// `ACTINIA_PASSWORD`, `ACTINIA_LOCATIONS`, `ACTINIA_TIMEOUT_SECS` and
    /// `OPENEO_REGISTER_MODULES`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host_str = var("ACTINIA_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host = Url::parse(&host_str)
            .map_err(|e| DriverError::config(format!("ACTINIA_HOST '{}': {}", host_str, e)))?;

        let locations: Vec<String> = var("ACTINIA_LOCATIONS")
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if locations.is_empty() {
            return Err(DriverError::config("ACTINIA_LOCATIONS is empty"));
        }

        let timeout_secs = match var("ACTINIA_TIMEOUT_SECS") {
            Some(v) => v.trim().parse::<u64>().map_err(|_| {
                DriverError::config(format!("ACTINIA_TIMEOUT_SECS must be an integer, got '{}'", v))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(DriverError::config("ACTINIA_TIMEOUT_SECS must be positive"));
        }

        let register_modules = match var("OPENEO_REGISTER_MODULES").as_deref() {
            None | Some("true") | Some("1") | Some("yes") => true,
            Some("false") | Some("0") | Some("no") => false,
            Some(other) => {
                return Err(DriverError::config(format!(
                    "OPENEO_REGISTER_MODULES must be a boolean, got '{}'",
                    other
                )))
            }
        };

        Ok(Self {
            host,
            version: var("ACTINIA_VERSION").unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            user: var("ACTINIA_USER").unwrap_or_else(|| DEFAULT_USER.to_string()),
            password: var("ACTINIA_PASSWORD").unwrap_or_else(|| DEFAULT_PASSWORD.to_string()),
            locations,
            timeout: Duration::from_secs(timeout_secs),
            register_modules,
        })
    }

    /// Location used for jobs whose graph does not name one
    pub fn default_location(&self) -> &str {
        // from_lookup guarantees at least one location
        self.locations
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_LOCATION)
    }

    /// `https://host/api/v3/` style base for endpoint paths
    pub fn api_base(&self) -> String {
        format!(
            "{}/api/{}",
            self.host.as_str().trim_end_matches('/'),
            self.version
        )
    }
}
