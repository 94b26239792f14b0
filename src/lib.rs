// SPDX-License-Identifier: MIT

//! openeo-grass-rs - openEO process graphs compiled to actinia process chains

pub mod actinia;
pub mod config;
pub mod error;
pub mod openeo;

pub use config::Config;
pub use error::{DriverError, Result};
