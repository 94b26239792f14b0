// SPDX-License-Identifier: MIT

//! openEO side of the driver
//!
//! This module provides:
//! - `graph` - the process graph model, loader and compiler
//! - `processes` - translators from processes to engine instructions
//! - `jobs` - job records and their lifecycle
//! - `collections` / `graphs` - catalogue and stored graphs
//! - `server` - the HTTP adapter

pub mod collections;
pub mod graph;
pub mod graphs;
pub mod jobs;
pub mod processes;
pub mod server;
