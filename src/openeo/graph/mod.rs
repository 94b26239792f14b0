//! Process graph model, loading and compilation

mod compiler;
mod loader;
mod types;

pub use compiler::{Compilation, Compiler};
pub use loader::GraphLoader;
pub use types::{Argument, NodeReference, ProcessGraph, ProcessNode};
