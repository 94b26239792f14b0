//! Job lifecycle - records, storage and the lifecycle manager

mod manager;
mod store;
mod types;

pub use manager::JobManager;
pub use store::{KeyGuard, KeyLocks, MemoryStore, Store};
pub use types::{Job, JobRequest, JobStatus};
