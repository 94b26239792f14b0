// SPDX-License-Identifier: MIT

//! Job records and requests

use crate::actinia::{Instruction, RunHandle, RunReport, RunStatus};
use crate::openeo::graph::{Compilation, ProcessGraph};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Created,
    Queued,
    Running,
    Finished,
    Error,
}

impl JobStatus {
    /// No further transitions except deletion
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Error)
    }

    /// The engine is working on the job
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RunStatus> for JobStatus {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Accepted => Self::Queued,
            RunStatus::Running => Self::Running,
            RunStatus::Finished => Self::Finished,
            RunStatus::Error | RunStatus::Terminated => Self::Error,
        }
    }
}

/// Body of a create or patch request
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct JobRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub process: Option<ProcessGraph>,
}

impl JobRequest {
    pub fn new(process: ProcessGraph) -> Self {
        Self {
            process: Some(process),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub process: ProcessGraph,
    pub status: JobStatus,
    /// Compiled instructions for the engine
    pub plan: Vec<Instruction>,
    pub output_names: Vec<String>,
    /// Engine location the plan runs in
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<RunHandle>,
    #[serde(default)]
    pub results: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Job {
    pub(crate) fn new(
        id: String,
        title: Option<String>,
        description: Option<String>,
        process: ProcessGraph,
        compilation: Compilation,
        location: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            description,
            process,
            status: JobStatus::Created,
            plan: compilation.instructions,
            output_names: compilation.output_names,
            location,
            run: None,
            results: Vec::new(),
            message: None,
            created: now,
            updated: now,
        }
    }

    /// Take over the engine's view of the run
    pub(crate) fn apply_report(&mut self, report: RunReport) {
        self.status = JobStatus::from(report.status);
        self.run = Some(report.handle);
        if !report.results.is_empty() {
            self.results = report.results;
        }
        if report.message.is_some() {
            self.message = report.message;
        }
        self.updated = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openeo::graph::ProcessNode;
    use serde_json::json;

    fn job() -> Job {
        Job::new(
            "job-1".to_string(),
            Some("title".to_string()),
            None,
            ProcessGraph::from_nodes([("load", ProcessNode::new("load_collection"))]),
            Compilation::default(),
            "nc_spm_08".to_string(),
        )
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(JobStatus::from(RunStatus::Accepted), JobStatus::Queued);
        assert_eq!(JobStatus::from(RunStatus::Running), JobStatus::Running);
        assert_eq!(JobStatus::from(RunStatus::Finished), JobStatus::Finished);
        assert_eq!(JobStatus::from(RunStatus::Terminated), JobStatus::Error);
        assert!(JobStatus::Finished.is_terminal());
        assert!(JobStatus::Queued.is_active());
        assert!(!JobStatus::Created.is_active());
    }

    #[test]
    fn test_apply_report() {
        let mut job = job();
        job.apply_report(RunReport {
            handle: RunHandle {
                resource_id: "r1".to_string(),
            },
            status: RunStatus::Error,
            results: vec![],
            message: Some("AsyncProcessError".to_string()),
        });
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.run.as_ref().unwrap().resource_id, "r1");
        assert_eq!(job.message.as_deref(), Some("AsyncProcessError"));
        assert!(job.updated >= job.created);
    }

    #[test]
    fn test_serialization() {
        let value = serde_json::to_value(job()).unwrap();
        assert_eq!(value["status"], json!("created"));
        assert_eq!(value["location"], json!("nc_spm_08"));
        assert!(value.get("run").is_none());
        assert!(value["created"].as_str().unwrap().ends_with('Z'));

        let back: Job = serde_json::from_value(value).unwrap();
        assert_eq!(back.id, "job-1");
    }

    #[test]
    fn test_request_without_process() {
        let request: JobRequest = serde_json::from_value(json!({"title": "t"})).unwrap();
        assert!(request.process.is_none());
    }
}
