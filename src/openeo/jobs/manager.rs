// SPDX-License-Identifier: MIT

use super::store::{KeyLocks, Store};
use super::types::{Job, JobRequest, JobStatus};
use crate::actinia::{Engine, ProcessChain};
use crate::error::{DriverError, Result};
use crate::openeo::graph::{Compilation, Compiler, ProcessGraph};
use crate::openeo::processes::ProcessRegistry;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Owns the job records and drives them through their lifecycle.
///
/// Every read-modify-write of a job runs under that job's key lock, so
/// concurrent requests for one job apply one after another while different
/// jobs proceed independently.
pub struct JobManager {
    registry: Arc<ProcessRegistry>,
    engine: Arc<dyn Engine>,
    store: Arc<dyn Store<Job>>,
    locks: KeyLocks,
    default_location: String,
}

impl JobManager {
    pub fn new(
        registry: Arc<ProcessRegistry>,
        engine: Arc<dyn Engine>,
        store: Arc<dyn Store<Job>>,
        default_location: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            engine,
            store,
            locks: KeyLocks::new(),
            default_location: default_location.into(),
        }
    }

    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    /// Compile a graph without creating a job
    pub fn compile(&self, graph: &ProcessGraph) -> Result<Compilation> {
        Compiler::new(&self.registry).compile(graph)
    }

    pub async fn create(&self, request: JobRequest) -> Result<Job> {
        let process = request
            .process
            .ok_or_else(|| DriverError::InvalidJob("The job request has no process".to_string()))?;
        let compilation = self.compile(&process)?;
        let location = self.location_of(&compilation);

        let id = Uuid::new_v4().to_string();
        let job = Job::new(
            id.clone(),
            request.title,
            request.description,
            process,
            compilation,
            location,
        );

        self.store.put(&id, job.clone()).await?;
        log::info!(
            "Created job {} ({} instructions, location {})",
            id,
            job.plan.len(),
            job.location
        );
        Ok(job)
    }

    pub async fn get(&self, job_id: &str) -> Result<Job> {
        self.load(job_id).await
    }

    /// All jobs, oldest first
    pub async fn list(&self) -> Result<Vec<Job>> {
        let mut jobs = Vec::new();
        for key in self.store.keys().await? {
            if let Some(job) = self.store.get(&key).await? {
                jobs.push(job);
            }
        }
        jobs.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        Ok(jobs)
    }

    /// Replace process, plan and metadata of a job that has not run yet
    pub async fn patch(&self, job_id: &str, request: JobRequest) -> Result<Job> {
        let _guard = self.locks.lock(job_id).await;
        let mut job = self.load(job_id).await?;

        if job.status.is_terminal() {
            return Err(DriverError::InvalidJob(format!(
                "Job {} is {} and can no longer be modified",
                job_id, job.status
            )));
        }
        let process = request
            .process
            .ok_or_else(|| DriverError::InvalidJob("The job request has no process".to_string()))?;

        // A failing compilation returns before the stored job is touched
        let compilation = self.compile(&process)?;

        job.location = self.location_of(&compilation);
        job.plan = compilation.instructions;
        job.output_names = compilation.output_names;
        job.process = process;
        job.title = request.title;
        job.description = request.description;
        job.updated = Utc::now();

        self.store.put(job_id, job.clone()).await?;
        log::info!("Updated job {}", job_id);
        Ok(job)
    }

    /// Submit the job's plan to the engine
    pub async fn start(&self, job_id: &str) -> Result<Job> {
        let _guard = self.locks.lock(job_id).await;
        let mut job = self.load(job_id).await?;

        match job.status {
            JobStatus::Queued | JobStatus::Running if job.run.is_some() => {
                log::info!("Job {} is already {}", job_id, job.status);
                return Ok(job);
            }
            JobStatus::Finished | JobStatus::Error => {
                return Err(DriverError::InvalidJob(format!(
                    "Job {} is {} and cannot be started again",
                    job_id, job.status
                )));
            }
            _ => {}
        }

        let chain = ProcessChain::new(job.plan.clone());
        let report = self.engine.submit(&job.location, &chain).await?;
        log::info!(
            "Started job {} as engine resource {}",
            job_id,
            report.handle.resource_id
        );

        job.apply_report(report);
        self.store.put(job_id, job.clone()).await?;
        Ok(job)
    }

    /// Refresh the job from the engine when a run is active
    pub async fn poll(&self, job_id: &str) -> Result<Job> {
        let _guard = self.locks.lock(job_id).await;
        let mut job = self.load(job_id).await?;

        let handle = match (&job.run, job.status.is_active()) {
            (Some(handle), true) => handle.clone(),
            _ => return Ok(job),
        };

        let report = self.engine.status(&handle).await?;
        if JobStatus::from(report.status) != job.status {
            log::info!(
                "Job {}: {} -> {}",
                job_id,
                job.status,
                JobStatus::from(report.status)
            );
        }
        job.apply_report(report);
        self.store.put(job_id, job.clone()).await?;
        Ok(job)
    }

    /// Remove a job, cancelling its run first when one is active
    pub async fn delete(&self, job_id: &str) -> Result<()> {
        let _guard = self.locks.lock(job_id).await;
        let job = self.load(job_id).await?;

        if job.status.is_active() {
            if let Some(handle) = &job.run {
                if let Err(e) = self.engine.cancel(handle).await {
                    log::warn!(
                        "Failed to cancel engine resource {} of job {}: {}",
                        handle.resource_id,
                        job_id,
                        e
                    );
                }
            }
        }

        self.store.delete(job_id).await?;
        log::info!("Deleted job {}", job_id);
        Ok(())
    }

    /// Remove every job; returns how many were deleted
    pub async fn delete_all(&self) -> Result<usize> {
        let mut deleted = 0;
        for key in self.store.keys().await? {
            match self.delete(&key).await {
                Ok(()) => deleted += 1,
                // Removed concurrently
                Err(DriverError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(deleted)
    }

    async fn load(&self, job_id: &str) -> Result<Job> {
        self.store
            .get(job_id)
            .await?
            .ok_or_else(|| DriverError::NotFound(format!("Job {}", job_id)))
    }

    fn location_of(&self, compilation: &Compilation) -> String {
        compilation
            .location()
            .unwrap_or_else(|| self.default_location.clone())
    }
}
