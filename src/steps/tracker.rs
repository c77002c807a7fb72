// ABOUTME: Job-scoped step log with monotonic progress and terminal-state guards.
// ABOUTME: Every accepted update is broadcast before the call returns.

use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::broadcast;

use super::step::{JobStatus, Step, StepStatus, StepUpdate, WorkflowJob};
use crate::types::JobId;

const UPDATE_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    #[error("unknown job {0}")]
    UnknownJob(JobId),

    #[error("job {0} already exists")]
    DuplicateJob(JobId),

    #[error("job {0} is finished")]
    JobTerminal(JobId),

    #[error("step {step} is already {status}")]
    StepTerminal { step: String, status: StepStatus },

    #[error("step {step} progress cannot go from {current} to {requested}")]
    ProgressRegression {
        step: String,
        current: u8,
        requested: u8,
    },

    #[error("job {0} can only finish as succeeded or failed")]
    NotFinal(JobId),

    #[error("progress {0} is outside 0..=100")]
    ProgressOutOfRange(u8),

    #[error("step {step} cannot move from {from} to {to}")]
    InvalidTransition {
        step: String,
        from: StepStatus,
        to: StepStatus,
    },
}

pub struct StepTracker {
    jobs: RwLock<HashMap<JobId, WorkflowJob>>,
    updates: broadcast::Sender<StepUpdate>,
}

impl Default for StepTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StepTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepTracker")
            .field("jobs", &self.jobs.read().len())
            .finish()
    }
}

impl StepTracker {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            jobs: RwLock::new(HashMap::new()),
            updates,
        }
    }

    /// Receive every update accepted from now on, across all jobs.
    pub fn subscribe(&self) -> broadcast::Receiver<StepUpdate> {
        self.updates.subscribe()
    }

    /// Register a job with all of its steps pending.
    pub fn create_job<S: AsRef<str>>(&self, id: JobId, steps: &[S]) -> Result<(), TrackerError> {
        let mut jobs = self.jobs.write();
        if jobs.contains_key(&id) {
            return Err(TrackerError::DuplicateJob(id));
        }

        let job = WorkflowJob {
            id: id.clone(),
            status: JobStatus::Pending,
            steps: steps.iter().map(|s| Step::pending(s.as_ref())).collect(),
            created_at: Utc::now(),
            finished_at: None,
        };
        jobs.insert(id, job);
        Ok(())
    }

    pub fn get_job(&self, id: &JobId) -> Option<WorkflowJob> {
        self.jobs.read().get(id).cloned()
    }

    /// Move a pending step to in-progress, keeping its progress.
    ///
    /// Step names not registered at job creation are appended.
    pub fn start_step(&self, id: &JobId, name: &str) -> Result<StepUpdate, TrackerError> {
        self.apply(id, name, |step| {
            if step.status != StepStatus::Pending {
                return Err(TrackerError::InvalidTransition {
                    step: step.name.clone(),
                    from: step.status,
                    to: StepStatus::InProgress,
                });
            }
            step.status = StepStatus::InProgress;
            step.message = "started".to_string();
            Ok(())
        })
    }

    pub fn update_step(
        &self,
        id: &JobId,
        name: &str,
        status: StepStatus,
        message: impl Into<String>,
        progress: u8,
    ) -> Result<StepUpdate, TrackerError> {
        if progress > 100 {
            return Err(TrackerError::ProgressOutOfRange(progress));
        }
        let message = message.into();

        self.apply(id, name, move |step| {
            if status == StepStatus::Pending && step.status != StepStatus::Pending {
                return Err(TrackerError::InvalidTransition {
                    step: step.name.clone(),
                    from: step.status,
                    to: status,
                });
            }
            if progress < step.progress {
                return Err(TrackerError::ProgressRegression {
                    step: step.name.clone(),
                    current: step.progress,
                    requested: progress,
                });
            }
            step.status = status;
            step.message = message;
            step.progress = progress;
            Ok(())
        })
    }

    /// Mark the job succeeded or failed. Finished jobs accept no further updates.
    pub fn finish_job(&self, id: &JobId, status: JobStatus) -> Result<WorkflowJob, TrackerError> {
        let mut jobs = self.jobs.write();
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| TrackerError::UnknownJob(id.clone()))?;

        if job.status.is_terminal() {
            return Err(TrackerError::JobTerminal(id.clone()));
        }
        if !status.is_terminal() {
            return Err(TrackerError::NotFinal(id.clone()));
        }

        job.status = status;
        job.finished_at = Some(Utc::now());
        Ok(job.clone())
    }

    /// Validate and apply one step mutation, then publish it while still
    /// holding the write lock so subscribers see updates in order.
    fn apply<F>(&self, id: &JobId, name: &str, mutate: F) -> Result<StepUpdate, TrackerError>
    where
        F: FnOnce(&mut Step) -> Result<(), TrackerError>,
    {
        let mut jobs = self.jobs.write();
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| TrackerError::UnknownJob(id.clone()))?;

        if job.status.is_terminal() {
            return Err(TrackerError::JobTerminal(id.clone()));
        }

        if job.step(name).is_none() {
            job.steps.push(Step::pending(name));
        }
        let step = job
            .step_mut(name)
            .ok_or_else(|| TrackerError::UnknownJob(id.clone()))?;

        if step.status.is_terminal() {
            return Err(TrackerError::StepTerminal {
                step: step.name.clone(),
                status: step.status,
            });
        }

        mutate(step)?;
        step.updated_at = Utc::now();

        let update = StepUpdate::from_step(id, step);
        // No receivers is fine.
        let _ = self.updates.send(update.clone());
        Ok(update)
    }
}
