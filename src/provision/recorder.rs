// ABOUTME: Step-level bookkeeping for one run: tracker updates plus collected warnings.
// ABOUTME: Tracker rejections become warnings and never stop the run.

use parking_lot::Mutex;
use std::sync::Arc;

use super::StepName;
use crate::diagnostics::{Diagnostics, Warning};
use crate::steps::{JobStatus, StepStatus, StepTracker, StepUpdate, TrackerError};
use crate::types::JobId;

pub(crate) struct StepRecorder {
    tracker: Arc<StepTracker>,
    job_id: JobId,
    diagnostics: Mutex<Diagnostics>,
}

impl StepRecorder {
    pub(crate) fn new(tracker: Arc<StepTracker>, job_id: JobId) -> Self {
        Self {
            tracker,
            job_id,
            diagnostics: Mutex::new(Diagnostics::default()),
        }
    }

    pub(crate) fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub(crate) fn start(&self, step: StepName) {
        tracing::info!(job = %self.job_id, step = %step, "step started");
        let result = self.tracker.start_step(&self.job_id, step.as_str());
        self.accept(result);
    }

    pub(crate) fn progress(&self, step: StepName, message: impl Into<String>, progress: u8) {
        let result = self.tracker.update_step(
            &self.job_id,
            step.as_str(),
            StepStatus::InProgress,
            message,
            progress,
        );
        self.accept(result);
    }

    pub(crate) fn complete(&self, step: StepName, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(job = %self.job_id, step = %step, "{message}");
        // A step may already sit above its milestone (a high deployment ceiling).
        let progress = step.milestone().max(self.current_progress(step));
        let result = self.tracker.update_step(
            &self.job_id,
            step.as_str(),
            StepStatus::Completed,
            message,
            progress,
        );
        self.accept(result);
    }

    /// Mark `step` failed at whatever progress it had reached.
    pub(crate) fn fail(&self, step: StepName, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(job = %self.job_id, step = %step, "step failed: {message}");
        let progress = self.current_progress(step);
        let result = self.tracker.update_step(
            &self.job_id,
            step.as_str(),
            StepStatus::Failed,
            message,
            progress,
        );
        self.accept(result);
    }

    pub(crate) fn finish(&self, status: JobStatus) {
        if let Err(e) = self.tracker.finish_job(&self.job_id, status) {
            self.reject(e);
        }
    }

    pub(crate) fn warn(&self, warning: Warning) {
        self.diagnostics.lock().warn(warning);
    }

    pub(crate) fn take_warnings(&self) -> Vec<Warning> {
        std::mem::take(&mut *self.diagnostics.lock()).into_warnings()
    }

    fn current_progress(&self, step: StepName) -> u8 {
        self.tracker
            .get_job(&self.job_id)
            .and_then(|job| job.step(step.as_str()).map(|s| s.progress))
            .unwrap_or(0)
    }

    fn accept(&self, result: Result<StepUpdate, TrackerError>) {
        if let Err(e) = result {
            self.reject(e);
        }
    }

    fn reject(&self, error: TrackerError) {
        self.warn(Warning::tracker_rejected(format!(
            "step tracker rejected update for job {}: {error}",
            self.job_id
        )));
    }
}
