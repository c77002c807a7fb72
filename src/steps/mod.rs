// ABOUTME: Step tracking for provisioning jobs, observable by progress UIs.
// ABOUTME: Jobs are isolated by id; steps only move forward.

mod step;
mod tracker;

pub use step::{JobStatus, Step, StepStatus, StepUpdate, WorkflowJob};
pub use tracker::{StepTracker, TrackerError};
