// ABOUTME: Job and step records kept by the step tracker.
// ABOUTME: Also the update event broadcast to observers on every accepted change.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::types::JobId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::InProgress => "in-progress",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub name: String,
    pub status: StepStatus,
    pub message: String,
    pub progress: u8,
    pub updated_at: DateTime<Utc>,
}

impl Step {
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Pending,
            message: String::new(),
            progress: 0,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    Pending,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowJob {
    pub id: JobId,
    pub status: JobStatus,
    pub steps: Vec<Step>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl WorkflowJob {
    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }

    pub(crate) fn step_mut(&mut self, name: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.name == name)
    }
}

/// One accepted change, as published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepUpdate {
    pub job_id: JobId,
    pub step_name: String,
    pub status: StepStatus,
    pub message: String,
    pub progress: u8,
}

impl StepUpdate {
    pub(crate) fn from_step(job_id: &JobId, step: &Step) -> Self {
        Self {
            job_id: job_id.clone(),
            step_name: step.name.clone(),
            status: step.status,
            message: step.message.clone(),
            progress: step.progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_serializes_in_camel_case() {
        let update = StepUpdate {
            job_id: JobId::new("job-1"),
            step_name: "deploy".to_string(),
            status: StepStatus::InProgress,
            message: "building".to_string(),
            progress: 65,
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "jobId": "job-1",
                "stepName": "deploy",
                "status": "in-progress",
                "message": "building",
                "progress": 65
            })
        );
    }
}
