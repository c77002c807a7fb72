// ABOUTME: Polls a deployment until it reaches a terminal state or the budget runs out.
// ABOUTME: Reports a capped, non-decreasing progress estimate while the build runs.

use serde::Serialize;

use crate::config::DeploymentPollSettings;
use crate::poll::{PollError, Readiness, ReadinessPoller};
use crate::providers::{DeploymentHost, ProviderError};

use super::status::{DeploymentState, DeploymentStatus};

/// `min(ceiling, start + attempt * step)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEstimate {
    pub start: u8,
    pub step: u8,
    pub ceiling: u8,
}

impl ProgressEstimate {
    pub fn at(&self, attempt: u32) -> u8 {
        let raw = u32::from(self.start).saturating_add(attempt.saturating_mul(u32::from(self.step)));
        let capped = raw.min(u32::from(self.ceiling));
        u8::try_from(capped).unwrap_or(self.ceiling)
    }
}

/// Progress observed on a non-terminal poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentProgress {
    pub attempt: u32,
    pub status: DeploymentStatus,
    pub progress: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum DeploymentOutcome {
    Ready {
        url: Option<String>,
    },
    Failed {
        status: DeploymentStatus,
        message: Option<String>,
    },
    /// Still building when the budget ran out; check back later.
    InProgress {
        status: DeploymentStatus,
        progress: u8,
    },
}

impl DeploymentOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, DeploymentOutcome::Ready { .. })
    }

    fn from_terminal(state: DeploymentState) -> Self {
        match state.status {
            DeploymentStatus::Ready => DeploymentOutcome::Ready { url: state.url },
            status => DeploymentOutcome::Failed {
                status,
                message: state.message,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeploymentStatusTracker {
    poller: ReadinessPoller,
    estimate: ProgressEstimate,
}

impl DeploymentStatusTracker {
    pub fn new(poller: ReadinessPoller, estimate: ProgressEstimate) -> Self {
        Self { poller, estimate }
    }

    pub fn estimate(&self) -> ProgressEstimate {
        self.estimate
    }

    /// Follow `initial` to a terminal state.
    ///
    /// An already-terminal initial state is returned without polling.
    /// Provider errors while polling are hard errors.
    pub async fn track<F>(
        &self,
        host: &dyn DeploymentHost,
        initial: DeploymentState,
        mut on_progress: F,
    ) -> Result<DeploymentOutcome, ProviderError>
    where
        F: FnMut(DeploymentProgress),
    {
        if initial.status.is_terminal() {
            return Ok(DeploymentOutcome::from_terminal(initial));
        }

        let id = initial.id.clone();
        let estimate = self.estimate;
        let mut last_status = initial.status;
        let mut last_progress = estimate.start;

        let result = self
            .poller
            .poll_with(
                "deployment",
                |_| {
                    let id = id.clone();
                    async move {
                        let state = DeploymentState::from(host.deployment_status(&id).await?);
                        if state.status.is_terminal() {
                            Ok::<_, ProviderError>(Readiness::Ready(state))
                        } else {
                            Ok(Readiness::NotReady(state.status))
                        }
                    }
                },
                |attempt, status: &DeploymentStatus| {
                    let progress = estimate.at(attempt).max(last_progress);
                    last_status = *status;
                    last_progress = progress;
                    on_progress(DeploymentProgress {
                        attempt,
                        status: *status,
                        progress,
                    });
                },
            )
            .await;

        match result {
            Ok(state) => Ok(DeploymentOutcome::from_terminal(state)),
            Err(PollError::TimeoutExceeded { attempts, .. }) => {
                tracing::warn!(deployment = %id, attempts, status = %last_status, "deployment still in progress");
                Ok(DeploymentOutcome::InProgress {
                    status: last_status,
                    progress: last_progress,
                })
            }
            Err(PollError::Failed { source, .. }) => Err(source),
        }
    }
}

impl From<&DeploymentPollSettings> for DeploymentStatusTracker {
    fn from(settings: &DeploymentPollSettings) -> Self {
        Self::new(
            ReadinessPoller::new(settings.interval, settings.max_attempts),
            ProgressEstimate {
                start: settings.progress_start,
                step: settings.progress_step,
                ceiling: settings.progress_ceiling,
            },
        )
    }
}
