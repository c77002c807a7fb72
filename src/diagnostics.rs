// ABOUTME: Diagnostics accumulator for non-fatal warnings during a provisioning run.
// ABOUTME: Collects warnings that shouldn't fail a run but should end up in its report.

use serde::Serialize;

/// Collects non-fatal warnings during a provisioning run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(kind = ?warning.kind, "{}", warning.message);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// The step tracker refused an update; the run carried on.
    pub fn tracker_rejected(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::TrackerRejected,
            message: message.into(),
        }
    }

    pub fn notification_failed(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::NotificationFailed,
            message: message.into(),
        }
    }

    pub fn domain_unverified(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::DomainUnverified,
            message: message.into(),
        }
    }

    pub fn deployment_pending(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::DeploymentPending,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    /// A step update was rejected by the tracker.
    TrackerRejected,
    /// The best-effort notice could not be delivered.
    NotificationFailed,
    /// The deployment provider has not verified the custom domain yet.
    DomainUnverified,
    /// The deployment was still building when polling stopped.
    DeploymentPending,
}
