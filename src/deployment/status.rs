// ABOUTME: Normalized deployment lifecycle states mapped from provider status strings.
// ABOUTME: READY, ERROR and CANCELED are terminal; everything else keeps polling.

use serde::Serialize;
use std::fmt;

use crate::providers::DeploymentSnapshot;
use crate::types::DeploymentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeploymentStatus {
    Queued,
    Initializing,
    Building,
    Ready,
    Error,
    Canceled,
}

impl DeploymentStatus {
    /// Case-insensitive. Unknown labels are treated as still building.
    pub fn from_provider(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "QUEUED" => DeploymentStatus::Queued,
            "INITIALIZING" => DeploymentStatus::Initializing,
            "BUILDING" => DeploymentStatus::Building,
            "READY" => DeploymentStatus::Ready,
            "ERROR" => DeploymentStatus::Error,
            "CANCELED" | "CANCELLED" => DeploymentStatus::Canceled,
            other => {
                tracing::warn!(status = other, "unknown deployment status, assuming BUILDING");
                DeploymentStatus::Building
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeploymentStatus::Ready | DeploymentStatus::Error | DeploymentStatus::Canceled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Queued => "QUEUED",
            DeploymentStatus::Initializing => "INITIALIZING",
            DeploymentStatus::Building => "BUILDING",
            DeploymentStatus::Ready => "READY",
            DeploymentStatus::Error => "ERROR",
            DeploymentStatus::Canceled => "CANCELED",
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentState {
    pub id: DeploymentId,
    pub status: DeploymentStatus,
    /// Always carries a scheme when present.
    pub url: Option<String>,
    pub message: Option<String>,
}

impl From<DeploymentSnapshot> for DeploymentState {
    fn from(snapshot: DeploymentSnapshot) -> Self {
        Self {
            status: DeploymentStatus::from_provider(&snapshot.status),
            url: snapshot.url.map(|url| with_scheme(&url)),
            id: snapshot.id,
            message: snapshot.message,
        }
    }
}

/// Providers report bare hostnames (`acme-abc123.vercel.app`).
fn with_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}
