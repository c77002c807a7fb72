// ABOUTME: Aggregated result of a successful provisioning run.
// ABOUTME: Serialized as camelCase JSON for the CLI's --json mode.

use serde::Serialize;

use crate::deployment::DeploymentOutcome;
use crate::diagnostics::Warning;
use crate::dns::DnsRecord;
use crate::types::{DatabaseId, DeploymentId, JobId, ProjectId, RepositoryId, SiteId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSummary {
    pub id: DatabaseId,
    pub api_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySummary {
    pub id: RepositoryId,
    /// `owner/name`.
    pub full_name: String,
    pub html_url: String,
    pub default_branch: String,
    pub files_pushed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentReport {
    pub project_id: ProjectId,
    pub deployment_id: DeploymentId,
    pub outcome: DeploymentOutcome,
}

impl DeploymentReport {
    pub fn still_building(&self) -> bool {
        matches!(self.outcome, DeploymentOutcome::InProgress { .. })
    }
}

/// What the bind-domain step left in DNS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainBinding {
    pub fqdn: String,
    pub record: DnsRecord,
    /// Whether the deployment provider already verified the domain.
    pub verified: bool,
    /// Size of the full record set pushed to the DNS provider.
    pub records_pushed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum NotificationOutcome {
    Sent,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningReport {
    pub job_id: JobId,
    pub site_id: SiteId,
    pub fqdn: String,
    pub url: String,
    pub database: DatabaseSummary,
    pub repository: RepositorySummary,
    pub deployment: DeploymentReport,
    pub binding: DomainBinding,
    pub notification: NotificationOutcome,
    pub warnings: Vec<Warning>,
}

impl ProvisioningReport {
    /// The deployment had not finished building when the run ended.
    pub fn still_building(&self) -> bool {
        self.deployment.still_building()
    }
}
