// ABOUTME: Provisioning state types for the type state pattern.
// ABOUTME: Each state carries the outputs later steps depend on.

use secrecy::SecretString;

use super::report::{
    DatabaseSummary, DeploymentReport, DomainBinding, NotificationOutcome, RepositorySummary,
};
use crate::providers::SourceRef;
use crate::registry::SiteRecord;
use crate::site::{SourceFile, Workspace};
use crate::types::DatabaseId;

/// A database whose credentials were fetched after it reported healthy.
#[derive(Debug)]
pub struct DatabaseAllocation {
    pub id: DatabaseId,
    pub api_url: String,
    pub anon_key: SecretString,
}

impl DatabaseAllocation {
    pub fn summary(&self) -> DatabaseSummary {
        DatabaseSummary {
            id: self.id.clone(),
            api_url: self.api_url.clone(),
        }
    }
}

/// Initial state: request accepted, nothing created yet.
/// Available actions: `allocate_database()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Requested;

/// Database healthy and credentials in hand.
/// Available actions: `generate_config()`
#[derive(Debug)]
pub struct DatabaseReady {
    pub(crate) database: DatabaseAllocation,
}

/// Site files rendered into the workspace.
/// Available actions: `publish_repository()`
#[derive(Debug)]
pub struct Configured {
    pub(crate) database: DatabaseAllocation,
    pub(crate) workspace: Workspace,
    pub(crate) files: Vec<SourceFile>,
}

/// Files pushed and the default branch is readable.
/// Available actions: `deploy()`
#[derive(Debug)]
pub struct Published {
    pub(crate) database: DatabaseAllocation,
    pub(crate) workspace: Workspace,
    pub(crate) repository: RepositorySummary,
    pub(crate) source: SourceRef,
}

/// Project created and the deployment tracked to an outcome.
/// Available actions: `bind_domain()`
#[derive(Debug)]
pub struct Deployed {
    pub(crate) database: DatabaseAllocation,
    pub(crate) workspace: Workspace,
    pub(crate) repository: RepositorySummary,
    pub(crate) deployment: DeploymentReport,
}

/// Custom domain attached and DNS pushed.
/// Available actions: `notify()`
#[derive(Debug)]
pub struct DomainBound {
    pub(crate) database: DatabaseAllocation,
    pub(crate) workspace: Workspace,
    pub(crate) repository: RepositorySummary,
    pub(crate) deployment: DeploymentReport,
    pub(crate) binding: DomainBinding,
}

/// Notice attempted.
/// Available actions: `record_site()`
#[derive(Debug)]
pub struct Notified {
    pub(crate) database: DatabaseAllocation,
    pub(crate) workspace: Workspace,
    pub(crate) repository: RepositorySummary,
    pub(crate) deployment: DeploymentReport,
    pub(crate) binding: DomainBinding,
    pub(crate) notification: NotificationOutcome,
}

/// Site stored in the registry.
/// Available actions: `cleanup_workspace()`
#[derive(Debug)]
pub struct Recorded {
    pub(crate) database: DatabaseAllocation,
    pub(crate) workspace: Workspace,
    pub(crate) repository: RepositorySummary,
    pub(crate) deployment: DeploymentReport,
    pub(crate) binding: DomainBinding,
    pub(crate) notification: NotificationOutcome,
    pub(crate) site: SiteRecord,
}
