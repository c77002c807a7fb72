// ABOUTME: Provider boundaries the orchestrator drives: database, repository, deployment, DNS.
// ABOUTME: Object-safe async traits so clients and test doubles are interchangeable.

use async_trait::async_trait;
use secrecy::SecretString;
use std::fmt;

use super::ProviderError;
use crate::dns::{DnsRecord, DnsRecordSet};
use crate::site::SourceFile;
use crate::types::{DatabaseId, DeploymentId, DomainName, ProjectId, RepositoryId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStatus {
    /// Provider's own state label, kept for diagnostics.
    pub state: String,
    pub healthy: bool,
}

/// Public connection details handed to the deployed site.
#[derive(Debug)]
pub struct DatabaseCredentials {
    pub api_url: String,
    pub anon_key: SecretString,
}

#[async_trait]
pub trait DatabaseProvisioner: Send + Sync {
    async fn create_database(&self, name: &str) -> Result<DatabaseId, ProviderError>;

    async fn database_status(&self, id: &DatabaseId) -> Result<DatabaseStatus, ProviderError>;

    async fn database_credentials(
        &self,
        id: &DatabaseId,
    ) -> Result<DatabaseCredentials, ProviderError>;
}

/// `owner/name` of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub id: RepositoryId,
    pub reference: RepositoryRef,
    pub html_url: String,
    pub clone_url: String,
    pub default_branch: String,
}

#[async_trait]
pub trait RepositoryHost: Send + Sync {
    async fn create_repository(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Repository, ProviderError>;

    /// Version token (`sha`) of an existing file, `None` when absent.
    async fn file_version(
        &self,
        repo: &RepositoryRef,
        branch: &str,
        path: &str,
    ) -> Result<Option<String>, ProviderError>;

    /// Create or update a file. `version` must be the current token when the file exists.
    async fn put_file(
        &self,
        repo: &RepositoryRef,
        branch: &str,
        file: &SourceFile,
        message: &str,
        version: Option<&str>,
    ) -> Result<(), ProviderError>;

    async fn repository_exists(&self, repo: &RepositoryRef) -> Result<bool, ProviderError>;

    async fn has_commits(&self, repo: &RepositoryRef) -> Result<bool, ProviderError>;

    async fn branch_exists(&self, repo: &RepositoryRef, branch: &str)
    -> Result<bool, ProviderError>;
}

/// Git source a deployment is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub repository: RepositoryRef,
    pub repository_id: RepositoryId,
    pub branch: String,
}

/// Environment variable injected into the deployed project.
#[derive(Debug)]
pub struct EnvVar {
    pub key: String,
    pub value: SecretString,
}

impl EnvVar {
    pub fn new(key: impl Into<String>, value: SecretString) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// A deployment as the provider reports it; `status` is not yet normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentSnapshot {
    pub id: DeploymentId,
    pub status: String,
    pub url: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomDomain {
    pub name: String,
    pub verified: bool,
    /// Target the domain's CNAME should point at, when the provider names one.
    pub cname_target: Option<String>,
}

#[async_trait]
pub trait DeploymentHost: Send + Sync {
    async fn create_project(
        &self,
        name: &str,
        source: &SourceRef,
        env: &[EnvVar],
    ) -> Result<ProjectId, ProviderError>;

    async fn create_deployment(
        &self,
        project: &ProjectId,
        name: &str,
        source: &SourceRef,
    ) -> Result<DeploymentSnapshot, ProviderError>;

    async fn deployment_status(
        &self,
        id: &DeploymentId,
    ) -> Result<DeploymentSnapshot, ProviderError>;

    async fn add_custom_domain(
        &self,
        project: &ProjectId,
        domain: &str,
    ) -> Result<CustomDomain, ProviderError>;
}

/// A registrar that only supports whole-set replacement of host records.
#[async_trait]
pub trait DnsHost: Send + Sync {
    async fn get_hosts(&self, domain: &DomainName) -> Result<Vec<DnsRecord>, ProviderError>;

    /// Replace every host record of the set's domain with exactly `records`.
    async fn set_hosts(&self, records: &DnsRecordSet) -> Result<(), ProviderError>;
}
