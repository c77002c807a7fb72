// ABOUTME: Durable record of provisioned sites, one document per site.
// ABOUTME: Source of truth for the DNS baseline; written once at the end of a run.

mod file;
mod memory;

pub use file::JsonFileRegistry;
pub use memory::MemoryRegistry;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::{DatabaseId, DomainName, ProjectId, SiteId, Subdomain};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("site {0} is already registered")]
    Conflict(String),

    #[error("failed to access site registry at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("site registry at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A site as stored in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteRecord {
    pub id: SiteId,
    pub owner: String,
    pub subdomain: Subdomain,
    pub domain: DomainName,
    pub fqdn: String,
    pub url: String,
    pub repository_url: String,
    pub project_id: ProjectId,
    pub database_id: DatabaseId,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to register a site; the registry assigns the id and timestamp.
#[derive(Debug, Clone)]
pub struct NewSite {
    pub owner: String,
    pub subdomain: Subdomain,
    pub domain: DomainName,
    pub url: String,
    pub repository_url: String,
    pub project_id: ProjectId,
    pub database_id: DatabaseId,
}

impl NewSite {
    pub fn into_record(self) -> SiteRecord {
        SiteRecord {
            id: SiteId::generate(),
            fqdn: self.domain.fqdn(&self.subdomain),
            owner: self.owner,
            subdomain: self.subdomain,
            domain: self.domain,
            url: self.url,
            repository_url: self.repository_url,
            project_id: self.project_id,
            database_id: self.database_id,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait SiteRegistry: Send + Sync {
    /// All sites, oldest first.
    async fn list_sites(&self) -> Result<Vec<SiteRecord>, RegistryError>;

    /// Store a new site. Fails with `Conflict` when its fqdn is taken.
    async fn record_site(&self, site: NewSite) -> Result<SiteRecord, RegistryError>;

    /// Subdomains provisioned under `domain`, in provisioning order.
    async fn subdomains(&self, domain: &DomainName) -> Result<Vec<Subdomain>, RegistryError> {
        Ok(self
            .list_sites()
            .await?
            .into_iter()
            .filter(|site| &site.domain == domain)
            .map(|site| site.subdomain)
            .collect())
    }

    async fn find_by_subdomain(
        &self,
        domain: &DomainName,
        subdomain: &Subdomain,
    ) -> Result<Option<SiteRecord>, RegistryError> {
        Ok(self
            .list_sites()
            .await?
            .into_iter()
            .find(|site| &site.domain == domain && &site.subdomain == subdomain))
    }
}
