// ABOUTME: In-memory site registry for tests and dry runs.
// ABOUTME: Same conflict rules as the file registry, nothing persisted.

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{NewSite, RegistryError, SiteRecord, SiteRegistry};

#[derive(Debug, Default)]
pub struct MemoryRegistry {
    sites: RwLock<Vec<SiteRecord>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing sites.
    pub fn with_sites(sites: Vec<SiteRecord>) -> Self {
        Self {
            sites: RwLock::new(sites),
        }
    }

    pub fn len(&self) -> usize {
        self.sites.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.read().is_empty()
    }
}

#[async_trait]
impl SiteRegistry for MemoryRegistry {
    async fn list_sites(&self) -> Result<Vec<SiteRecord>, RegistryError> {
        Ok(self.sites.read().clone())
    }

    async fn record_site(&self, site: NewSite) -> Result<SiteRecord, RegistryError> {
        let record = site.into_record();
        let mut sites = self.sites.write();
        if sites.iter().any(|s| s.fqdn == record.fqdn) {
            return Err(RegistryError::Conflict(record.fqdn));
        }
        sites.push(record.clone());
        Ok(record)
    }
}
