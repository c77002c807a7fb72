// ABOUTME: Site registry stored as one JSON document keyed by site id.
// ABOUTME: Writes go through a temp file and rename so readers never see a partial file.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{NewSite, RegistryError, SiteRecord, SiteRegistry};

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryDocument {
    #[serde(default)]
    sites: BTreeMap<String, SiteRecord>,
}

#[derive(Debug)]
pub struct JsonFileRegistry {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<RegistryDocument, RegistryError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(RegistryDocument::default());
            }
            Err(source) => return Err(self.io_error(source)),
        };

        if content.trim().is_empty() {
            return Ok(RegistryDocument::default());
        }

        serde_json::from_str(&content).map_err(|source| RegistryError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    async fn write_document(&self, document: &RegistryDocument) -> Result<(), RegistryError> {
        let json = serde_json::to_vec_pretty(document).map_err(|source| {
            RegistryError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: std::io::Error) -> RegistryError {
        RegistryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl SiteRegistry for JsonFileRegistry {
    async fn list_sites(&self) -> Result<Vec<SiteRecord>, RegistryError> {
        let document = self.read_document().await?;
        let mut sites: Vec<SiteRecord> = document.sites.into_values().collect();
        sites.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(sites)
    }

    async fn record_site(&self, site: NewSite) -> Result<SiteRecord, RegistryError> {
        let _guard = self.write_lock.lock().await;

        let mut document = self.read_document().await?;
        let record = site.into_record();

        if document.sites.values().any(|s| s.fqdn == record.fqdn) {
            return Err(RegistryError::Conflict(record.fqdn));
        }

        document
            .sites
            .insert(record.id.as_str().to_string(), record.clone());
        self.write_document(&document).await?;

        tracing::info!(site = %record.id, fqdn = %record.fqdn, "recorded site");
        Ok(record)
    }
}
