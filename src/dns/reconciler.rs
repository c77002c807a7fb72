// ABOUTME: Builds the complete host record set for a domain from the site registry.
// ABOUTME: Baseline, then optional live supplement, then the upsert; pushed whole.

use std::sync::Arc;

use super::lock::DomainLocks;
use super::record::{DnsRecord, DnsRecordSet, RecordType, Upsert};
use crate::config::{DnsConfig, SubdomainRecordConfig};
use crate::providers::{DnsHost, ProviderError};
use crate::registry::{RegistryError, SiteRegistry};
use crate::types::{DomainName, Subdomain};

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("failed to load DNS baseline: {0}")]
    Registry(#[from] RegistryError),

    #[error("failed to push DNS records for {domain}: {source}")]
    Push {
        domain: DomainName,
        #[source]
        source: ProviderError,
    },
}

/// Record template for provisioned subdomains.
///
/// `{subdomain}` and `{domain}` in the address are replaced per site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubdomainTemplate {
    pub record_type: RecordType,
    pub address: String,
    pub ttl: u32,
}

impl SubdomainTemplate {
    pub fn record_for(&self, domain: &DomainName, subdomain: &Subdomain) -> DnsRecord {
        let address = self
            .address
            .replace("{subdomain}", subdomain.as_str())
            .replace("{domain}", domain.as_str());
        DnsRecord::new(subdomain.as_str(), self.record_type, address, self.ttl)
    }
}

impl From<&SubdomainRecordConfig> for SubdomainTemplate {
    fn from(config: &SubdomainRecordConfig) -> Self {
        Self {
            record_type: config.record_type,
            address: config.address.clone(),
            ttl: config.ttl,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReconcileSettings {
    pub default_records: Vec<DnsRecord>,
    pub subdomain_template: SubdomainTemplate,
    pub include_live_records: bool,
}

impl From<&DnsConfig> for ReconcileSettings {
    fn from(config: &DnsConfig) -> Self {
        Self {
            default_records: config.default_records.iter().cloned().collect(),
            subdomain_template: SubdomainTemplate::from(&config.subdomain_record),
            include_live_records: config.include_live_records,
        }
    }
}

/// Merge records into one duplicate-free set, in precedence order.
///
/// Defaults and baseline records are upserted, so a later entry for the same
/// host wins. Live records only fill hosts nothing else names. The upsert is
/// applied last and replaces in place.
pub fn build_record_set(
    domain: &DomainName,
    defaults: &[DnsRecord],
    baseline: impl IntoIterator<Item = DnsRecord>,
    live: &[DnsRecord],
    upsert: Option<DnsRecord>,
) -> DnsRecordSet {
    let mut set = DnsRecordSet::new(domain.clone());

    for record in defaults.iter().cloned().chain(baseline) {
        set.upsert(record);
    }

    for record in live {
        if set.supplement(record.clone()) {
            tracing::debug!(host = %record.host_name, "kept live record missing from baseline");
        }
    }

    if let Some(record) = upsert {
        let host = record.host_name.clone();
        match set.upsert(record) {
            Upsert::Inserted => tracing::debug!(host = %host, "added record"),
            Upsert::Replaced(old) => {
                tracing::debug!(host = %host, previous = %old.address, "replaced record")
            }
        }
    }

    set
}

pub struct DnsReconciler {
    registry: Arc<dyn SiteRegistry>,
    settings: ReconcileSettings,
    locks: DomainLocks,
}

impl DnsReconciler {
    pub fn new(registry: Arc<dyn SiteRegistry>, settings: ReconcileSettings) -> Self {
        Self {
            registry,
            settings,
            locks: DomainLocks::new(),
        }
    }

    /// Share a lock registry with other reconcilers in the process.
    pub fn with_locks(mut self, locks: DomainLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn settings(&self) -> &ReconcileSettings {
        &self.settings
    }

    /// The record a provisioned subdomain gets.
    pub fn subdomain_record(&self, domain: &DomainName, subdomain: &Subdomain) -> DnsRecord {
        self.settings.subdomain_template.record_for(domain, subdomain)
    }

    /// Compute the full desired record set for `domain`.
    ///
    /// Live records are read from `dns` only when the supplement is enabled;
    /// a failed read is logged and skipped.
    pub async fn reconcile(
        &self,
        dns: &dyn DnsHost,
        domain: &DomainName,
        upsert: Option<DnsRecord>,
    ) -> Result<DnsRecordSet, RegistryError> {
        let baseline = self.baseline(domain).await?;

        let live = if self.settings.include_live_records {
            match dns.get_hosts(domain).await {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(domain = %domain, "ignoring live DNS records: {e}");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Ok(build_record_set(
            domain,
            &self.settings.default_records,
            baseline,
            &live,
            upsert,
        ))
    }

    /// Like `reconcile`, without ever reading live records.
    pub async fn reconcile_offline(
        &self,
        domain: &DomainName,
        upsert: Option<DnsRecord>,
    ) -> Result<DnsRecordSet, RegistryError> {
        let baseline = self.baseline(domain).await?;
        Ok(build_record_set(
            domain,
            &self.settings.default_records,
            baseline,
            &[],
            upsert,
        ))
    }

    async fn baseline(&self, domain: &DomainName) -> Result<Vec<DnsRecord>, RegistryError> {
        Ok(self
            .registry
            .subdomains(domain)
            .await?
            .iter()
            .map(|subdomain| self.subdomain_record(domain, subdomain))
            .collect())
    }

    /// Reconcile and push the whole set in one call, holding the domain lock
    /// from the baseline read through the push.
    pub async fn reconcile_and_push(
        &self,
        dns: &dyn DnsHost,
        domain: &DomainName,
        upsert: Option<DnsRecord>,
    ) -> Result<DnsRecordSet, ReconcileError> {
        self.locks
            .with_lock(domain, async {
                let set = self.reconcile(dns, domain, upsert).await?;
                dns.set_hosts(&set)
                    .await
                    .map_err(|source| ReconcileError::Push {
                        domain: domain.clone(),
                        source,
                    })?;
                tracing::info!(domain = %domain, records = set.len(), "pushed DNS records");
                Ok::<_, ReconcileError>(set)
            })
            .await
    }
}
