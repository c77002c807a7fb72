// ABOUTME: DNS command implementations.
// ABOUTME: Plans or re-pushes the domain's full record set from the site registry.

use sitesmith::config::Config;
use sitesmith::dns::{DnsReconciler, DnsRecord, DnsRecordSet, ReconcileSettings};
use sitesmith::error::{Error, Result};
use sitesmith::output::Output;
use sitesmith::providers::NamecheapClient;
use sitesmith::registry::JsonFileRegistry;
use sitesmith::types::Subdomain;
use std::sync::Arc;

fn reconciler(config: &Config) -> DnsReconciler {
    let registry = Arc::new(JsonFileRegistry::new(config.registry.path.clone()));
    DnsReconciler::new(registry, ReconcileSettings::from(&config.dns))
}

/// Show what would be pushed. Live records are only read when the
/// supplement is enabled, so planning needs no credentials otherwise.
pub async fn dns_plan(
    config: Config,
    subdomain: Option<&str>,
    target: Option<&str>,
    output: Output,
) -> Result<()> {
    let reconciler = reconciler(&config);

    let upsert = match subdomain {
        Some(name) => {
            let subdomain =
                Subdomain::new(name).map_err(|e| Error::InvalidRequest(e.to_string()))?;
            let mut record = reconciler.subdomain_record(&config.domain, &subdomain);
            if let Some(target) = target {
                record = DnsRecord::new(subdomain.as_str(), record.record_type, target, record.ttl);
            }
            Some(record)
        }
        None => None,
    };

    let set = if reconciler.settings().include_live_records {
        let dns = NamecheapClient::from_config(&config.dns)?;
        reconciler.reconcile(&dns, &config.domain, upsert).await?
    } else {
        reconciler.reconcile_offline(&config.domain, upsert).await?
    };

    output.data(&set, &record_lines(&set));
    Ok(())
}

pub async fn dns_sync(config: Config, mut output: Output) -> Result<()> {
    let dns = NamecheapClient::from_config(&config.dns)?;
    let reconciler = reconciler(&config);

    output.start_timer();
    output.progress(&format!("Rebuilding DNS records for {}", config.domain));
    let set = reconciler
        .reconcile_and_push(&dns, &config.domain, None)
        .await?;

    for line in record_lines(&set) {
        output.progress(&line);
    }
    output.success(&format!("Pushed {} records for {}", set.len(), config.domain));
    Ok(())
}

fn record_lines(set: &DnsRecordSet) -> Vec<String> {
    set.records()
        .iter()
        .map(|r| {
            format!(
                "{:<24} {:<6} {:<40} {}",
                r.host_name,
                r.record_type.as_str(),
                r.address,
                r.ttl
            )
        })
        .collect()
}
