// ABOUTME: Sites command implementation.
// ABOUTME: Lists the site registry, newest last.

use sitesmith::config::Config;
use sitesmith::error::Result;
use sitesmith::output::Output;
use sitesmith::registry::{JsonFileRegistry, SiteRegistry};

pub async fn list_sites(config: Config, output: Output) -> Result<()> {
    let registry = JsonFileRegistry::new(config.registry.path.clone());
    let sites = registry.list_sites().await?;

    let lines = if sites.is_empty() {
        vec![format!("No sites recorded in {}", registry.path().display())]
    } else {
        sites
            .iter()
            .map(|site| {
                format!(
                    "{:<32} {:<16} {}  {}",
                    site.fqdn,
                    site.owner,
                    site.created_at.format("%Y-%m-%d %H:%M"),
                    site.repository_url
                )
            })
            .collect()
    };

    output.data(&sites, &lines);
    Ok(())
}
