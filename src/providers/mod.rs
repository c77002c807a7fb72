// ABOUTME: External providers the orchestrator drives, behind injectable traits.
// ABOUTME: Concrete clients for GitHub, Vercel, Namecheap, Supabase, and a webhook notifier.

mod error;
mod github;
mod namecheap;
mod notifier;
mod supabase;
mod traits;
mod vercel;

pub use error::ProviderError;
pub use github::GitHubClient;
pub use namecheap::NamecheapClient;
pub use notifier::{LogNotifier, Notifier, SiteNotice, WebhookNotifier};
pub use supabase::SupabaseClient;
pub use traits::{
    CustomDomain, DatabaseCredentials, DatabaseProvisioner, DatabaseStatus, DeploymentHost,
    DeploymentSnapshot, DnsHost, EnvVar, Repository, RepositoryHost, RepositoryRef, SourceRef,
};
pub use vercel::VercelClient;

use std::sync::Arc;

use crate::config::Config;

/// The provider set one orchestrator runs against.
#[derive(Clone)]
pub struct Providers {
    pub database: Arc<dyn DatabaseProvisioner>,
    pub repository: Arc<dyn RepositoryHost>,
    pub deployment: Arc<dyn DeploymentHost>,
    pub dns: Arc<dyn DnsHost>,
    pub notifier: Arc<dyn Notifier>,
}

impl Providers {
    /// Build every client from configuration.
    ///
    /// All credentials are resolved here, so a missing one fails before any
    /// external call is made.
    pub fn from_config(config: &Config) -> crate::error::Result<Self> {
        let notifier: Arc<dyn Notifier> = match &config.notifications.webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(url)?),
            None => Arc::new(LogNotifier),
        };

        Ok(Self {
            database: Arc::new(SupabaseClient::from_config(&config.database)?),
            repository: Arc::new(GitHubClient::from_config(&config.repository)?),
            deployment: Arc::new(VercelClient::from_config(&config.deployment)?),
            dns: Arc::new(NamecheapClient::from_config(&config.dns)?),
            notifier,
        })
    }
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers").finish_non_exhaustive()
    }
}
