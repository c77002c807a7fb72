// ABOUTME: Outbound notice that a site went live, delivered by webhook or to the log.
// ABOUTME: Delivery failures are the caller's to treat as soft.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::ProviderError;
use super::error::{ensure_success, transport};

const SERVICE: &str = "notifier";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteNotice {
    pub owner: String,
    pub site_name: String,
    pub fqdn: String,
    pub url: String,
    pub repository_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    /// The build had not finished when the run ended.
    pub still_building: bool,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: &SiteNotice) -> Result<(), ProviderError>;
}

/// POSTs each notice as JSON.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(transport(SERVICE))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notice: &SiteNotice) -> Result<(), ProviderError> {
        let response = self
            .client
            .post(&self.url)
            .json(notice)
            .send()
            .await
            .map_err(transport(SERVICE))?;
        ensure_success(SERVICE, response).await?;
        Ok(())
    }
}

/// Used when no webhook is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notice: &SiteNotice) -> Result<(), ProviderError> {
        tracing::info!(
            owner = %notice.owner,
            fqdn = %notice.fqdn,
            url = %notice.url,
            still_building = notice.still_building,
            "site ready"
        );
        Ok(())
    }
}
