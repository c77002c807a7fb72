// ABOUTME: DNS host client for the Namecheap XML API.
// ABOUTME: setHosts replaces every record of a domain; getHosts reads the live set.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::OnceCell;

use super::error::{ensure_success, transport};
use super::{DnsHost, ProviderError};
use crate::config::DnsConfig;
use crate::dns::wire::{self, ApiResponse};
use crate::dns::{DnsRecord, DnsRecordSet};
use crate::types::DomainName;

const NAMECHEAP_API_URL: &str = "https://api.namecheap.com/xml.response";
const NAMECHEAP_SANDBOX_URL: &str = "https://api.sandbox.namecheap.com/xml.response";
const IP_ECHO_URL: &str = "https://api.ipify.org";
const SERVICE: &str = "namecheap";

pub struct NamecheapClient {
    client: Client,
    base_url: String,
    api_user: String,
    api_key: SecretString,
    client_ip: OnceCell<String>,
}

impl NamecheapClient {
    pub fn new(
        api_user: impl Into<String>,
        api_key: SecretString,
        sandbox: bool,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(transport(SERVICE))?;

        let base_url = if sandbox {
            NAMECHEAP_SANDBOX_URL
        } else {
            NAMECHEAP_API_URL
        };

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_user: api_user.into(),
            api_key,
            client_ip: OnceCell::new(),
        })
    }

    pub fn from_config(config: &DnsConfig) -> crate::error::Result<Self> {
        let mut client = Self::new(
            &config.api_user,
            config.api_key.resolve_secret()?,
            config.sandbox,
        )?;
        if let Some(ip) = &config.client_ip {
            client = client.with_client_ip(ip);
        }
        if let Some(url) = &config.api_url {
            client = client.with_base_url(url);
        }
        Ok(client)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_client_ip(self, ip: impl Into<String>) -> Self {
        Self {
            client_ip: OnceCell::new_with(Some(ip.into())),
            ..self
        }
    }

    /// Whitelisted source IP; looked up once from a public echo service when not configured.
    async fn client_ip(&self) -> Result<&str, ProviderError> {
        self.client_ip
            .get_or_try_init(|| async {
                let response = self
                    .client
                    .get(IP_ECHO_URL)
                    .send()
                    .await
                    .map_err(transport(SERVICE))?;
                let ip = response.text().await.map_err(transport(SERVICE))?;
                Ok::<_, ProviderError>(ip.trim().to_string())
            })
            .await
            .map(String::as_str)
    }

    async fn call(
        &self,
        command: &str,
        domain: &DomainName,
        extra: &[(String, String)],
    ) -> Result<ApiResponse, ProviderError> {
        let client_ip = self.client_ip().await?;
        let (sld, tld) = domain.split();

        let mut query: Vec<(&str, &str)> = vec![
            ("ApiUser", &self.api_user),
            ("ApiKey", self.api_key.expose_secret()),
            ("UserName", &self.api_user),
            ("ClientIp", client_ip),
            ("Command", command),
            ("SLD", sld),
            ("TLD", tld),
        ];
        query.extend(extra.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        tracing::debug!(command, domain = %domain, params = extra.len(), "registrar request");

        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(transport(SERVICE))?;
        let body = ensure_success(SERVICE, response)
            .await?
            .text()
            .await
            .map_err(transport(SERVICE))?;

        let parsed = wire::parse_response(&body).map_err(|e| ProviderError::Decode {
            service: SERVICE,
            message: e.to_string(),
        })?;

        match parsed.first_error() {
            Some(error) => Err(ProviderError::api(SERVICE, error.code, error.description)),
            None => Ok(parsed),
        }
    }
}

#[async_trait]
impl DnsHost for NamecheapClient {
    async fn get_hosts(&self, domain: &DomainName) -> Result<Vec<DnsRecord>, ProviderError> {
        let response = self
            .call("namecheap.domains.dns.getHosts", domain, &[])
            .await?;
        Ok(response.hosts)
    }

    async fn set_hosts(&self, records: &DnsRecordSet) -> Result<(), ProviderError> {
        let params = wire::host_params(records);
        let response = self
            .call("namecheap.domains.dns.setHosts", records.domain(), &params)
            .await?;

        if response.set_hosts_success == Some(false) {
            return Err(ProviderError::api(
                SERVICE,
                "IsSuccess=false",
                format!("setHosts was not applied for {}", records.domain()),
            ));
        }
        Ok(())
    }
}
