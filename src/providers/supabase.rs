// ABOUTME: Database client for the Supabase management API.
// ABOUTME: One project per site; readiness is the ACTIVE_HEALTHY project status.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::error::{decode_json, transport};
use super::{DatabaseCredentials, DatabaseProvisioner, DatabaseStatus, ProviderError};
use crate::config::DatabaseConfig;
use crate::types::DatabaseId;

const SUPABASE_API_URL: &str = "https://api.supabase.com";
const SERVICE: &str = "supabase";
const HEALTHY_STATUS: &str = "ACTIVE_HEALTHY";

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    access_token: SecretString,
    organization_id: String,
    region: String,
    db_password: SecretString,
}

impl SupabaseClient {
    pub fn new(
        access_token: SecretString,
        organization_id: impl Into<String>,
        region: impl Into<String>,
        db_password: SecretString,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(transport(SERVICE))?;

        Ok(Self {
            client,
            base_url: SUPABASE_API_URL.to_string(),
            access_token,
            organization_id: organization_id.into(),
            region: region.into(),
            db_password,
        })
    }

    pub fn from_config(config: &DatabaseConfig) -> crate::error::Result<Self> {
        let mut client = Self::new(
            config.access_token.resolve_secret()?,
            &config.organization_id,
            &config.region,
            config.db_password.resolve_secret()?,
        )?;
        if let Some(url) = &config.api_url {
            client = client.with_base_url(url);
        }
        Ok(client)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(self.access_token.expose_secret())
    }
}

#[derive(Serialize)]
struct CreateProjectBody<'a> {
    name: &'a str,
    organization_id: &'a str,
    region: &'a str,
    db_pass: &'a str,
}

#[derive(Deserialize)]
struct ProjectResponse {
    id: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Deserialize)]
struct ApiKey {
    name: String,
    api_key: String,
}

#[async_trait]
impl DatabaseProvisioner for SupabaseClient {
    async fn create_database(&self, name: &str) -> Result<DatabaseId, ProviderError> {
        let body = CreateProjectBody {
            name,
            organization_id: &self.organization_id,
            region: &self.region,
            db_pass: self.db_password.expose_secret(),
        };

        let response = self
            .request(Method::POST, "/v1/projects")
            .json(&body)
            .send()
            .await
            .map_err(transport(SERVICE))?;
        let project: ProjectResponse = decode_json(SERVICE, response).await?;

        tracing::debug!(project = %project.id, "created database project");
        Ok(DatabaseId::new(project.id))
    }

    async fn database_status(&self, id: &DatabaseId) -> Result<DatabaseStatus, ProviderError> {
        let path = format!("/v1/projects/{}", urlencoding::encode(id.as_str()));
        let response = self
            .request(Method::GET, &path)
            .send()
            .await
            .map_err(transport(SERVICE))?;
        let project: ProjectResponse = decode_json(SERVICE, response).await?;

        let state = project.status.unwrap_or_else(|| "UNKNOWN".to_string());
        Ok(DatabaseStatus {
            healthy: state.eq_ignore_ascii_case(HEALTHY_STATUS),
            state,
        })
    }

    async fn database_credentials(
        &self,
        id: &DatabaseId,
    ) -> Result<DatabaseCredentials, ProviderError> {
        let path = format!("/v1/projects/{}/api-keys", urlencoding::encode(id.as_str()));
        let response = self
            .request(Method::GET, &path)
            .send()
            .await
            .map_err(transport(SERVICE))?;
        let keys: Vec<ApiKey> = decode_json(SERVICE, response).await?;

        let anon = keys
            .into_iter()
            .find(|key| key.name == "anon")
            .ok_or_else(|| ProviderError::Decode {
                service: SERVICE,
                message: "no anon key in api-keys response".to_string(),
            })?;

        Ok(DatabaseCredentials {
            api_url: format!("https://{}.supabase.co", id.as_str()),
            anon_key: SecretString::from(anon.api_key),
        })
    }
}
