// ABOUTME: Deployment client for the Vercel REST API.
// ABOUTME: Projects are linked to a Git repository; deployments build a branch of it.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::error::{decode_json, transport};
use super::{CustomDomain, DeploymentHost, DeploymentSnapshot, EnvVar, ProviderError, SourceRef};
use crate::config::DeploymentConfig;
use crate::types::{DeploymentId, ProjectId};

const VERCEL_API_URL: &str = "https://api.vercel.com";
const SERVICE: &str = "vercel";

pub struct VercelClient {
    client: Client,
    base_url: String,
    token: SecretString,
    team_id: Option<String>,
    framework: Option<String>,
}

impl VercelClient {
    pub fn new(token: SecretString, team_id: Option<String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(transport(SERVICE))?;

        Ok(Self {
            client,
            base_url: VERCEL_API_URL.to_string(),
            token,
            team_id,
            framework: None,
        })
    }

    pub fn from_config(config: &DeploymentConfig) -> crate::error::Result<Self> {
        let token = config.token.resolve_secret()?;
        let mut client = Self::new(token, config.team_id.clone())?;
        client.framework = config.framework.clone();
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
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(self.token.expose_secret());
        match &self.team_id {
            Some(team) => builder.query(&[("teamId", team)]),
            None => builder,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateProjectBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    framework: Option<&'a str>,
    git_repository: GitRepository,
    environment_variables: Vec<EnvironmentVariable<'a>>,
}

#[derive(Serialize)]
struct GitRepository {
    #[serde(rename = "type")]
    kind: &'static str,
    repo: String,
}

#[derive(Serialize)]
struct EnvironmentVariable<'a> {
    key: &'a str,
    value: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    target: [&'static str; 3],
}

#[derive(Deserialize)]
struct ProjectResponse {
    id: String,
}

#[derive(Serialize)]
struct CreateDeploymentBody<'a> {
    name: &'a str,
    project: &'a str,
    target: &'static str,
    #[serde(rename = "gitSource")]
    git_source: GitSource<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GitSource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    repo_id: &'a str,
    #[serde(rename = "ref")]
    git_ref: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeploymentResponse {
    id: String,
    #[serde(default)]
    ready_state: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

impl DeploymentResponse {
    fn into_snapshot(self) -> DeploymentSnapshot {
        DeploymentSnapshot {
            id: DeploymentId::new(self.id),
            status: self
                .ready_state
                .or(self.status)
                .unwrap_or_else(|| "QUEUED".to_string()),
            url: self.url,
            message: self.error_message,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DomainResponse {
    name: String,
    #[serde(default)]
    verified: bool,
    #[serde(default)]
    cname_target: Option<String>,
}

#[async_trait]
impl DeploymentHost for VercelClient {
    async fn create_project(
        &self,
        name: &str,
        source: &SourceRef,
        env: &[EnvVar],
    ) -> Result<ProjectId, ProviderError> {
        let body = CreateProjectBody {
            name,
            framework: self.framework.as_deref(),
            git_repository: GitRepository {
                kind: "github",
                repo: source.repository.to_string(),
            },
            environment_variables: env
                .iter()
                .map(|var| EnvironmentVariable {
                    key: &var.key,
                    value: var.value.expose_secret(),
                    kind: "encrypted",
                    target: ["production", "preview", "development"],
                })
                .collect(),
        };

        let response = self
            .request(Method::POST, "/v10/projects")
            .json(&body)
            .send()
            .await
            .map_err(transport(SERVICE))?;
        let project: ProjectResponse = decode_json(SERVICE, response).await?;

        tracing::debug!(project = %project.id, env_vars = env.len(), "created project");
        Ok(ProjectId::new(project.id))
    }

    async fn create_deployment(
        &self,
        project: &ProjectId,
        name: &str,
        source: &SourceRef,
    ) -> Result<DeploymentSnapshot, ProviderError> {
        let body = CreateDeploymentBody {
            name,
            project: project.as_str(),
            target: "production",
            git_source: GitSource {
                kind: "github",
                repo_id: source.repository_id.as_str(),
                git_ref: &source.branch,
            },
        };

        let response = self
            .request(Method::POST, "/v13/deployments")
            .json(&body)
            .send()
            .await
            .map_err(transport(SERVICE))?;
        let deployment: DeploymentResponse = decode_json(SERVICE, response).await?;
        Ok(deployment.into_snapshot())
    }

    async fn deployment_status(
        &self,
        id: &DeploymentId,
    ) -> Result<DeploymentSnapshot, ProviderError> {
        let path = format!("/v13/deployments/{}", urlencoding::encode(id.as_str()));
        let response = self
            .request(Method::GET, &path)
            .send()
            .await
            .map_err(transport(SERVICE))?;
        let deployment: DeploymentResponse = decode_json(SERVICE, response).await?;
        Ok(deployment.into_snapshot())
    }

    async fn add_custom_domain(
        &self,
        project: &ProjectId,
        domain: &str,
    ) -> Result<CustomDomain, ProviderError> {
        let path = format!(
            "/v10/projects/{}/domains",
            urlencoding::encode(project.as_str())
        );
        let response = self
            .request(Method::POST, &path)
            .json(&serde_json::json!({ "name": domain }))
            .send()
            .await
            .map_err(transport(SERVICE))?;
        let added: DomainResponse = decode_json(SERVICE, response).await?;

        Ok(CustomDomain {
            name: added.name,
            verified: added.verified,
            cname_target: added.cname_target,
        })
    }
}
