// ABOUTME: Source repository client for the GitHub REST API.
// ABOUTME: Creates repositories, pushes files through the contents API, and probes readiness.

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::error::{decode_json, ensure_success, transport};
use super::{ProviderError, Repository, RepositoryHost, RepositoryRef};
use crate::config::RepositoryConfig;
use crate::site::SourceFile;
use crate::types::RepositoryId;

const GITHUB_API_URL: &str = "https://api.github.com";
const SERVICE: &str = "github";

pub struct GitHubClient {
    client: Client,
    base_url: String,
    token: SecretString,
    owner: String,
    organization: bool,
    private: bool,
}

impl GitHubClient {
    pub fn new(
        token: SecretString,
        owner: impl Into<String>,
        organization: bool,
        private: bool,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(concat!("sitesmith/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(transport(SERVICE))?;

        Ok(Self {
            client,
            base_url: GITHUB_API_URL.to_string(),
            token,
            owner: owner.into(),
            organization,
            private,
        })
    }

    pub fn from_config(config: &RepositoryConfig) -> crate::error::Result<Self> {
        let token = config.token.resolve_secret()?;
        let mut client = Self::new(token, &config.owner, config.organization, config.private)?;
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
            .bearer_auth(self.token.expose_secret())
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    /// GET that maps 404 (and 409 for empty repositories) to `None`.
    async fn probe(&self, path: &str) -> Result<Option<reqwest::Response>, ProviderError> {
        let response = self
            .request(Method::GET, path)
            .send()
            .await
            .map_err(transport(SERVICE))?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::CONFLICT => Ok(None),
            _ => ensure_success(SERVICE, response).await.map(Some),
        }
    }
}

fn repo_path(repo: &RepositoryRef) -> String {
    format!(
        "/repos/{}/{}",
        urlencoding::encode(&repo.owner),
        urlencoding::encode(&repo.name)
    )
}

/// Encode each segment of a file path, keeping the separators.
fn contents_path(repo: &RepositoryRef, path: &str) -> String {
    let encoded: Vec<_> = path
        .trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("{}/contents/{}", repo_path(repo), encoded.join("/"))
}

#[derive(Serialize)]
struct CreateRepositoryBody<'a> {
    name: &'a str,
    description: &'a str,
    private: bool,
    auto_init: bool,
}

#[derive(Deserialize)]
struct RepositoryResponse {
    id: u64,
    name: String,
    html_url: String,
    clone_url: String,
    default_branch: Option<String>,
    owner: OwnerResponse,
}

#[derive(Deserialize)]
struct OwnerResponse {
    login: String,
}

#[derive(Deserialize)]
struct ContentResponse {
    sha: String,
}

#[derive(Serialize)]
struct PutContentBody<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[async_trait]
impl RepositoryHost for GitHubClient {
    async fn create_repository(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Repository, ProviderError> {
        let path = if self.organization {
            format!("/orgs/{}/repos", urlencoding::encode(&self.owner))
        } else {
            "/user/repos".to_string()
        };

        let body = CreateRepositoryBody {
            name,
            description,
            private: self.private,
            auto_init: true,
        };

        let response = self
            .request(Method::POST, &path)
            .json(&body)
            .send()
            .await
            .map_err(transport(SERVICE))?;
        let created: RepositoryResponse = decode_json(SERVICE, response).await?;

        tracing::debug!(repository = %created.name, "created repository");

        Ok(Repository {
            id: RepositoryId::new(created.id.to_string()),
            reference: RepositoryRef::new(created.owner.login, created.name),
            html_url: created.html_url,
            clone_url: created.clone_url,
            default_branch: created.default_branch.unwrap_or_else(|| "main".to_string()),
        })
    }

    async fn file_version(
        &self,
        repo: &RepositoryRef,
        branch: &str,
        path: &str,
    ) -> Result<Option<String>, ProviderError> {
        let url = format!(
            "{}?ref={}",
            contents_path(repo, path),
            urlencoding::encode(branch)
        );
        match self.probe(&url).await? {
            Some(response) => {
                let body = response.text().await.map_err(transport(SERVICE))?;
                let content: ContentResponse =
                    serde_json::from_str(&body).map_err(|e| ProviderError::Decode {
                        service: SERVICE,
                        message: e.to_string(),
                    })?;
                Ok(Some(content.sha))
            }
            None => Ok(None),
        }
    }

    async fn put_file(
        &self,
        repo: &RepositoryRef,
        branch: &str,
        file: &SourceFile,
        message: &str,
        version: Option<&str>,
    ) -> Result<(), ProviderError> {
        let body = PutContentBody {
            message,
            content: base64::engine::general_purpose::STANDARD.encode(&file.contents),
            branch,
            sha: version,
        };

        let response = self
            .request(Method::PUT, &contents_path(repo, &file.path))
            .json(&body)
            .send()
            .await
            .map_err(transport(SERVICE))?;
        ensure_success(SERVICE, response).await?;
        Ok(())
    }

    async fn repository_exists(&self, repo: &RepositoryRef) -> Result<bool, ProviderError> {
        Ok(self.probe(&repo_path(repo)).await?.is_some())
    }

    async fn has_commits(&self, repo: &RepositoryRef) -> Result<bool, ProviderError> {
        let url = format!("{}/commits?per_page=1", repo_path(repo));
        match self.probe(&url).await? {
            Some(response) => {
                let body = response.text().await.map_err(transport(SERVICE))?;
                let commits: Vec<serde_json::Value> =
                    serde_json::from_str(&body).map_err(|e| ProviderError::Decode {
                        service: SERVICE,
                        message: e.to_string(),
                    })?;
                Ok(!commits.is_empty())
            }
            None => Ok(false),
        }
    }

    async fn branch_exists(
        &self,
        repo: &RepositoryRef,
        branch: &str,
    ) -> Result<bool, ProviderError> {
        let url = format!(
            "{}/branches/{}",
            repo_path(repo),
            urlencoding::encode(branch)
        );
        Ok(self.probe(&url).await?.is_some())
    }
}
