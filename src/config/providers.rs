// ABOUTME: Per-provider credentials and endpoints.
// ABOUTME: Secrets are EnvValues resolved only when clients are built.

use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::EnvValue;
use super::deserialize::deserialize_default_records;
use crate::dns::{DnsRecord, RecordType};

#[derive(Debug, Clone, Deserialize)]
pub struct DnsConfig {
    pub api_user: String,
    pub api_key: EnvValue,

    /// Whitelisted client IP; looked up from a public echo service when unset.
    #[serde(default)]
    pub client_ip: Option<String>,

    #[serde(default)]
    pub sandbox: bool,

    #[serde(default)]
    pub api_url: Option<String>,

    /// Records every managed domain carries (apex and `www` at minimum).
    #[serde(deserialize_with = "deserialize_default_records")]
    pub default_records: NonEmpty<DnsRecord>,

    pub subdomain_record: SubdomainRecordConfig,

    /// Carry over live records the registry does not know about.
    #[serde(default)]
    pub include_live_records: bool,
}

/// Template for the record of each provisioned subdomain.
#[derive(Debug, Clone, Deserialize)]
pub struct SubdomainRecordConfig {
    #[serde(rename = "type", default = "default_subdomain_type")]
    pub record_type: RecordType,
    pub address: String,
    #[serde(default = "default_subdomain_ttl")]
    pub ttl: u32,
}

fn default_subdomain_type() -> RecordType {
    RecordType::Cname
}

fn default_subdomain_ttl() -> u32 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryConfig {
    pub owner: String,

    /// Create repositories under an organization rather than the token's user.
    #[serde(default)]
    pub organization: bool,

    pub token: EnvValue,

    #[serde(default = "default_branch")]
    pub default_branch: String,

    #[serde(default = "default_private")]
    pub private: bool,

    /// Pause between file pushes to stay under secondary rate limits.
    #[serde(default = "default_push_delay", with = "humantime_serde")]
    pub push_delay: Duration,

    #[serde(default)]
    pub api_url: Option<String>,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_private() -> bool {
    true
}

fn default_push_delay() -> Duration {
    Duration::from_millis(500)
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentConfig {
    pub token: EnvValue,

    #[serde(default)]
    pub team_id: Option<String>,

    #[serde(default)]
    pub framework: Option<String>,

    #[serde(default)]
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub access_token: EnvValue,
    pub organization_id: String,

    #[serde(default = "default_region")]
    pub region: String,

    pub db_password: EnvValue,

    #[serde(default)]
    pub api_url: Option<String>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationConfig {
    /// Receives a JSON notice per provisioned site; log-only when unset.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_path")]
    pub path: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
        }
    }
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("sites.json")
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfig {
    pub path: PathBuf,
}
