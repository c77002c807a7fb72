// ABOUTME: Configuration types and parsing for sitesmith.yml.
// ABOUTME: Handles YAML parsing, credential interpolation, and config discovery.

mod deserialize;
mod env_value;
mod init;
mod polling;
mod providers;

pub use env_value::{EnvValue, resolve_secret_map};
pub use init::init_config;
pub use polling::{DeploymentPollSettings, PollSettings, PollingConfig};
pub use providers::{
    DatabaseConfig, DeploymentConfig, DnsConfig, NotificationConfig, RegistryConfig,
    RepositoryConfig, SubdomainRecordConfig, TemplateConfig,
};

use crate::error::{Error, Result};
use crate::provision::StepName;
use crate::types::DomainName;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "sitesmith.yml";
pub const CONFIG_FILENAME_ALT: &str = "sitesmith.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".sitesmith/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Parent domain every site is provisioned under.
    pub domain: DomainName,

    pub dns: DnsConfig,

    pub repository: RepositoryConfig,

    pub deployment: DeploymentConfig,

    pub database: DatabaseConfig,

    pub template: TemplateConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub polling: PollingConfig,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        if let Some(dir) = path.parent() {
            config.rebase_paths(dir);
        }
        Ok(config)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    fn validate(&self) -> Result<()> {
        let deployment = &self.polling.deployment;
        let milestone = StepName::Deploy.milestone();
        if deployment.progress_ceiling > milestone
            || deployment.progress_start > deployment.progress_ceiling
        {
            return Err(Error::InvalidConfig(format!(
                "deployment progress must satisfy start ({}) <= ceiling ({}) <= {milestone}",
                deployment.progress_start, deployment.progress_ceiling
            )));
        }

        if !self.dns.default_records.iter().any(|r| r.host_name == "@") {
            return Err(Error::InvalidConfig(
                "dns.default_records must include the apex record '@'".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolve relative paths against the directory holding the config file.
    fn rebase_paths(&mut self, dir: &Path) {
        self.registry.path = rebase(dir, &self.registry.path);
        self.template.path = rebase(dir, &self.template.path);
    }
}

fn rebase(dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        dir.join(path)
    }
}
