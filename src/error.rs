// ABOUTME: Application-wide error types for sitesmith.
// ABOUTME: Wraps config, registry, provider, and provisioning failures for the CLI.

use std::path::PathBuf;
use thiserror::Error;

use crate::dns::ReconcileError;
use crate::provision::ProvisionFailure;
use crate::providers::ProviderError;
use crate::registry::RegistryError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("configuration missing: environment variable {0} is not set")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Provision(#[from] Box<ProvisionFailure>),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl From<ProvisionFailure> for Error {
    fn from(err: ProvisionFailure) -> Self {
        Error::Provision(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
