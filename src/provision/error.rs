// ABOUTME: Step error taxonomy and the aggregate failure naming the offending step.
// ABOUTME: Provider, poller, registry and I/O errors all funnel into StepError.

use snafu::Snafu;

use super::StepName;
use crate::dns::ReconcileError;
use crate::poll::PollError;
use crate::providers::ProviderError;
use crate::registry::RegistryError;
use crate::types::JobId;

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("{service} returned {code}: {description}")]
    ExternalService {
        service: String,
        code: String,
        description: String,
    },

    #[error("{operation} not ready after {attempts} attempts (last state: {last_state})")]
    TimeoutExceeded {
        operation: String,
        attempts: u32,
        last_state: String,
    },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("site registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("workspace error: {0}")]
    Workspace(#[from] std::io::Error),

    #[error("step panicked: {0}")]
    Panicked(String),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepErrorKind {
    /// A required credential or parameter was absent.
    ConfigurationMissing,
    /// A provider rejected a call or could not be reached.
    ExternalService,
    /// A readiness budget ran out.
    TimeoutExceeded,
    /// Malformed or conflicting input.
    Validation,
    Registry,
    Workspace,
    /// The step panicked; treated as a failure of that step.
    Panicked,
}

impl StepError {
    pub fn kind(&self) -> StepErrorKind {
        match self {
            StepError::ConfigurationMissing(_) => StepErrorKind::ConfigurationMissing,
            StepError::ExternalService { .. } => StepErrorKind::ExternalService,
            StepError::TimeoutExceeded { .. } => StepErrorKind::TimeoutExceeded,
            StepError::Validation(_) => StepErrorKind::Validation,
            StepError::Registry(_) => StepErrorKind::Registry,
            StepError::Workspace(_) => StepErrorKind::Workspace,
            StepError::Panicked(_) => StepErrorKind::Panicked,
        }
    }

    pub fn external(
        service: impl Into<String>,
        code: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        StepError::ExternalService {
            service: service.into(),
            code: code.into(),
            description: description.into(),
        }
    }
}

impl From<ProviderError> for StepError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Api {
                service,
                code,
                description,
            } => StepError::external(service, code, description),
            ProviderError::Transport { service, source } => {
                StepError::external(service, "transport", source.to_string())
            }
            ProviderError::Decode { service, message } => {
                StepError::external(service, "decode", message)
            }
        }
    }
}

impl<E: Into<StepError>> From<PollError<E>> for StepError {
    fn from(err: PollError<E>) -> Self {
        match err {
            PollError::Failed { source, .. } => source.into(),
            PollError::TimeoutExceeded {
                operation,
                attempts,
                last_state,
            } => StepError::TimeoutExceeded {
                operation,
                attempts,
                last_state,
            },
        }
    }
}

impl From<ReconcileError> for StepError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::Registry(source) => StepError::Registry(source),
            ReconcileError::Push { source, .. } => source.into(),
        }
    }
}

impl From<crate::error::Error> for StepError {
    fn from(err: crate::error::Error) -> Self {
        use crate::error::Error;
        match err {
            Error::MissingEnvVar(var) => StepError::ConfigurationMissing(var),
            Error::Provider(source) => source.into(),
            Error::Registry(source) => StepError::Registry(source),
            Error::Reconcile(source) => source.into(),
            Error::Io(source) => StepError::Workspace(source),
            other => StepError::Validation(other.to_string()),
        }
    }
}

/// A run stopped at `step`. Steps after it were never started.
#[derive(Debug, Snafu)]
#[snafu(
    display("provisioning job {job_id} failed at step {step}: {source}"),
    visibility(pub)
)]
pub struct ProvisionFailure {
    pub job_id: JobId,
    pub step: StepName,
    pub source: StepError,
}

impl ProvisionFailure {
    pub fn step(&self) -> StepName {
        self.step
    }

    pub fn error(&self) -> &StepError {
        &self.source
    }

    pub fn kind(&self) -> StepErrorKind {
        self.source.kind()
    }
}
