// ABOUTME: Provisioning orchestration using the type state pattern.
// ABOUTME: Steps run in a fixed order enforced at compile time.

mod error;
mod orchestrator;
mod provisioning;
mod recorder;
mod report;
mod state;
mod step;
mod transitions;

pub use error::{ProvisionFailure, StepError, StepErrorKind};
pub use orchestrator::{ProvisionSettings, ProvisioningOrchestrator};
pub use provisioning::Provisioning;
pub use report::{
    DatabaseSummary, DeploymentReport, DomainBinding, NotificationOutcome, ProvisioningReport,
    RepositorySummary,
};
pub use state::{
    Configured, DatabaseAllocation, DatabaseReady, Deployed, DomainBound, Notified, Published,
    Recorded, Requested,
};
pub use step::{FILES_PUSHED_PROGRESS, StepName};
pub use transitions::{DATABASE_KEY_ENV, DATABASE_URL_ENV};
