// ABOUTME: Deployment lifecycle tracking on top of the readiness poller.
// ABOUTME: Normalizes provider states and estimates build progress.

mod status;
mod tracker;

pub use status::{DeploymentState, DeploymentStatus};
pub use tracker::{DeploymentOutcome, DeploymentProgress, DeploymentStatusTracker, ProgressEstimate};
