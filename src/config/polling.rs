// ABOUTME: Readiness polling budgets for eventually-consistent providers.
// ABOUTME: Interval x attempt count replaces wall-clock deadlines.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PollSettings {
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    pub max_attempts: u32,
}

impl PollSettings {
    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DeploymentPollSettings {
    #[serde(default = "default_deployment_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_deployment_attempts")]
    pub max_attempts: u32,

    /// Progress reported before the first poll.
    #[serde(default = "default_progress_start")]
    pub progress_start: u8,

    #[serde(default = "default_progress_step")]
    pub progress_step: u8,

    /// Upper bound while the build is still running.
    #[serde(default = "default_progress_ceiling")]
    pub progress_ceiling: u8,
}

impl Default for DeploymentPollSettings {
    fn default() -> Self {
        Self {
            interval: default_deployment_interval(),
            max_attempts: default_deployment_attempts(),
            progress_start: default_progress_start(),
            progress_step: default_progress_step(),
            progress_ceiling: default_progress_ceiling(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_repository")]
    pub repository: PollSettings,

    #[serde(default = "default_database")]
    pub database: PollSettings,

    #[serde(default)]
    pub deployment: DeploymentPollSettings,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            repository: default_repository(),
            database: default_database(),
            deployment: DeploymentPollSettings::default(),
        }
    }
}

fn default_repository() -> PollSettings {
    PollSettings::new(Duration::from_secs(2), 10)
}

fn default_database() -> PollSettings {
    PollSettings::new(Duration::from_secs(5), 36)
}

fn default_deployment_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_deployment_attempts() -> u32 {
    60
}

fn default_progress_start() -> u8 {
    55
}

fn default_progress_step() -> u8 {
    10
}

fn default_progress_ceiling() -> u8 {
    85
}
