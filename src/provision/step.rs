// ABOUTME: The fixed provisioning step sequence with fatality and progress milestones.
// ABOUTME: Only the notification step is best-effort.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepName {
    AllocateDatabase,
    GenerateConfig,
    PublishRepository,
    Deploy,
    BindDomain,
    Notify,
    RecordSite,
    CleanupWorkspace,
}

/// Progress reported once every file has been pushed.
pub const FILES_PUSHED_PROGRESS: u8 = 45;

impl StepName {
    /// Execution order.
    pub const ALL: [StepName; 8] = [
        StepName::AllocateDatabase,
        StepName::GenerateConfig,
        StepName::PublishRepository,
        StepName::Deploy,
        StepName::BindDomain,
        StepName::Notify,
        StepName::RecordSite,
        StepName::CleanupWorkspace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::AllocateDatabase => "allocate-database",
            StepName::GenerateConfig => "generate-config",
            StepName::PublishRepository => "publish-repository",
            StepName::Deploy => "deploy",
            StepName::BindDomain => "bind-domain",
            StepName::Notify => "notify",
            StepName::RecordSite => "record-site",
            StepName::CleanupWorkspace => "cleanup-workspace",
        }
    }

    /// Whether failure at this step aborts the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, StepName::Notify)
    }

    /// Progress recorded when the step completes.
    pub fn milestone(&self) -> u8 {
        match self {
            StepName::AllocateDatabase => 15,
            StepName::GenerateConfig => 30,
            StepName::PublishRepository => 55,
            StepName::Deploy => 85,
            StepName::BindDomain => 90,
            StepName::Notify => 95,
            StepName::RecordSite => 98,
            StepName::CleanupWorkspace => 100,
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(StepName::as_str).collect()
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
