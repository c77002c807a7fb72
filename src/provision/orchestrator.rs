// ABOUTME: Runs the provisioning steps in order against the configured providers.
// ABOUTME: Stops at the first fatal failure; the notification step is best-effort.

use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use super::error::{ProvisionFailure, StepError};
use super::provisioning::Provisioning;
use super::recorder::StepRecorder;
use super::report::{NotificationOutcome, ProvisioningReport};
use super::step::StepName;
use super::transitions::RunContext;
use crate::config::{Config, PollingConfig};
use crate::diagnostics::Warning;
use crate::dns::{DnsReconciler, DomainLocks, ReconcileSettings};
use crate::providers::Providers;
use crate::registry::{JsonFileRegistry, SiteRegistry};
use crate::request::ProvisioningRequest;
use crate::site::{DirectoryTemplate, SiteTemplate};
use crate::steps::{JobStatus, StepTracker};
use crate::types::{DomainName, JobId};

/// Everything a run needs from configuration besides provider credentials.
#[derive(Debug, Clone)]
pub struct ProvisionSettings {
    pub domain: DomainName,
    pub polling: PollingConfig,
    /// Pause between consecutive file pushes.
    pub push_delay: Duration,
    pub dns: ReconcileSettings,
}

impl ProvisionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            domain: config.domain.clone(),
            polling: config.polling,
            push_delay: config.repository.push_delay,
            dns: ReconcileSettings::from(&config.dns),
        }
    }
}

pub struct ProvisioningOrchestrator {
    settings: ProvisionSettings,
    providers: Providers,
    template: Arc<dyn SiteTemplate>,
    registry: Arc<dyn SiteRegistry>,
    reconciler: DnsReconciler,
    tracker: Arc<StepTracker>,
}

impl ProvisioningOrchestrator {
    pub fn new(
        settings: ProvisionSettings,
        providers: Providers,
        template: Arc<dyn SiteTemplate>,
        registry: Arc<dyn SiteRegistry>,
        tracker: Arc<StepTracker>,
    ) -> Self {
        let reconciler = DnsReconciler::new(registry.clone(), settings.dns.clone());
        Self {
            settings,
            providers,
            template,
            registry,
            reconciler,
            tracker,
        }
    }

    /// Wire real provider clients, the directory template, and the JSON
    /// registry from configuration.
    ///
    /// # Errors
    ///
    /// Fails when a credential cannot be resolved.
    pub fn from_config(config: &Config, tracker: Arc<StepTracker>) -> crate::error::Result<Self> {
        let providers = Providers::from_config(config)?;
        let template = Arc::new(DirectoryTemplate::new(config.template.path.clone()));
        let registry = Arc::new(JsonFileRegistry::new(config.registry.path.clone()));
        Ok(Self::new(
            ProvisionSettings::from_config(config),
            providers,
            template,
            registry,
            tracker,
        ))
    }

    /// Share DNS locks with other reconcilers in this process.
    pub fn with_locks(mut self, locks: DomainLocks) -> Self {
        self.reconciler = DnsReconciler::new(self.registry.clone(), self.settings.dns.clone())
            .with_locks(locks);
        self
    }

    pub fn tracker(&self) -> &Arc<StepTracker> {
        &self.tracker
    }

    pub fn settings(&self) -> &ProvisionSettings {
        &self.settings
    }

    /// Run a request under a freshly generated job id.
    pub async fn run(
        &self,
        request: ProvisioningRequest,
    ) -> Result<ProvisioningReport, ProvisionFailure> {
        self.run_job(JobId::generate(), request).await
    }

    /// Run a request under `job_id`, which observers may already be watching.
    ///
    /// # Errors
    ///
    /// Returns the first fatal step failure. Steps after it stay pending and
    /// nothing already created is rolled back.
    pub async fn run_job(
        &self,
        job_id: JobId,
        request: ProvisioningRequest,
    ) -> Result<ProvisioningReport, ProvisionFailure> {
        if let Err(e) = self.tracker.create_job(job_id.clone(), &StepName::names()) {
            return Err(ProvisionFailure {
                job_id,
                step: StepName::AllocateDatabase,
                source: StepError::Validation(e.to_string()),
            });
        }

        let recorder = StepRecorder::new(self.tracker.clone(), job_id.clone());
        let cx = RunContext {
            providers: &self.providers,
            settings: &self.settings,
            template: self.template.as_ref(),
            reconciler: &self.reconciler,
            registry: self.registry.as_ref(),
            recorder: &recorder,
        };

        let domain = self.settings.domain.clone();
        let run = Provisioning::new(job_id.clone(), Arc::new(request), domain);
        tracing::info!(job = %job_id, fqdn = %run.fqdn(), "provisioning started");

        let run = execute(&cx, StepName::AllocateDatabase, run.allocate_database(&cx)).await?;
        let run = execute(&cx, StepName::GenerateConfig, run.generate_config(&cx)).await?;
        let run = execute(&cx, StepName::PublishRepository, run.publish_repository(&cx)).await?;
        let run = execute(&cx, StepName::Deploy, run.deploy(&cx)).await?;
        let run = execute(&cx, StepName::BindDomain, run.bind_domain(&cx)).await?;

        let notice = execute_best_effort(&cx, StepName::Notify, run.send_notice(&cx)).await;
        let notification = match notice {
            Ok(()) => NotificationOutcome::Sent,
            Err(reason) => NotificationOutcome::Failed { reason },
        };
        let run = run.notified(notification);

        let run = execute(&cx, StepName::RecordSite, run.record_site(&cx)).await?;
        let mut report =
            execute(&cx, StepName::CleanupWorkspace, run.cleanup_workspace(&cx)).await?;

        recorder.finish(JobStatus::Succeeded);
        report.warnings = recorder.take_warnings();
        tracing::info!(job = %job_id, url = %report.url, "provisioning finished");
        Ok(report)
    }
}

/// Start `step`, run it, and convert a panic into a step failure.
async fn attempt<T, F>(cx: &RunContext<'_>, step: StepName, fut: F) -> Result<T, StepError>
where
    F: Future<Output = Result<T, StepError>>,
{
    cx.recorder.start(step);
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(StepError::Panicked(panic_message(payload.as_ref()))),
    }
}

/// Run a fatal step. On failure the step and the job are marked failed and
/// the run ends.
async fn execute<T, F>(cx: &RunContext<'_>, step: StepName, fut: F) -> Result<T, ProvisionFailure>
where
    F: Future<Output = Result<T, StepError>>,
{
    debug_assert!(step.is_fatal());
    match attempt(cx, step, fut).await {
        Ok(value) => Ok(value),
        Err(source) => {
            cx.recorder.fail(step, source.to_string());
            cx.recorder.finish(JobStatus::Failed);
            Err(ProvisionFailure {
                job_id: cx.recorder.job_id().clone(),
                step,
                source,
            })
        }
    }
}

/// Run a best-effort step. Failure marks only the step and leaves a warning.
async fn execute_best_effort<F>(cx: &RunContext<'_>, step: StepName, fut: F) -> Result<(), String>
where
    F: Future<Output = Result<(), StepError>>,
{
    debug_assert!(!step.is_fatal());
    attempt(cx, step, fut).await.map_err(|source| {
        let reason = source.to_string();
        cx.recorder.fail(step, reason.clone());
        cx.recorder
            .warn(Warning::notification_failed(format!("{step} failed: {reason}")));
        reason
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
