// ABOUTME: State transition methods for the provisioning run.
// ABOUTME: Each method consumes self and returns the next state on success.

use secrecy::{ExposeSecret, SecretString};

use super::ProvisionSettings;
use super::error::StepError;
use super::provisioning::Provisioning;
use super::recorder::StepRecorder;
use super::report::{
    DeploymentReport, DomainBinding, NotificationOutcome, ProvisioningReport, RepositorySummary,
};
use super::state::{
    Configured, DatabaseAllocation, DatabaseReady, Deployed, DomainBound, Notified, Published,
    Recorded, Requested,
};
use super::step::{FILES_PUSHED_PROGRESS, StepName};
use crate::deployment::{DeploymentOutcome, DeploymentState, DeploymentStatusTracker};
use crate::diagnostics::Warning;
use crate::dns::{DnsReconciler, DnsRecord, RecordType};
use crate::poll::{Readiness, ReadinessPoller};
use crate::providers::{
    EnvVar, ProviderError, Providers, RepositoryHost, RepositoryRef, SiteNotice, SourceRef,
};
use crate::registry::{NewSite, SiteRegistry};
use crate::site::{SiteConfiguration, SiteTemplate, Workspace};

/// Environment names the deployment always receives; request secrets may not reuse them.
pub const DATABASE_URL_ENV: &str = "NEXT_PUBLIC_SUPABASE_URL";
pub const DATABASE_KEY_ENV: &str = "NEXT_PUBLIC_SUPABASE_ANON_KEY";

/// Collaborators shared by every step of one run.
pub(crate) struct RunContext<'a> {
    pub(crate) providers: &'a Providers,
    pub(crate) settings: &'a ProvisionSettings,
    pub(crate) template: &'a dyn SiteTemplate,
    pub(crate) reconciler: &'a DnsReconciler,
    pub(crate) registry: &'a dyn SiteRegistry,
    pub(crate) recorder: &'a StepRecorder,
}

// =============================================================================
// Requested -> DatabaseReady
// =============================================================================

impl Provisioning<Requested> {
    /// Create the site's database and wait until it is healthy.
    ///
    /// # Errors
    ///
    /// Returns `StepError::Validation` when the subdomain is already
    /// registered, and `StepError::TimeoutExceeded` when the database never
    /// reports healthy within the polling budget.
    pub(crate) async fn allocate_database(
        self,
        cx: &RunContext<'_>,
    ) -> Result<Provisioning<DatabaseReady>, StepError> {
        if let Some(existing) = cx
            .registry
            .find_by_subdomain(&self.domain, &self.request.subdomain)
            .await?
        {
            return Err(StepError::Validation(format!(
                "{} is already provisioned as site {}",
                existing.fqdn, existing.id
            )));
        }

        let provisioner = cx.providers.database.as_ref();
        let id = provisioner
            .create_database(self.request.subdomain.as_str())
            .await?;

        let poller = ReadinessPoller::from(cx.settings.polling.database);
        let probe_id = &id;
        poller
            .poll("database readiness", move |_| async move {
                let status = provisioner.database_status(probe_id).await?;
                if status.healthy {
                    Ok::<_, ProviderError>(Readiness::Ready(()))
                } else {
                    Ok(Readiness::NotReady(status.state))
                }
            })
            .await?;

        let credentials = provisioner.database_credentials(&id).await?;
        cx.recorder
            .complete(StepName::AllocateDatabase, format!("database {id} is healthy"));

        Ok(self.advance(DatabaseReady {
            database: DatabaseAllocation {
                id,
                api_url: credentials.api_url,
                anon_key: credentials.anon_key,
            },
        }))
    }
}

// =============================================================================
// DatabaseReady -> Configured
// =============================================================================

impl Provisioning<DatabaseReady> {
    /// Render the site into a fresh workspace.
    ///
    /// # Errors
    ///
    /// Returns `StepError::Workspace` on I/O failure, or
    /// `StepError::Validation` if the template produced no files.
    pub(crate) async fn generate_config(
        self,
        cx: &RunContext<'_>,
    ) -> Result<Provisioning<Configured>, StepError> {
        let site = SiteConfiguration::from_request(
            &self.request,
            &self.fqdn,
            &self.state.database.api_url,
        );

        let workspace = Workspace::create(self.request.subdomain.as_str())?;
        let files = cx.template.render(&site, workspace.path())?;
        if files.is_empty() {
            return Err(StepError::Validation(
                "site template rendered no files".to_string(),
            ));
        }

        cx.recorder.complete(
            StepName::GenerateConfig,
            format!("rendered {} files", files.len()),
        );

        Ok(self.map_state(|state| Configured {
            database: state.database,
            workspace,
            files,
        }))
    }
}

// =============================================================================
// Configured -> Published
// =============================================================================

impl Provisioning<Configured> {
    /// Create the repository, push every file, and wait for the default
    /// branch to become readable.
    ///
    /// Files are pushed one at a time with the configured delay between them.
    pub(crate) async fn publish_repository(
        self,
        cx: &RunContext<'_>,
    ) -> Result<Provisioning<Published>, StepError> {
        let host = cx.providers.repository.as_ref();
        let description = format!("Website for {}", self.request.site_name);
        let repository = host
            .create_repository(self.request.subdomain.as_str(), &description)
            .await?;
        let reference = &repository.reference;
        let branch = repository.default_branch.as_str();

        for (index, file) in self.state.files.iter().enumerate() {
            if index > 0 && !cx.settings.push_delay.is_zero() {
                tokio::time::sleep(cx.settings.push_delay).await;
            }
            let version = host.file_version(reference, branch, &file.path).await?;
            let message = if version.is_some() {
                format!("Update {}", file.path)
            } else {
                format!("Add {}", file.path)
            };
            host.put_file(reference, branch, file, &message, version.as_deref())
                .await?;
            tracing::debug!(repository = %reference, path = %file.path, "pushed file");
        }

        let files_pushed = self.state.files.len();
        cx.recorder.progress(
            StepName::PublishRepository,
            format!("pushed {files_pushed} files to {reference}"),
            FILES_PUSHED_PROGRESS,
        );

        let poller = ReadinessPoller::from(cx.settings.polling.repository);
        poller
            .poll("repository readiness", move |_| {
                repository_readiness(host, reference, branch)
            })
            .await?;

        cx.recorder.complete(
            StepName::PublishRepository,
            format!("{reference} is ready on {branch}"),
        );

        let source = SourceRef {
            repository: repository.reference.clone(),
            repository_id: repository.id.clone(),
            branch: repository.default_branch.clone(),
        };
        let summary = RepositorySummary {
            id: repository.id,
            full_name: repository.reference.to_string(),
            html_url: repository.html_url,
            default_branch: repository.default_branch,
            files_pushed,
        };

        Ok(self.map_state(|state| Published {
            database: state.database,
            workspace: state.workspace,
            repository: summary,
            source,
        }))
    }
}

/// Exists, has history, and serves `branch`, checked in that order.
async fn repository_readiness(
    host: &dyn RepositoryHost,
    repo: &RepositoryRef,
    branch: &str,
) -> Result<Readiness<(), String>, ProviderError> {
    if !host.repository_exists(repo).await? {
        return Ok(Readiness::NotReady("repository missing".to_string()));
    }
    if !host.has_commits(repo).await? {
        return Ok(Readiness::NotReady("no commits".to_string()));
    }
    if !host.branch_exists(repo, branch).await? {
        return Ok(Readiness::NotReady(format!("branch {branch} missing")));
    }
    Ok(Readiness::Ready(()))
}

// =============================================================================
// Published -> Deployed
// =============================================================================

impl Provisioning<Published> {
    /// Deployment environment: database credentials, then request secrets.
    fn environment(&self) -> Vec<EnvVar> {
        let database = &self.state.database;
        let mut env = vec![
            EnvVar::new(DATABASE_URL_ENV, SecretString::from(database.api_url.clone())),
            EnvVar::new(
                DATABASE_KEY_ENV,
                SecretString::from(database.anon_key.expose_secret().to_string()),
            ),
        ];

        for (key, value) in &self.request.secrets {
            if key == DATABASE_URL_ENV || key == DATABASE_KEY_ENV {
                tracing::warn!(key = %key, "request secret shadows a reserved variable; skipping");
                continue;
            }
            env.push(EnvVar::new(
                key.as_str(),
                SecretString::from(value.expose_secret().to_string()),
            ));
        }
        env
    }

    /// Create the project and its first deployment, then follow the build.
    ///
    /// A build still running when polling stops completes the step with a
    /// warning. A failed or canceled build fails it.
    pub(crate) async fn deploy(
        self,
        cx: &RunContext<'_>,
    ) -> Result<Provisioning<Deployed>, StepError> {
        let host = cx.providers.deployment.as_ref();
        let name = self.request.subdomain.as_str();
        let env = self.environment();

        let project_id = host.create_project(name, &self.state.source, &env).await?;
        let snapshot = host
            .create_deployment(&project_id, name, &self.state.source)
            .await?;
        let initial = DeploymentState::from(snapshot);
        let deployment_id = initial.id.clone();

        let tracker = DeploymentStatusTracker::from(&cx.settings.polling.deployment);
        cx.recorder.progress(
            StepName::Deploy,
            format!("deployment {deployment_id} is {}", initial.status),
            tracker.estimate().start,
        );

        let outcome = tracker
            .track(host, initial, |update| {
                cx.recorder.progress(
                    StepName::Deploy,
                    format!("deployment {deployment_id} is {}", update.status),
                    update.progress,
                );
            })
            .await?;

        match &outcome {
            DeploymentOutcome::Ready { url } => {
                let url = url.as_deref().unwrap_or("(no url reported)");
                cx.recorder
                    .complete(StepName::Deploy, format!("deployment ready at {url}"));
            }
            DeploymentOutcome::InProgress { status, .. } => {
                let message = format!(
                    "deployment {deployment_id} still building ({status}); check back later"
                );
                cx.recorder
                    .warn(Warning::deployment_pending(message.clone()));
                cx.recorder.complete(StepName::Deploy, message);
            }
            DeploymentOutcome::Failed { status, message } => {
                return Err(StepError::external(
                    "deployment",
                    status.as_str(),
                    message
                        .clone()
                        .unwrap_or_else(|| format!("deployment {deployment_id} ended {status}")),
                ));
            }
        }

        Ok(self.map_state(|state| Deployed {
            database: state.database,
            workspace: state.workspace,
            repository: state.repository,
            deployment: DeploymentReport {
                project_id,
                deployment_id,
                outcome,
            },
        }))
    }
}

// =============================================================================
// Deployed -> DomainBound
// =============================================================================

impl Provisioning<Deployed> {
    /// Attach the site's domain to the project and push the domain's full
    /// DNS record set with the site's record upserted.
    pub(crate) async fn bind_domain(
        self,
        cx: &RunContext<'_>,
    ) -> Result<Provisioning<DomainBound>, StepError> {
        let custom = cx
            .providers
            .deployment
            .add_custom_domain(&self.state.deployment.project_id, &self.fqdn)
            .await?;

        let record = match custom.cname_target {
            Some(target) => DnsRecord::new(
                self.request.subdomain.as_str(),
                RecordType::Cname,
                target,
                cx.reconciler.settings().subdomain_template.ttl,
            ),
            None => cx
                .reconciler
                .subdomain_record(&self.domain, &self.request.subdomain),
        };

        let set = cx
            .reconciler
            .reconcile_and_push(cx.providers.dns.as_ref(), &self.domain, Some(record.clone()))
            .await?;

        if !custom.verified {
            cx.recorder.warn(Warning::domain_unverified(format!(
                "{} is not verified by the deployment provider yet",
                self.fqdn
            )));
        }

        cx.recorder.complete(
            StepName::BindDomain,
            format!("{} -> {} ({} records pushed)", self.fqdn, record.address, set.len()),
        );

        let binding = DomainBinding {
            fqdn: self.fqdn.clone(),
            record,
            verified: custom.verified,
            records_pushed: set.len(),
        };

        Ok(self.map_state(|state| DomainBound {
            database: state.database,
            workspace: state.workspace,
            repository: state.repository,
            deployment: state.deployment,
            binding,
        }))
    }
}

// =============================================================================
// DomainBound -> Notified
// =============================================================================

impl Provisioning<DomainBound> {
    pub(crate) fn notice(&self) -> SiteNotice {
        SiteNotice {
            owner: self.request.owner.clone(),
            site_name: self.request.site_name.clone(),
            fqdn: self.fqdn.clone(),
            url: self.site_url(),
            repository_url: self.state.repository.html_url.clone(),
            contact_email: self.request.contact.email.clone(),
            still_building: self.state.deployment.still_building(),
        }
    }

    /// Deliver the site notice. Failure here never stops the run.
    pub(crate) async fn send_notice(&self, cx: &RunContext<'_>) -> Result<(), StepError> {
        cx.providers.notifier.notify(&self.notice()).await?;
        cx.recorder
            .complete(StepName::Notify, format!("notified {}", self.request.owner));
        Ok(())
    }

    pub(crate) fn notified(self, notification: NotificationOutcome) -> Provisioning<Notified> {
        self.map_state(|state| Notified {
            database: state.database,
            workspace: state.workspace,
            repository: state.repository,
            deployment: state.deployment,
            binding: state.binding,
            notification,
        })
    }
}

// =============================================================================
// Notified -> Recorded
// =============================================================================

impl Provisioning<Notified> {
    pub(crate) async fn record_site(
        self,
        cx: &RunContext<'_>,
    ) -> Result<Provisioning<Recorded>, StepError> {
        let site = cx
            .registry
            .record_site(NewSite {
                owner: self.request.owner.clone(),
                subdomain: self.request.subdomain.clone(),
                domain: self.domain.clone(),
                url: self.site_url(),
                repository_url: self.state.repository.html_url.clone(),
                project_id: self.state.deployment.project_id.clone(),
                database_id: self.state.database.id.clone(),
            })
            .await?;

        cx.recorder
            .complete(StepName::RecordSite, format!("recorded site {}", site.id));

        Ok(self.map_state(|state| Recorded {
            database: state.database,
            workspace: state.workspace,
            repository: state.repository,
            deployment: state.deployment,
            binding: state.binding,
            notification: state.notification,
            site,
        }))
    }
}

// =============================================================================
// Recorded -> report
// =============================================================================

impl Provisioning<Recorded> {
    /// Remove the workspace and assemble the run's report.
    ///
    /// Warnings are attached by the orchestrator once the job is finished.
    pub(crate) async fn cleanup_workspace(
        self,
        cx: &RunContext<'_>,
    ) -> Result<ProvisioningReport, StepError> {
        let url = self.site_url();
        let state = self.state;
        state.workspace.close()?;
        cx.recorder
            .complete(StepName::CleanupWorkspace, "workspace removed");

        Ok(ProvisioningReport {
            job_id: self.job_id,
            site_id: state.site.id,
            fqdn: self.fqdn,
            url,
            database: state.database.summary(),
            repository: state.repository,
            deployment: state.deployment,
            binding: state.binding,
            notification: state.notification,
            warnings: Vec::new(),
        })
    }
}
