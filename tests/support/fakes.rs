// ABOUTME: Scriptable in-memory fakes for every provider boundary.
// ABOUTME: Each fake records its calls so tests can assert on side effects.

use async_trait::async_trait;
use parking_lot::Mutex;
use secrecy::{ExposeSecret, SecretString};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use sitesmith::config::{DeploymentPollSettings, PollSettings, PollingConfig};
use sitesmith::dns::{DnsRecord, DnsRecordSet, RecordType, ReconcileSettings, SubdomainTemplate};
use sitesmith::providers::{
    CustomDomain, DatabaseCredentials, DatabaseProvisioner, DatabaseStatus, DeploymentHost,
    DeploymentSnapshot, DnsHost, EnvVar, Notifier, ProviderError, Providers, Repository,
    RepositoryHost, RepositoryRef, SiteNotice, SourceRef,
};
use sitesmith::provision::ProvisionSettings;
use sitesmith::request::ProvisioningRequest;
use sitesmith::site::{SiteConfiguration, SiteTemplate, SourceFile};
use sitesmith::types::{DatabaseId, DeploymentId, DomainName, ProjectId, RepositoryId, Subdomain};

pub const DOMAIN: &str = "example.com";
pub const APEX_ADDRESS: &str = "76.76.21.21";
pub const CNAME_TARGET: &str = "cname.vercel-dns.com";

pub fn domain() -> DomainName {
    DomainName::parse(DOMAIN).unwrap()
}

pub fn default_records() -> Vec<DnsRecord> {
    vec![
        DnsRecord::new("@", RecordType::A, APEX_ADDRESS, 1800),
        DnsRecord::new("www", RecordType::Cname, CNAME_TARGET, 1800),
    ]
}

pub fn reconcile_settings() -> ReconcileSettings {
    ReconcileSettings {
        default_records: default_records(),
        subdomain_template: SubdomainTemplate {
            record_type: RecordType::Cname,
            address: CNAME_TARGET.to_string(),
            ttl: 300,
        },
        include_live_records: false,
    }
}

/// Production-like budgets; tests run them on a paused clock.
pub fn settings() -> ProvisionSettings {
    ProvisionSettings {
        domain: domain(),
        polling: PollingConfig {
            repository: PollSettings::new(Duration::from_secs(2), 5),
            database: PollSettings::new(Duration::from_secs(5), 5),
            deployment: DeploymentPollSettings {
                interval: Duration::from_secs(5),
                max_attempts: 5,
                progress_start: 55,
                progress_step: 10,
                progress_ceiling: 85,
            },
        },
        push_delay: Duration::from_millis(500),
        dns: reconcile_settings(),
    }
}

pub fn request(subdomain: &str) -> ProvisioningRequest {
    ProvisioningRequest::new("user-42", Subdomain::new(subdomain).unwrap(), "Acme Plumbing")
}

fn failure(service: &'static str) -> ProviderError {
    ProviderError::api(service, "500", "scripted failure")
}

// =============================================================================
// Database
// =============================================================================

#[derive(Default)]
pub struct FakeDatabase {
    /// Status probes that report not-ready before the database turns healthy.
    pub unhealthy_polls: u32,
    pub never_healthy: bool,
    pub fail_create: bool,
    pub status_calls: AtomicU32,
    pub created: Mutex<Vec<String>>,
}

#[async_trait]
impl DatabaseProvisioner for FakeDatabase {
    async fn create_database(&self, name: &str) -> Result<DatabaseId, ProviderError> {
        if self.fail_create {
            return Err(failure("supabase"));
        }
        self.created.lock().push(name.to_string());
        Ok(DatabaseId::new(format!("db-{name}")))
    }

    async fn database_status(&self, _id: &DatabaseId) -> Result<DatabaseStatus, ProviderError> {
        let call = self.status_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let healthy = !self.never_healthy && call > self.unhealthy_polls;
        Ok(DatabaseStatus {
            state: if healthy { "ACTIVE_HEALTHY" } else { "COMING_UP" }.to_string(),
            healthy,
        })
    }

    async fn database_credentials(
        &self,
        id: &DatabaseId,
    ) -> Result<DatabaseCredentials, ProviderError> {
        Ok(DatabaseCredentials {
            api_url: format!("https://{id}.supabase.co"),
            anon_key: SecretString::from("anon-key".to_string()),
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Default)]
pub struct FakeRepository {
    pub fail_create: bool,
    /// Readiness probes that report a missing branch before it appears.
    pub branch_missing_polls: u32,
    /// Paths that already exist, with their version token.
    pub existing: Mutex<HashMap<String, String>>,
    /// `(path, version sent)` per pushed file, in push order.
    pub pushed: Mutex<Vec<(String, Option<String>)>>,
    pub branch_calls: AtomicU32,
}

#[async_trait]
impl RepositoryHost for FakeRepository {
    async fn create_repository(
        &self,
        name: &str,
        _description: &str,
    ) -> Result<Repository, ProviderError> {
        if self.fail_create {
            return Err(failure("github"));
        }
        Ok(Repository {
            id: RepositoryId::new("4242"),
            reference: RepositoryRef::new("sites-org", name),
            html_url: format!("https://github.com/sites-org/{name}"),
            clone_url: format!("https://github.com/sites-org/{name}.git"),
            default_branch: "main".to_string(),
        })
    }

    async fn file_version(
        &self,
        _repo: &RepositoryRef,
        _branch: &str,
        path: &str,
    ) -> Result<Option<String>, ProviderError> {
        Ok(self.existing.lock().get(path).cloned())
    }

    async fn put_file(
        &self,
        _repo: &RepositoryRef,
        _branch: &str,
        file: &SourceFile,
        _message: &str,
        version: Option<&str>,
    ) -> Result<(), ProviderError> {
        self.pushed
            .lock()
            .push((file.path.clone(), version.map(str::to_string)));
        Ok(())
    }

    async fn repository_exists(&self, _repo: &RepositoryRef) -> Result<bool, ProviderError> {
        Ok(true)
    }

    async fn has_commits(&self, _repo: &RepositoryRef) -> Result<bool, ProviderError> {
        Ok(!self.pushed.lock().is_empty())
    }

    async fn branch_exists(
        &self,
        _repo: &RepositoryRef,
        _branch: &str,
    ) -> Result<bool, ProviderError> {
        let call = self.branch_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(call > self.branch_missing_polls)
    }
}

// =============================================================================
// Deployment
// =============================================================================

pub struct FakeDeployment {
    /// Status returned by create_deployment.
    pub initial_status: String,
    /// Statuses returned by successive polls; the last one repeats.
    pub script: Mutex<VecDeque<String>>,
    pub status_calls: AtomicU32,
    pub cname_target: Option<String>,
    pub verified: bool,
    pub deployment_url: String,
    /// Env var keys and values passed to create_project.
    pub env: Mutex<Vec<(String, String)>>,
    pub domains: Mutex<Vec<String>>,
}

impl FakeDeployment {
    pub fn with_script(initial: &str, polls: &[&str]) -> Self {
        Self {
            initial_status: initial.to_string(),
            script: Mutex::new(polls.iter().map(|s| s.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn env_keys(&self) -> Vec<String> {
        self.env.lock().iter().map(|(k, _)| k.clone()).collect()
    }
}

impl Default for FakeDeployment {
    fn default() -> Self {
        Self {
            initial_status: "QUEUED".to_string(),
            script: Mutex::new(VecDeque::from(["BUILDING".to_string(), "READY".to_string()])),
            status_calls: AtomicU32::new(0),
            cname_target: None,
            verified: true,
            deployment_url: "acme-abc123.vercel.app".to_string(),
            env: Mutex::new(Vec::new()),
            domains: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DeploymentHost for FakeDeployment {
    async fn create_project(
        &self,
        name: &str,
        _source: &SourceRef,
        env: &[EnvVar],
    ) -> Result<ProjectId, ProviderError> {
        self.env.lock().extend(
            env.iter()
                .map(|var| (var.key.clone(), var.value.expose_secret().to_string())),
        );
        Ok(ProjectId::new(format!("prj_{name}")))
    }

    async fn create_deployment(
        &self,
        _project: &ProjectId,
        _name: &str,
        _source: &SourceRef,
    ) -> Result<DeploymentSnapshot, ProviderError> {
        Ok(DeploymentSnapshot {
            id: DeploymentId::new("dpl_1"),
            status: self.initial_status.clone(),
            url: Some(self.deployment_url.clone()),
            message: None,
        })
    }

    async fn deployment_status(
        &self,
        id: &DeploymentId,
    ) -> Result<DeploymentSnapshot, ProviderError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let status = {
            let mut script = self.script.lock();
            if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            }
        }
        .unwrap_or_else(|| "READY".to_string());

        let message = (status == "ERROR").then(|| "Build failed: exit code 1".to_string());
        Ok(DeploymentSnapshot {
            id: id.clone(),
            status,
            url: Some(self.deployment_url.clone()),
            message,
        })
    }

    async fn add_custom_domain(
        &self,
        _project: &ProjectId,
        domain: &str,
    ) -> Result<CustomDomain, ProviderError> {
        self.domains.lock().push(domain.to_string());
        Ok(CustomDomain {
            name: domain.to_string(),
            verified: self.verified,
            cname_target: self.cname_target.clone(),
        })
    }
}

// =============================================================================
// DNS
// =============================================================================

#[derive(Default)]
pub struct FakeDns {
    pub live: Vec<DnsRecord>,
    pub fail_get: bool,
    pub fail_set: bool,
    pub panic_on_set: bool,
    /// Every full set pushed, in order.
    pub pushes: Mutex<Vec<DnsRecordSet>>,
}

impl FakeDns {
    pub fn push_count(&self) -> usize {
        self.pushes.lock().len()
    }

    pub fn last_push(&self) -> Option<DnsRecordSet> {
        self.pushes.lock().last().cloned()
    }
}

#[async_trait]
impl DnsHost for FakeDns {
    async fn get_hosts(&self, _domain: &DomainName) -> Result<Vec<DnsRecord>, ProviderError> {
        if self.fail_get {
            return Err(failure("namecheap"));
        }
        Ok(self.live.clone())
    }

    async fn set_hosts(&self, records: &DnsRecordSet) -> Result<(), ProviderError> {
        if self.panic_on_set {
            panic!("registrar client exploded");
        }
        if self.fail_set {
            return Err(failure("namecheap"));
        }
        self.pushes.lock().push(records.clone());
        Ok(())
    }
}

// =============================================================================
// Notifier
// =============================================================================

#[derive(Default)]
pub struct FakeNotifier {
    pub fail: bool,
    pub sent: Mutex<Vec<SiteNotice>>,
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn notify(&self, notice: &SiteNotice) -> Result<(), ProviderError> {
        if self.fail {
            return Err(ProviderError::api("notifier", "502", "bad gateway"));
        }
        self.sent.lock().push(notice.clone());
        Ok(())
    }
}

// =============================================================================
// Template
// =============================================================================

/// Renders a fixed file list plus the site's configuration.
pub struct StaticTemplate {
    pub files: Vec<(&'static str, &'static str)>,
}

impl Default for StaticTemplate {
    fn default() -> Self {
        Self {
            files: vec![
                ("index.html", "<h1>Welcome</h1>"),
                ("styles/site.css", "body { margin: 0 }"),
            ],
        }
    }
}

impl SiteTemplate for StaticTemplate {
    fn render(&self, config: &SiteConfiguration, workspace: &Path) -> io::Result<Vec<SourceFile>> {
        let mut rendered = Vec::new();
        for (path, contents) in &self.files {
            let target = workspace.join(path);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, contents)?;
            rendered.push(SourceFile::new(*path, contents.as_bytes()));
        }
        if !self.files.is_empty() {
            let json = serde_json::to_vec(config).map_err(io::Error::other)?;
            rendered.push(SourceFile::new("site.config.json", json));
        }
        Ok(rendered)
    }
}

// =============================================================================
// Provider set
// =============================================================================

#[derive(Default)]
pub struct Fakes {
    pub database: Arc<FakeDatabase>,
    pub repository: Arc<FakeRepository>,
    pub deployment: Arc<FakeDeployment>,
    pub dns: Arc<FakeDns>,
    pub notifier: Arc<FakeNotifier>,
}

impl Fakes {
    pub fn providers(&self) -> Providers {
        Providers {
            database: self.database.clone(),
            repository: self.repository.clone(),
            deployment: self.deployment.clone(),
            dns: self.dns.clone(),
            notifier: self.notifier.clone(),
        }
    }
}
