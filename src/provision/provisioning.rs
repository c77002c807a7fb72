// ABOUTME: Generic provisioning run parameterized by state marker.
// ABOUTME: State types carry their own data, so a step cannot run before its inputs exist.

use std::sync::Arc;

use super::state::{Configured, DatabaseReady, Recorded, Requested};
use crate::request::ProvisioningRequest;
use crate::site::SourceFile;
use crate::types::{DomainName, JobId};

/// One provisioning run in progress, parameterized by its current state.
///
/// Transitions consume `self` and return the next state, so the step order
/// is fixed at compile time.
#[derive(Debug)]
pub struct Provisioning<S> {
    pub(crate) job_id: JobId,
    pub(crate) request: Arc<ProvisioningRequest>,
    pub(crate) domain: DomainName,
    pub(crate) fqdn: String,
    pub(crate) state: S,
}

impl Provisioning<Requested> {
    pub fn new(job_id: JobId, request: Arc<ProvisioningRequest>, domain: DomainName) -> Self {
        let fqdn = domain.fqdn(&request.subdomain);
        Provisioning {
            job_id,
            request,
            domain,
            fqdn,
            state: Requested,
        }
    }
}

impl<S> Provisioning<S> {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn request(&self) -> &ProvisioningRequest {
        &self.request
    }

    pub fn domain(&self) -> &DomainName {
        &self.domain
    }

    /// `{subdomain}.{domain}`.
    pub fn fqdn(&self) -> &str {
        &self.fqdn
    }

    /// Public address of the site once the domain is bound.
    pub fn site_url(&self) -> String {
        format!("https://{}", self.fqdn)
    }

    /// Move to the next state, keeping the run's identity.
    pub(crate) fn advance<T>(self, state: T) -> Provisioning<T> {
        Provisioning {
            job_id: self.job_id,
            request: self.request,
            domain: self.domain,
            fqdn: self.fqdn,
            state,
        }
    }

    /// Move to the next state built from the current one.
    pub(crate) fn map_state<T>(self, f: impl FnOnce(S) -> T) -> Provisioning<T> {
        Provisioning {
            job_id: self.job_id,
            request: self.request,
            domain: self.domain,
            fqdn: self.fqdn,
            state: f(self.state),
        }
    }
}

impl Provisioning<DatabaseReady> {
    pub fn database_url(&self) -> &str {
        &self.state.database.api_url
    }
}

impl Provisioning<Configured> {
    pub fn files(&self) -> &[SourceFile] {
        &self.state.files
    }
}

impl Provisioning<Recorded> {
    pub fn site_id(&self) -> &crate::types::SiteId {
        &self.state.site.id
    }
}
