// ABOUTME: Site configuration derived from a request, and the template that renders it.
// ABOUTME: Rendering happens in an ephemeral workspace removed at the end of a run.

mod template;
mod workspace;

pub use template::{CONFIG_FILE_NAME, DirectoryTemplate, SiteTemplate};
pub use workspace::Workspace;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::request::{CompanyProfile, ContactInfo, ProvisioningRequest, Theme};

/// A file to publish, with its repository-relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub contents: Vec<u8>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Public configuration baked into the generated site. Holds no secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfiguration {
    pub site_name: String,
    pub subdomain: String,
    pub fqdn: String,
    pub owner: String,
    pub company: CompanyProfile,
    pub theme: Theme,
    pub features: Vec<String>,
    pub contact: ContactInfo,
    pub social: BTreeMap<String, String>,
    pub database_url: String,
}

impl SiteConfiguration {
    pub fn from_request(request: &ProvisioningRequest, fqdn: &str, database_url: &str) -> Self {
        Self {
            site_name: request.site_name.clone(),
            subdomain: request.subdomain.as_str().to_string(),
            fqdn: fqdn.to_string(),
            owner: request.owner.clone(),
            company: request.company.clone(),
            theme: request.theme.clone(),
            features: request.features.clone(),
            contact: request.contact.clone(),
            social: request.social.clone(),
            database_url: database_url.to_string(),
        }
    }
}
