// ABOUTME: The user-submitted provisioning request, loaded from YAML.
// ABOUTME: Secret references are resolved at load time and stay redacted afterwards.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::{EnvValue, resolve_secret_map};
use crate::error::{Error, Result};
use crate::types::Subdomain;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Immutable input for one provisioning run.
#[derive(Debug)]
pub struct ProvisioningRequest {
    pub owner: String,
    pub subdomain: Subdomain,
    pub site_name: String,
    pub company: CompanyProfile,
    pub theme: Theme,
    pub features: Vec<String>,
    pub contact: ContactInfo,
    pub social: BTreeMap<String, String>,
    /// Injected into the deployment environment under these names.
    pub secrets: BTreeMap<String, SecretString>,
}

#[derive(Debug, Deserialize)]
struct RequestDocument {
    owner: String,
    subdomain: Subdomain,
    site_name: String,
    #[serde(default)]
    company: CompanyProfile,
    #[serde(default)]
    theme: Theme,
    #[serde(default)]
    features: Vec<String>,
    #[serde(default)]
    contact: ContactInfo,
    #[serde(default)]
    social: BTreeMap<String, String>,
    #[serde(default)]
    secrets: BTreeMap<String, EnvValue>,
}

impl ProvisioningRequest {
    pub fn new(owner: impl Into<String>, subdomain: Subdomain, site_name: impl Into<String>) -> Self {
        let site_name = site_name.into();
        Self {
            owner: owner.into(),
            subdomain,
            company: CompanyProfile {
                name: site_name.clone(),
                ..CompanyProfile::default()
            },
            site_name,
            theme: Theme::default(),
            features: Vec::new(),
            contact: ContactInfo::default(),
            social: BTreeMap::new(),
            secrets: BTreeMap::new(),
        }
    }

    pub fn with_secret(mut self, name: impl Into<String>, value: SecretString) -> Self {
        self.secrets.insert(name.into(), value);
        self
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let document: RequestDocument = serde_yaml::from_str(yaml)?;

        if document.owner.trim().is_empty() {
            return Err(Error::InvalidRequest("owner must not be empty".to_string()));
        }
        if document.site_name.trim().is_empty() {
            return Err(Error::InvalidRequest("site_name must not be empty".to_string()));
        }
        if let Some(bad) = document.secrets.keys().find(|k| !is_env_name(k)) {
            return Err(Error::InvalidRequest(format!(
                "secret name '{bad}' is not a valid environment variable name"
            )));
        }

        let secrets = resolve_secret_map(&document.secrets)?;
        let company = if document.company.name.is_empty() {
            CompanyProfile {
                name: document.site_name.clone(),
                ..document.company
            }
        } else {
            document.company
        };

        Ok(Self {
            owner: document.owner,
            subdomain: document.subdomain,
            site_name: document.site_name,
            company,
            theme: document.theme,
            features: document.features,
            contact: document.contact,
            social: document.social,
            secrets,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

fn is_env_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    const REQUEST: &str = r##"
owner: user-42
subdomain: acme
site_name: Acme Plumbing
company:
  tagline: Pipes done right
theme:
  primary_color: "#0044ff"
features: [booking, gallery]
contact:
  email: hello@acme.test
social:
  instagram: acmeplumbing
secrets:
  STRIPE_KEY: sk_test_literal
  MAPS_KEY: { env: SITESMITH_REQUEST_TEST_MAPS }
"##;

    #[test]
    fn loads_request_and_resolves_secrets() {
        temp_env::with_var("SITESMITH_REQUEST_TEST_MAPS", Some("maps-123"), || {
            let request = ProvisioningRequest::from_yaml(REQUEST).unwrap();
            assert_eq!(request.subdomain.as_str(), "acme");
            assert_eq!(request.company.name, "Acme Plumbing");
            assert_eq!(request.features, vec!["booking", "gallery"]);
            assert_eq!(request.secrets["MAPS_KEY"].expose_secret(), "maps-123");
            assert!(!format!("{request:?}").contains("sk_test_literal"));
        });
    }

    #[test]
    fn missing_secret_fails_at_load() {
        temp_env::with_var_unset("SITESMITH_REQUEST_TEST_MAPS", || {
            let err = ProvisioningRequest::from_yaml(REQUEST).unwrap_err();
            assert!(matches!(err, Error::MissingEnvVar(ref v) if v == "SITESMITH_REQUEST_TEST_MAPS"));
        });
    }

    #[test]
    fn company_without_name_takes_site_name() {
        let yaml = "owner: u\nsubdomain: acme\nsite_name: Acme Plumbing\ncompany:\n  tagline: Pipes\n";
        let request = ProvisioningRequest::from_yaml(yaml).unwrap();
        assert_eq!(request.company.name, "Acme Plumbing");
        assert_eq!(request.company.tagline.as_deref(), Some("Pipes"));
    }

    #[test]
    fn reserved_subdomain_is_rejected() {
        let yaml = "owner: u\nsubdomain: www\nsite_name: X\n";
        assert!(ProvisioningRequest::from_yaml(yaml).is_err());
    }

    #[test]
    fn invalid_secret_name_is_rejected() {
        let yaml = "owner: u\nsubdomain: acme\nsite_name: X\nsecrets:\n  bad-name: v\n";
        assert!(matches!(
            ProvisioningRequest::from_yaml(yaml),
            Err(Error::InvalidRequest(_))
        ));
    }
}
