// ABOUTME: Validated registrable domain name (e.g. example.com).
// ABOUTME: Splits into second-level and top-level parts for registrar APIs.

use std::fmt;
use thiserror::Error;

use super::Subdomain;

#[derive(Debug, Error)]
pub enum DomainNameError {
    #[error("domain name cannot be empty")]
    Empty,

    #[error("domain name must have at least two labels: {0}")]
    MissingTld(String),

    #[error("invalid label '{label}' in domain name")]
    InvalidLabel { label: String },

    #[error("domain name exceeds maximum length of 253 characters")]
    TooLong,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainName(String);

impl DomainName {
    /// Parse a domain, normalizing case and a trailing dot.
    pub fn parse(value: &str) -> Result<Self, DomainNameError> {
        let trimmed = value.trim().trim_end_matches('.').to_ascii_lowercase();
        if trimmed.is_empty() {
            return Err(DomainNameError::Empty);
        }
        if trimmed.len() > 253 {
            return Err(DomainNameError::TooLong);
        }

        let labels: Vec<&str> = trimmed.split('.').collect();
        if labels.len() < 2 {
            return Err(DomainNameError::MissingTld(trimmed));
        }

        for label in &labels {
            let valid = !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
            if !valid {
                return Err(DomainNameError::InvalidLabel {
                    label: (*label).to_string(),
                });
            }
        }

        Ok(Self(trimmed))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into (SLD, TLD) the way registrar APIs expect:
    /// the last label is the TLD, everything before it the SLD.
    pub fn split(&self) -> (&str, &str) {
        // parse() guarantees at least one dot
        self.0.rsplit_once('.').unwrap_or((self.0.as_str(), ""))
    }

    /// Fully-qualified host name for a subdomain of this domain.
    pub fn fqdn(&self, subdomain: &Subdomain) -> String {
        format!("{}.{}", subdomain, self.0)
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> serde::Deserialize<'de> for DomainName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        DomainName::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl serde::Serialize for DomainName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}
