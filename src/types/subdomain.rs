// ABOUTME: DNS-compatible subdomain label validation.
// ABOUTME: Ensures requested site names follow RFC 1123 label requirements.

use std::fmt;
use thiserror::Error;

/// Labels owned by the default records of every managed domain.
const RESERVED: &[&str] = &["www", "mail", "api"];

#[derive(Debug, Error)]
pub enum SubdomainError {
    #[error("subdomain cannot be empty")]
    Empty,

    #[error("subdomain exceeds maximum length of 63 characters")]
    TooLong,

    #[error("subdomain cannot start with a hyphen")]
    StartsWithHyphen,

    #[error("subdomain cannot end with a hyphen")]
    EndsWithHyphen,

    #[error("subdomain must be lowercase")]
    NotLowercase,

    #[error("invalid character in subdomain: '{0}'")]
    InvalidChar(char),

    #[error("subdomain '{0}' is reserved")]
    Reserved(String),
}

/// A single validated DNS label naming a provisioned site (`acme` in
/// `acme.example.com`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subdomain(String);

impl Subdomain {
    pub fn new(value: &str) -> Result<Self, SubdomainError> {
        if value.is_empty() {
            return Err(SubdomainError::Empty);
        }

        if value.len() > 63 {
            return Err(SubdomainError::TooLong);
        }

        if value.starts_with('-') {
            return Err(SubdomainError::StartsWithHyphen);
        }

        if value.ends_with('-') {
            return Err(SubdomainError::EndsWithHyphen);
        }

        for c in value.chars() {
            if c.is_ascii_uppercase() {
                return Err(SubdomainError::NotLowercase);
            }
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' {
                return Err(SubdomainError::InvalidChar(c));
            }
        }

        if RESERVED.contains(&value) {
            return Err(SubdomainError::Reserved(value.to_string()));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Subdomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Subdomain {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Subdomain::new(&s).map_err(serde::de::Error::custom)
    }
}

impl serde::Serialize for Subdomain {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_simple_label() {
        assert_eq!(Subdomain::new("acme-2").unwrap().as_str(), "acme-2");
    }

    #[test]
    fn rejects_uppercase_and_dots() {
        assert!(matches!(
            Subdomain::new("Acme"),
            Err(SubdomainError::NotLowercase)
        ));
        assert!(matches!(
            Subdomain::new("a.b"),
            Err(SubdomainError::InvalidChar('.'))
        ));
    }

    #[test]
    fn rejects_reserved_labels() {
        assert!(matches!(
            Subdomain::new("www"),
            Err(SubdomainError::Reserved(_))
        ));
    }

    #[test]
    fn rejects_hyphen_edges_and_length() {
        assert!(Subdomain::new("-acme").is_err());
        assert!(Subdomain::new("acme-").is_err());
        assert!(matches!(
            Subdomain::new(&"a".repeat(64)),
            Err(SubdomainError::TooLong)
        ));
    }
}
