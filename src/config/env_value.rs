// ABOUTME: Credential and secret values with environment interpolation.
// ABOUTME: Handles literal values and references to environment variables.

use crate::error::{Error, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl EnvValue {
    pub fn resolve(&self) -> Result<String> {
        match self {
            EnvValue::Literal(s) => Ok(s.clone()),
            EnvValue::FromEnv { var, default } => match std::env::var(var) {
                Ok(val) if !val.is_empty() => Ok(val),
                _ => default
                    .clone()
                    .ok_or_else(|| Error::MissingEnvVar(var.clone())),
            },
        }
    }

    /// Resolve into a value that is redacted from `Debug` output.
    pub fn resolve_secret(&self) -> Result<SecretString> {
        self.resolve().map(SecretString::from)
    }
}

pub fn resolve_secret_map(
    map: &BTreeMap<String, EnvValue>,
) -> Result<BTreeMap<String, SecretString>> {
    map.iter()
        .map(|(k, v)| v.resolve_secret().map(|resolved| (k.clone(), resolved)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn literal_resolves_to_itself() {
        let value = EnvValue::Literal("abc".to_string());
        assert_eq!(value.resolve().unwrap(), "abc");
    }

    #[test]
    fn env_reference_uses_default_when_unset() {
        temp_env::with_var_unset("SITESMITH_TEST_UNSET", || {
            let value = EnvValue::FromEnv {
                var: "SITESMITH_TEST_UNSET".to_string(),
                default: Some("fallback".to_string()),
            };
            assert_eq!(value.resolve().unwrap(), "fallback");
        });
    }

    #[test]
    fn env_reference_without_default_is_missing() {
        temp_env::with_var_unset("SITESMITH_TEST_MISSING", || {
            let value = EnvValue::FromEnv {
                var: "SITESMITH_TEST_MISSING".to_string(),
                default: None,
            };
            let err = value.resolve().unwrap_err();
            assert!(matches!(err, Error::MissingEnvVar(ref v) if v == "SITESMITH_TEST_MISSING"));
        });
    }

    #[test]
    fn secret_map_resolves_every_entry() {
        temp_env::with_var("SITESMITH_TEST_KEY", Some("s3cret"), || {
            let mut map = BTreeMap::new();
            map.insert(
                "STRIPE_KEY".to_string(),
                EnvValue::FromEnv {
                    var: "SITESMITH_TEST_KEY".to_string(),
                    default: None,
                },
            );
            let resolved = resolve_secret_map(&map).unwrap();
            assert_eq!(resolved["STRIPE_KEY"].expose_secret(), "s3cret");
            assert!(!format!("{:?}", resolved).contains("s3cret"));
        });
    }
}
