//! Credential resolution
//!
//! The transport never reads credentials from ambient state; it asks a
//! [`CredentialResolver`] for the (panel URL, API key) pair of a given sub-API
//! and credential index, then validates the result before any network call.

use serde::{Deserialize, Serialize};

use crate::types::{ApiKind, Credentials};
use crate::{Error, Result};

/// Source of panel credentials
pub trait CredentialResolver: Send + Sync {
    /// Resolve credentials for `kind` at position `index`
    fn resolve(&self, kind: ApiKind, index: usize) -> Result<Credentials>;
}

/// Reject credentials with an empty panel URL or API key
pub fn validate_credentials(kind: ApiKind, credentials: &Credentials) -> Result<()> {
    if credentials.normalized_base_url().is_empty() {
        return Err(Error::configuration(format!(
            "Panel URL is not configured. Set the panel URL on the {} API credentials.",
            kind
        )));
    }

    if credentials.normalized_api_key().is_empty() {
        return Err(Error::configuration(format!(
            "API Key is not configured. Set an API key on the {} API credentials.",
            kind
        )));
    }

    Ok(())
}

/// One configured panel with its optional keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSet {
    pub panel_url: String,
    #[serde(default)]
    pub client_api_key: Option<String>,
    #[serde(default)]
    pub application_api_key: Option<String>,
}

impl CredentialSet {
    pub fn new(panel_url: impl Into<String>) -> Self {
        Self {
            panel_url: panel_url.into(),
            ..Default::default()
        }
    }

    pub fn with_client_key(mut self, key: impl Into<String>) -> Self {
        self.client_api_key = Some(key.into());
        self
    }

    pub fn with_application_key(mut self, key: impl Into<String>) -> Self {
        self.application_api_key = Some(key.into());
        self
    }

    fn key_for(&self, kind: ApiKind) -> Option<&str> {
        match kind {
            ApiKind::Client => self.client_api_key.as_deref(),
            ApiKind::Application => self.application_api_key.as_deref(),
        }
    }
}

/// Resolver over a fixed, ordered list of credential sets
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialResolver {
    sets: Vec<CredentialSet>,
}

impl StaticCredentialResolver {
    pub fn new(sets: Vec<CredentialSet>) -> Self {
        Self { sets }
    }

    /// Resolver with a single credential set at index 0
    pub fn single(set: CredentialSet) -> Self {
        Self { sets: vec![set] }
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

impl CredentialResolver for StaticCredentialResolver {
    fn resolve(&self, kind: ApiKind, index: usize) -> Result<Credentials> {
        let set = self.sets.get(index).ok_or_else(|| {
            Error::configuration(format!(
                "No Pterodactyl credentials configured at index {} ({} configured)",
                index,
                self.sets.len()
            ))
        })?;

        // An absent key is reported by validate_credentials like an empty one
        let api_key = set.key_for(kind).unwrap_or_default();
        Ok(Credentials::new(set.panel_url.clone(), api_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn resolver() -> StaticCredentialResolver {
        StaticCredentialResolver::new(vec![
            CredentialSet::new("https://panel.example.com/").with_client_key("ptlc_1"),
            CredentialSet::new("https://other.example.com")
                .with_client_key("ptlc_2")
                .with_application_key("ptla_2"),
        ])
    }

    #[test]
    fn test_resolve_by_index_and_kind() {
        let creds = resolver().resolve(ApiKind::Application, 1).unwrap();
        assert_eq!(creds.base_url, "https://other.example.com");
        assert_eq!(creds.api_key, "ptla_2");
    }

    #[test]
    fn test_out_of_range_index() {
        let err = resolver().resolve(ApiKind::Client, 5).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert!(err.message.contains("index 5"));
    }

    #[test]
    fn test_missing_key_fails_validation() {
        let creds = resolver().resolve(ApiKind::Application, 0).unwrap();
        let err = validate_credentials(ApiKind::Application, &creds).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert!(err.message.starts_with("API Key is not configured"));
    }

    #[test]
    fn test_missing_url_fails_validation() {
        let creds = Credentials::new(" / ", "ptlc_1");
        let err = validate_credentials(ApiKind::Client, &creds).unwrap_err();
        assert!(err.message.starts_with("Panel URL is not configured"));
    }

    #[test]
    fn test_complete_credentials_pass() {
        let creds = resolver().resolve(ApiKind::Client, 0).unwrap();
        assert!(validate_credentials(ApiKind::Client, &creds).is_ok());
    }
}
