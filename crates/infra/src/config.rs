//! Configuration loading and representation.

use std::path::PathBuf;

use reqwest::Url;
use thiserror::Error;

pub const STORE_URL: &str = "STORE_URL";
pub const STORE_PUBLIC_KEY: &str = "STORE_PUBLIC_KEY";
pub const STORE_SERVICE_KEY: &str = "STORE_SERVICE_KEY";
pub const FUNCTIONS_URL: &str = "FUNCTIONS_URL";
pub const SESSION_FILE: &str = "SESSION_FILE";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("{var} is not a valid URL: {reason}")]
    InvalidUrl { var: &'static str, reason: String },
}

/// Connection settings for the hosted backend.
///
/// Built once at startup; a missing URL or public key is fatal.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub url: Url,
    pub public_key: String,
    /// Privileged key for identity administration (rollback, user management,
    /// demo seeding). Never shipped to end users.
    pub service_key: Option<String>,
    pub functions_url: Url,
    pub session_file: Option<PathBuf>,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let raw_url = get(STORE_URL).ok_or(ConfigError::Missing(STORE_URL))?;
        let public_key = get(STORE_PUBLIC_KEY).ok_or(ConfigError::Missing(STORE_PUBLIC_KEY))?;
        let url = parse_url(STORE_URL, &raw_url)?;
        let functions_url = match get(FUNCTIONS_URL) {
            Some(raw) => parse_url(FUNCTIONS_URL, &raw)?,
            None => url.clone(),
        };

        Ok(Self {
            url,
            public_key,
            service_key: get(STORE_SERVICE_KEY),
            functions_url,
            session_file: get(SESSION_FILE).map(PathBuf::from),
        })
    }

    pub fn new(url: Url, public_key: impl Into<String>) -> Self {
        Self {
            functions_url: url.clone(),
            url,
            public_key: public_key.into(),
            service_key: None,
            session_file: None,
        }
    }

    pub fn with_service_key(mut self, key: impl Into<String>) -> Self {
        self.service_key = Some(key.into());
        self
    }

    /// `{url}/rest/v1`
    pub fn rest_base(&self) -> String {
        join(&self.url, "/rest/v1")
    }

    /// `{url}/auth/v1`
    pub fn auth_base(&self) -> String {
        join(&self.url, "/auth/v1")
    }

    /// `{functions_url}/functions`
    pub fn functions_base(&self) -> String {
        join(&self.functions_url, "/functions")
    }
}

impl core::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url.as_str())
            .field("public_key", &"<redacted>")
            .field("service_key", &self.service_key.as_ref().map(|_| "<redacted>"))
            .field("functions_url", &self.functions_url.as_str())
            .field("session_file", &self.session_file)
            .finish()
    }
}

fn parse_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        var,
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            var,
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}

fn join(base: &Url, path: &str) -> String {
    format!("{}{}", base.as_str().trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn missing_public_key_is_fatal() {
        let err = StoreConfig::from_lookup(lookup(&[(STORE_URL, "https://x.example.co")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(STORE_PUBLIC_KEY));
    }

    #[test]
    fn blank_url_counts_as_missing() {
        let err = StoreConfig::from_lookup(lookup(&[(STORE_URL, "  "), (STORE_PUBLIC_KEY, "k")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(STORE_URL));
    }

    #[test]
    fn invalid_url_is_reported_with_its_variable() {
        let err = StoreConfig::from_lookup(lookup(&[(STORE_URL, "ftp://x"), (STORE_PUBLIC_KEY, "k")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { var: STORE_URL, .. }));
    }

    #[test]
    fn endpoints_and_defaults() {
        let cfg = StoreConfig::from_lookup(lookup(&[
            (STORE_URL, "https://x.example.co/"),
            (STORE_PUBLIC_KEY, "anon"),
        ]))
        .unwrap();
        assert_eq!(cfg.rest_base(), "https://x.example.co/rest/v1");
        assert_eq!(cfg.auth_base(), "https://x.example.co/auth/v1");
        assert_eq!(cfg.functions_base(), "https://x.example.co/functions");
        assert!(cfg.service_key.is_none());
        assert!(!format!("{cfg:?}").contains("anon"));
    }
}
