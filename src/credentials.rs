//! Credential and endpoint loading.
//!
//! The API key is read once, before any client is built and before any file
//! is touched. A missing key is a configuration error that stops the run
//! with no network traffic at all.
//!
//! Lookups go through a `Fn(&str) -> Option<String>` so tests can supply a
//! fake environment instead of mutating the real one.

use crate::error::ConvertError;
use std::fmt;

/// Environment variable holding the CloudConvert API key.
pub const API_KEY_VAR: &str = "CLOUDCONVERT_API_KEY";

/// Set to `1`, `true` or `yes` to talk to the sandbox API.
pub const SANDBOX_VAR: &str = "CLOUDCONVERT_SANDBOX";

/// Overrides the API base URL entirely (proxies, local test servers).
pub const API_URL_VAR: &str = "CLOUDCONVERT_API_URL";

/// Production API base URL.
pub const LIVE_API_URL: &str = "https://api.cloudconvert.com/v2";

/// Sandbox API base URL.
pub const SANDBOX_API_URL: &str = "https://api.sandbox.cloudconvert.com/v2";

/// A non-empty CloudConvert API key.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key, rejecting blank values.
    pub fn new(value: impl Into<String>) -> Result<Self, ConvertError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ConvertError::MissingApiKey);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Read the key through `lookup` (normally `std::env::var`).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConvertError>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(API_KEY_VAR)
            .ok_or(ConvertError::MissingApiKey)
            .and_then(Self::new)
    }

    /// Load `.env` if present, then read the key from the process environment.
    pub fn from_env() -> Result<Self, ConvertError> {
        load_dotenv();
        Self::from_lookup(env_lookup)
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Which API deployment to talk to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Endpoint {
    /// `https://api.cloudconvert.com/v2` (default).
    #[default]
    Live,
    /// `https://api.sandbox.cloudconvert.com/v2`; jobs are free but only
    /// whitelisted files convert.
    Sandbox,
    /// Any other base URL, without a trailing slash.
    Custom(String),
}

impl Endpoint {
    /// Resolve the endpoint from `CLOUDCONVERT_API_URL` / `CLOUDCONVERT_SANDBOX`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_VAR) {
            let url = url.trim().trim_end_matches('/');
            if !url.is_empty() {
                return Endpoint::Custom(url.to_string());
            }
        }

        match lookup(SANDBOX_VAR).as_deref().map(str::trim) {
            Some(v) if is_truthy(v) => Endpoint::Sandbox,
            _ => Endpoint::Live,
        }
    }

    /// Same as [`Endpoint::from_lookup`] over the process environment.
    pub fn from_env() -> Self {
        load_dotenv();
        Self::from_lookup(env_lookup)
    }

    pub fn base_url(&self) -> &str {
        match self {
            Endpoint::Live => LIVE_API_URL,
            Endpoint::Sandbox => SANDBOX_API_URL,
            Endpoint::Custom(url) => url,
        }
    }
}

/// Lookup over the real process environment.
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Load a `.env` settings file from the working directory (or a parent).
///
/// A missing file is not an error; variables already set win.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

fn is_truthy(v: &str) -> bool {
    matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn key_is_read_from_lookup() {
        let key = ApiKey::from_lookup(env(&[(API_KEY_VAR, "secret-123")])).unwrap();
        assert_eq!(key.expose(), "secret-123");
    }

    #[test]
    fn missing_key_is_a_configuration_error() {
        let err = ApiKey::from_lookup(env(&[])).unwrap_err();
        assert!(matches!(err, ConvertError::MissingApiKey));
    }

    #[test]
    fn blank_key_is_rejected() {
        let err = ApiKey::from_lookup(env(&[(API_KEY_VAR, "   ")])).unwrap_err();
        assert!(matches!(err, ConvertError::MissingApiKey));
    }

    #[test]
    fn key_is_trimmed() {
        let key = ApiKey::new("  abc\n").unwrap();
        assert_eq!(key.expose(), "abc");
    }

    #[test]
    fn debug_redacts_secret() {
        let key = ApiKey::new("very-secret").unwrap();
        let dbg = format!("{key:?}");
        assert!(!dbg.contains("very-secret"));
    }

    #[test]
    fn endpoint_defaults_to_live() {
        assert_eq!(Endpoint::from_lookup(env(&[])), Endpoint::Live);
        assert_eq!(Endpoint::Live.base_url(), LIVE_API_URL);
    }

    #[test]
    fn endpoint_sandbox_switch() {
        let ep = Endpoint::from_lookup(env(&[(SANDBOX_VAR, "true")]));
        assert_eq!(ep, Endpoint::Sandbox);
        let ep = Endpoint::from_lookup(env(&[(SANDBOX_VAR, "0")]));
        assert_eq!(ep, Endpoint::Live);
    }

    #[test]
    fn endpoint_custom_url_wins_and_is_trimmed() {
        let ep = Endpoint::from_lookup(env(&[
            (API_URL_VAR, "http://127.0.0.1:9000/v2/"),
            (SANDBOX_VAR, "1"),
        ]));
        assert_eq!(ep.base_url(), "http://127.0.0.1:9000/v2");
    }
}
