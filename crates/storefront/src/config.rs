//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `ROCKETSHOES_API_URL` - Catalog/stock API base URL (default: `http://localhost:3333`)
//! - `ROCKETSHOES_API_TOKEN` - Bearer token sent to the catalog API
//! - `ROCKETSHOES_API_TIMEOUT_SECS` - Per-request timeout in seconds (default: 10)
//! - `ROCKETSHOES_STORAGE_PATH` - Local storage file (default: `.rocketshoes/storage.json`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:3333";
const DEFAULT_TIMEOUT_SECS: &str = "10";
const DEFAULT_STORAGE_PATH: &str = ".rocketshoes/storage.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart application configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Catalog/stock API configuration
    pub api: CatalogApiConfig,
    /// Path of the local storage file
    pub storage_path: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Catalog/stock API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct CatalogApiConfig {
    /// Base URL, always ending in `/` so relative joins append
    pub base_url: Url,
    /// Optional bearer token
    pub token: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for CatalogApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CatalogApiConfig {
    /// Build an API configuration without a token.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("ROCKETSHOES_API_URL", base_url)?,
            token: None,
            timeout,
        })
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let or_default =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let base_url = parse_base_url(
            "ROCKETSHOES_API_URL",
            &or_default("ROCKETSHOES_API_URL", DEFAULT_API_URL),
        )?;
        let timeout_secs = or_default("ROCKETSHOES_API_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("ROCKETSHOES_API_TIMEOUT_SECS".to_string(), e.to_string())
            })?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "ROCKETSHOES_API_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let token = lookup("ROCKETSHOES_API_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .map(SecretString::from);

        let storage_path = PathBuf::from(or_default("ROCKETSHOES_STORAGE_PATH", DEFAULT_STORAGE_PATH));

        Ok(Self {
            api: CatalogApiConfig {
                base_url,
                token,
                timeout: Duration::from_secs(timeout_secs),
            },
            storage_path,
            sentry_dsn: lookup("SENTRY_DSN").filter(|v| !v.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an API base URL, forcing a trailing slash on the path.
fn parse_base_url(var_name: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<CartConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        CartConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.api.base_url.as_str(), "http://localhost:3333/");
        assert_eq!(config.api.timeout, Duration::from_secs(10));
        assert!(config.api.token.is_none());
        assert_eq!(config.storage_path, PathBuf::from(".rocketshoes/storage.json"));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = load(&[("ROCKETSHOES_API_URL", "https://api.example.test/v1")]).unwrap();
        assert_eq!(config.api.base_url.as_str(), "https://api.example.test/v1/");
        assert_eq!(
            config.api.base_url.join("stock/3").unwrap().as_str(),
            "https://api.example.test/v1/stock/3"
        );
    }

    #[test]
    fn test_invalid_url() {
        let err = load(&[("ROCKETSHOES_API_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "ROCKETSHOES_API_URL"));

        let err = load(&[("ROCKETSHOES_API_URL", "ftp://files.example.test")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_invalid_timeout() {
        assert!(load(&[("ROCKETSHOES_API_TIMEOUT_SECS", "soon")]).is_err());
        assert!(load(&[("ROCKETSHOES_API_TIMEOUT_SECS", "0")]).is_err());
        let config = load(&[("ROCKETSHOES_API_TIMEOUT_SECS", "3")]).unwrap();
        assert_eq!(config.api.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_token_and_blank_token() {
        let config = load(&[("ROCKETSHOES_API_TOKEN", "tok_123")]).unwrap();
        assert_eq!(config.api.token.unwrap().expose_secret(), "tok_123");

        let config = load(&[("ROCKETSHOES_API_TOKEN", "  ")]).unwrap();
        assert!(config.api.token.is_none());
    }

    #[test]
    fn test_api_config_debug_redacts_token() {
        let mut api = CatalogApiConfig::new("http://localhost:3333", Duration::from_secs(1)).unwrap();
        api.token = Some(SecretString::from("super_secret_token"));

        let debug_output = format!("{api:?}");
        assert!(debug_output.contains("localhost:3333"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_token"));
    }
}
