//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ESHOP_API_URL` - Base URL of the eShop REST API (e.g. `https://shop.example/api/`)
//!
//! ## Optional
//! - `ESHOP_DEFAULT_USER_TOKEN` - Default credential tried first for user-level requests
//! - `ESHOP_DEFAULT_ADMIN_TOKEN` - Default credential tried first for admin-level requests
//! - `ESHOP_SESSION_DIR` - Directory holding the persisted session slots (default: `.eshop`)
//! - `ESHOP_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `ESHOP_CATEGORY_CACHE_TTL_SECS` - Category list cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use eshop_core::Privilege;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the REST API, always ending in `/`
    pub api_url: Url,
    /// Default credentials tried before the session token
    pub default_credentials: DefaultCredentials,
    /// Directory for the durable `token` / `userInfo` slots
    pub session_dir: PathBuf,
    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,
    /// How long the category list stays cached
    pub category_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Default (service) credentials per privilege level.
///
/// Both slots are optional. When a slot is empty, requests at that privilege
/// go straight to the session token.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone, Default)]
pub struct DefaultCredentials {
    pub user: Option<SecretString>,
    pub admin: Option<SecretString>,
}

impl DefaultCredentials {
    /// The credential tried first for `privilege`, if one is configured.
    #[must_use]
    pub const fn for_privilege(&self, privilege: Privilege) -> Option<&SecretString> {
        match privilege {
            Privilege::User => self.user.as_ref(),
            Privilege::Admin => self.admin.as_ref(),
        }
    }
}

impl std::fmt::Debug for DefaultCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |slot: &Option<SecretString>| slot.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("DefaultCredentials")
            .field("user", &redact(&self.user))
            .field("admin", &redact(&self.admin))
            .finish()
    }
}

impl StorefrontConfig {
    /// Configuration for `api_url` with every optional setting at its default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL cannot be parsed or
    /// cannot be used as a base for API paths.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url(api_url)?,
            default_credentials: DefaultCredentials::default(),
            session_dir: PathBuf::from(".eshop"),
            request_timeout: Duration::from_secs(30),
            category_cache_ttl: Duration::from_secs(300),
            sentry_dsn: None,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if a default credential fails validation (placeholder detection,
    /// entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url(&get_required_env("ESHOP_API_URL")?)?;
        let default_credentials = DefaultCredentials {
            user: get_optional_secret("ESHOP_DEFAULT_USER_TOKEN")?,
            admin: get_optional_secret("ESHOP_DEFAULT_ADMIN_TOKEN")?,
        };
        let session_dir = PathBuf::from(get_env_or_default("ESHOP_SESSION_DIR", ".eshop"));
        let request_timeout = get_seconds("ESHOP_REQUEST_TIMEOUT_SECS", 30)?;
        let category_cache_ttl = get_seconds("ESHOP_CATEGORY_CACHE_TTL_SECS", 300)?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            api_url,
            default_credentials,
            session_dir,
            request_timeout,
            category_cache_ttl,
            sentry_dsn,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the API base URL, forcing a trailing slash so relative joins keep
/// the full base path.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("ESHOP_API_URL".to_string(), msg);

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be used as a base".to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a duration in whole seconds with a default.
fn get_seconds(key: &str, default: u64) -> Result<Duration, ConfigError> {
    get_optional_env(key).map_or(Ok(Duration::from_secs(default)), |raw| {
        raw.trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a credential is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real bearer tokens (JWTs, API keys) have high entropy
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the token issued by the API."
            ),
        ));
    }

    Ok(())
}

/// Load and validate an optional credential from environment.
fn get_optional_secret(key: &str) -> Result<Option<SecretString>, ConfigError> {
    let Some(value) = get_optional_env(key) else {
        return Ok(None);
    };
    let value = value.trim().to_string();
    validate_secret_strength(&value, key)?;
    Ok(Some(SecretString::from(value)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_jwt_like_token_passes() {
        let token = "k7Qz-R2mW9xLp4Tn_Hc8VbJ3yFd6Ge1S";
        assert!(validate_secret_strength(token, "TEST_VAR").is_ok());
    }

    #[test]
    fn test_placeholder_token_rejected() {
        let err = validate_secret_strength("your-admin-token-here", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        assert!(validate_secret_strength("CHANGEME-please-1234", "TEST_VAR").is_err());
    }

    #[test]
    fn test_low_entropy_token_rejected() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_api_url_gets_trailing_slash() {
        let config = StorefrontConfig::new("http://localhost:8080/api").unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:8080/api/");
        assert_eq!(
            config.api_url.join("products").unwrap().as_str(),
            "http://localhost:8080/api/products"
        );
    }

    #[test]
    fn test_api_url_rejects_garbage() {
        assert!(StorefrontConfig::new("not a url").is_err());
        assert!(StorefrontConfig::new("mailto:shop@example.com").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::new("http://localhost:8080").unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.category_cache_ttl, Duration::from_secs(300));
        assert!(config.default_credentials.user.is_none());
    }

    #[test]
    fn test_default_credentials_by_privilege() {
        let credentials = DefaultCredentials {
            user: None,
            admin: Some(SecretString::from("admin-service-token")),
        };
        assert!(credentials.for_privilege(Privilege::User).is_none());
        assert!(credentials.for_privilege(Privilege::Admin).is_some());
    }

    #[test]
    fn test_default_credentials_debug_redacts_secrets() {
        let credentials = DefaultCredentials {
            user: Some(SecretString::from("super_secret_user_token")),
            admin: None,
        };
        let debug_output = format!("{credentials:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_user_token"));
    }
}
