//! Configuration for archive traffic
//!
//! Settings come from a TOML file, the process environment, or both (the
//! environment wins). Malformed rate or timeout values never abort startup:
//! they are logged and replaced with defaults. A missing or contact-less
//! identity is the only fatal problem, reported by [`HttpConfig::identity`].

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::policy::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
use crate::ConfigurationError;

/// Identity header variable
pub const USER_AGENT_VAR: &str = "SEC_EDGAR_USER_AGENT";

/// Requests-per-second variable
pub const RATE_LIMIT_VAR: &str = "SEC_EDGAR_RATE_LIMIT";

/// Request timeout variable (seconds)
pub const TIMEOUT_VAR: &str = "SEC_EDGAR_TIMEOUT";

/// Default request ceiling, below the archive's published limit of 10/s
pub const DEFAULT_RATE_LIMIT: f64 = 8.0;

/// Highest accepted request ceiling
pub const MAX_RATE_LIMIT: f64 = 10.0;

/// Default request timeout (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default backoff base (1 second)
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

/// Outbound traffic configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Identity sent as `User-Agent`; must contain a contact email
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Requests-per-second ceiling, in `(0, 10]`
    #[serde(default = "default_rate_limit")]
    pub rate_limit: f64,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per request, first try included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff base in milliseconds
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

fn default_rate_limit() -> f64 {
    DEFAULT_RATE_LIMIT
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_backoff_base_ms() -> u64 {
    DEFAULT_BACKOFF_BASE_MS
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        }
    }
}

impl HttpConfig {
    /// Defaults overlaid with the process environment
    pub fn from_env() -> Self {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().overlay(lookup)
    }

    /// Override fields with whichever variables `lookup` provides
    pub fn overlay<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(agent) = lookup(USER_AGENT_VAR) {
            self.user_agent = Some(agent.trim().to_string());
        }
        if let Some(raw) = lookup(RATE_LIMIT_VAR) {
            self.rate_limit = parse_rate_limit(Some(&raw));
        }
        if let Some(raw) = lookup(TIMEOUT_VAR) {
            self.timeout_secs = parse_timeout_secs(Some(&raw));
        }
        self
    }

    /// Replace out-of-range numeric settings with defaults
    pub fn sanitized(mut self) -> Self {
        if !rate_in_range(self.rate_limit) {
            warn!(
                rate_limit = self.rate_limit,
                default = DEFAULT_RATE_LIMIT,
                "Rate limit out of range, using default"
            );
            self.rate_limit = DEFAULT_RATE_LIMIT;
        }
        if self.timeout_secs == 0 {
            warn!(default = DEFAULT_TIMEOUT_SECS, "Timeout must be positive, using default");
            self.timeout_secs = DEFAULT_TIMEOUT_SECS;
        }
        self
    }

    /// Validated identity string
    ///
    /// # Errors
    ///
    /// `MissingIdentity` if unset or blank, `IdentityWithoutContact` if it
    /// has no `@`.
    pub fn identity(&self) -> Result<&str, ConfigurationError> {
        validate_identity(self.user_agent.as_deref())
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Backoff base delay
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    /// Retry policy described by this configuration
    pub fn retry_policy(&self) -> Result<RetryPolicy, ConfigurationError> {
        RetryPolicy::new(self.max_attempts, self.backoff_base())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.identity().map_err(|e| e.to_string())?;
        if !rate_in_range(self.rate_limit) {
            return Err(format!(
                "rate_limit must be in (0, {}], got {}",
                MAX_RATE_LIMIT, self.rate_limit
            ));
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::from_toml(&contents)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

fn rate_in_range(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0 && rate <= MAX_RATE_LIMIT
}

/// Check that an identity string is present and carries a contact address
pub fn validate_identity(raw: Option<&str>) -> Result<&str, ConfigurationError> {
    match raw.map(str::trim) {
        None | Some("") => Err(ConfigurationError::MissingIdentity),
        Some(agent) if !agent.contains('@') => {
            Err(ConfigurationError::IdentityWithoutContact(agent.to_string()))
        }
        Some(agent) => Ok(agent),
    }
}

/// Parse a rate ceiling, falling back to the default with a warning
pub fn parse_rate_limit(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return DEFAULT_RATE_LIMIT;
    };
    match raw.trim().parse::<f64>() {
        Ok(rate) if rate_in_range(rate) => rate,
        _ => {
            warn!(
                value = raw,
                default = DEFAULT_RATE_LIMIT,
                "{} must be in (0, {}], using default",
                RATE_LIMIT_VAR,
                MAX_RATE_LIMIT
            );
            DEFAULT_RATE_LIMIT
        }
    }
}

/// Parse a timeout in seconds, falling back to the default with a warning
pub fn parse_timeout_secs(raw: Option<&str>) -> u64 {
    let Some(raw) = raw else {
        return DEFAULT_TIMEOUT_SECS;
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => secs,
        _ => {
            warn!(
                value = raw,
                default = DEFAULT_TIMEOUT_SECS,
                "{} must be a positive integer, using default",
                TIMEOUT_VAR
            );
            DEFAULT_TIMEOUT_SECS
        }
    }
}

/// Rate ceiling from `SEC_EDGAR_RATE_LIMIT`
pub fn rate_limit_from_env() -> f64 {
    parse_rate_limit(std::env::var(RATE_LIMIT_VAR).ok().as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.rate_limit, 8.0);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.backoff_base(), Duration::from_secs(1));
        assert_eq!(config.identity(), Err(ConfigurationError::MissingIdentity));
    }

    #[test]
    fn test_lookup_overlay() {
        let config = HttpConfig::from_lookup(lookup(&[
            (USER_AGENT_VAR, " Jane Doe jane@example.com "),
            (RATE_LIMIT_VAR, "5"),
            (TIMEOUT_VAR, "10"),
        ]));
        assert_eq!(config.identity(), Ok("Jane Doe jane@example.com"));
        assert_eq!(config.rate_limit, 5.0);
        assert_eq!(config.timeout_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let config = HttpConfig::from_lookup(lookup(&[
            (RATE_LIMIT_VAR, "25"),
            (TIMEOUT_VAR, "-3"),
        ]));
        assert_eq!(config.rate_limit, DEFAULT_RATE_LIMIT);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);

        assert_eq!(parse_rate_limit(Some("0")), DEFAULT_RATE_LIMIT);
        assert_eq!(parse_rate_limit(Some("abc")), DEFAULT_RATE_LIMIT);
        assert_eq!(parse_rate_limit(Some("10")), 10.0);
        assert_eq!(parse_rate_limit(Some("0.5")), 0.5);
        assert_eq!(parse_timeout_secs(Some("0")), DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_identity_requires_contact() {
        let config = HttpConfig::from_lookup(lookup(&[(USER_AGENT_VAR, "Jane Doe")]));
        assert!(matches!(
            config.identity(),
            Err(ConfigurationError::IdentityWithoutContact(_))
        ));
        assert!(config.validate().is_err());

        let blank = HttpConfig::from_lookup(lookup(&[(USER_AGENT_VAR, "   ")]));
        assert_eq!(blank.identity(), Err(ConfigurationError::MissingIdentity));
    }

    #[test]
    fn test_sanitized() {
        let config = HttpConfig {
            rate_limit: 50.0,
            timeout_secs: 0,
            ..HttpConfig::default()
        }
        .sanitized();
        assert_eq!(config.rate_limit, DEFAULT_RATE_LIMIT);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = HttpConfig {
            user_agent: Some("Jane jane@example.com".to_string()),
            rate_limit: 4.0,
            ..HttpConfig::default()
        };
        let toml = config.to_toml().unwrap();
        assert_eq!(HttpConfig::from_toml(&toml).unwrap(), config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = HttpConfig::from_toml("user_agent = \"Jane jane@example.com\"\n").unwrap();
        assert_eq!(config.rate_limit, DEFAULT_RATE_LIMIT);
        assert_eq!(config.max_attempts, DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn test_file_then_env_overlay() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "user_agent = \"File file@example.com\"").unwrap();
        writeln!(file, "rate_limit = 2.0").unwrap();

        let config = HttpConfig::from_file(file.path())
            .unwrap()
            .overlay(lookup(&[(RATE_LIMIT_VAR, "6")]));
        assert_eq!(config.identity(), Ok("File file@example.com"));
        assert_eq!(config.rate_limit, 6.0);
    }

    #[test]
    fn test_missing_file() {
        assert!(HttpConfig::from_file("/nonexistent/tallyman.toml").is_err());
    }
}
