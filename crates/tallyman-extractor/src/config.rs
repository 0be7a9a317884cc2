//! Configuration for the Extractor

use serde::{Deserialize, Serialize};

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Display texts that stand for "no value" and are skipped
    ///
    /// Empty text and truncated `--MM-DD` date artifacts are always skipped.
    #[serde(default = "default_placeholder_sentinels")]
    pub placeholder_sentinels: Vec<String>,

    /// Unit reported for numeric facts whose unit cannot be resolved
    #[serde(default = "default_unit")]
    pub default_unit: String,

    /// Query the parsed handle when direct extraction finds nothing
    #[serde(default = "default_true")]
    pub enable_structured_fallback: bool,

    /// Consult concept history when structured queries find nothing
    #[serde(default = "default_true")]
    pub enable_history_fallback: bool,
}

fn default_placeholder_sentinels() -> Vec<String> {
    // Em-dash, double hyphen, and an em-dash mis-decoded as Latin-1
    vec!["—".to_string(), "--".to_string(), "â€”".to_string()]
}

fn default_unit() -> String {
    "USD".to_string()
}

fn default_true() -> bool {
    true
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.default_unit.trim().is_empty() {
            return Err("default_unit must not be empty".to_string());
        }
        if self.placeholder_sentinels.iter().any(|s| s.trim().is_empty()) {
            return Err("placeholder_sentinels must not contain blank entries".to_string());
        }
        Ok(())
    }

    /// Direct pattern extraction only, no handle fallbacks
    pub fn direct_only() -> Self {
        Self {
            enable_structured_fallback: false,
            enable_history_fallback: false,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            placeholder_sentinels: default_placeholder_sentinels(),
            default_unit: default_unit(),
            enable_structured_fallback: true,
            enable_history_fallback: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_unit, "USD");
        assert!(config.placeholder_sentinels.contains(&"—".to_string()));
    }

    #[test]
    fn test_direct_only_is_valid() {
        let config = ExtractorConfig::direct_only();
        assert!(config.validate().is_ok());
        assert!(!config.enable_structured_fallback);
        assert!(!config.enable_history_fallback);
    }

    #[test]
    fn test_invalid_default_unit() {
        let mut config = ExtractorConfig::default();
        config.default_unit = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_sentinel_rejected() {
        let mut config = ExtractorConfig::default();
        config.placeholder_sentinels.push(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = ExtractorConfig {
            default_unit: "EUR".to_string(),
            enable_history_fallback: false,
            ..ExtractorConfig::default()
        };
        let toml = config.to_toml().unwrap();
        assert_eq!(ExtractorConfig::from_toml(&toml).unwrap(), config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ExtractorConfig::from_toml("enable_structured_fallback = false\n").unwrap();
        assert!(!config.enable_structured_fallback);
        assert!(config.enable_history_fallback);
        assert_eq!(config.placeholder_sentinels.len(), 3);
    }
}
