// Client settings and fallback configuration lookup

use crate::errors::ConfigError;
use labelary_core::RenderConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;

/// Configuration key holding the fallback API key
pub const API_KEY: &str = "labelary.api_key";

/// Section of a JSON document holding the client settings
pub const SECTION: &str = "labelary";

pub const DEFAULT_PRINTERS_URL: &str = "http://api.labelary.com/v1/printers/";
pub const DEFAULT_BARCODES_URL: &str = "https://api.labelary.com/v1/barcodes";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings used to build a `LabelaryClient`
///
/// JSON documents may hold the settings at the root or under a `labelary`
/// section. Label parameters (`width`, `height`, `index`, `density`,
/// `api_key`) sit next to the endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelaryConfig {
    /// Base URL of the render endpoint
    pub printers_url: String,

    /// URL of the barcode endpoint
    pub barcodes_url: String,

    /// Request timeout in seconds; `None` leaves it to reqwest
    pub timeout_secs: Option<u64>,

    /// Ignore proxy settings from the environment
    pub no_proxy: bool,

    /// Initial label parameters
    #[serde(flatten)]
    pub label: RenderConfig,
}

impl Default for LabelaryConfig {
    fn default() -> Self {
        Self {
            printers_url: DEFAULT_PRINTERS_URL.to_string(),
            barcodes_url: DEFAULT_BARCODES_URL.to_string(),
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            no_proxy: false,
            label: RenderConfig::default(),
        }
    }
}

impl LabelaryConfig {
    /// Load settings from `LABELARY_*` environment variables
    ///
    /// Unset or empty variables keep their defaults. `LABELARY_TIMEOUT_SECS=0`
    /// disables the timeout.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(key) = read_env("LABELARY_API_KEY")? {
            config.label.api_key = Some(key);
        }
        if let Some(url) = read_env("LABELARY_PRINTERS_URL")? {
            config.printers_url = url;
        }
        if let Some(url) = read_env("LABELARY_BARCODES_URL")? {
            config.barcodes_url = url;
        }
        if let Some(value) = read_env("LABELARY_TIMEOUT_SECS")? {
            let secs: u64 = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: "LABELARY_TIMEOUT_SECS".to_string(),
                value: value.clone(),
            })?;
            config.timeout_secs = (secs > 0).then_some(secs);
        }
        if let Some(value) = read_env("LABELARY_NO_PROXY")? {
            config.no_proxy = parse_flag("LABELARY_NO_PROXY", &value)?;
        }

        Ok(config)
    }

    /// Load settings from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Self::from_json_value(serde_json::from_str(json)?)
    }

    /// Load settings from a parsed JSON document
    pub fn from_json_value(mut root: serde_json::Value) -> Result<Self, ConfigError> {
        let section = match root.get_mut(SECTION).map(serde_json::Value::take) {
            Some(section) => section,
            None => root,
        };
        Ok(serde_json::from_value(section)?)
    }

    /// Load settings from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Request timeout; zero seconds means none, as with `LABELARY_TIMEOUT_SECS=0`
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.filter(|secs| *secs > 0).map(Duration::from_secs)
    }
}

/// Read-only key/value lookup used for the fallback API key
///
/// Lookups are best-effort: the client treats an error the same as a
/// missing value.
pub trait ConfigSource: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError>;
}

/// Looks dotted keys up in the process environment
/// (`labelary.api_key` reads `LABELARY_API_KEY`)
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfig;

impl EnvConfig {
    pub fn variable_name(key: &str) -> String {
        key.replace('.', "_").to_ascii_uppercase()
    }
}

impl ConfigSource for EnvConfig {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        read_env(&Self::variable_name(key))
    }
}

/// Dotted-path lookup over a JSON document
#[derive(Debug, Clone)]
pub struct JsonConfig {
    root: serde_json::Value,
}

impl JsonConfig {
    pub fn from_value(root: serde_json::Value) -> Self {
        Self { root }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(Self::from_value(serde_json::from_str(json)?))
    }

    /// Wrap a settings document so its keys resolve under `labelary.*`,
    /// whether or not the document has a `labelary` section
    pub fn from_settings(root: serde_json::Value) -> Self {
        if root.get(SECTION).is_some() {
            Self::from_value(root)
        } else {
            let mut wrapped = serde_json::Map::new();
            wrapped.insert(SECTION.to_string(), root);
            Self::from_value(serde_json::Value::Object(wrapped))
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

impl ConfigSource for JsonConfig {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let mut node = &self.root;
        for segment in key.split('.') {
            match node.get(segment) {
                Some(child) => node = child,
                None => return Ok(None),
            }
        }

        match node {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::String(value) => Ok(Some(value.clone())),
            serde_json::Value::Bool(value) => Ok(Some(value.to_string())),
            serde_json::Value::Number(value) => Ok(Some(value.to_string())),
            _ => Err(ConfigError::NotAScalar(key.to_string())),
        }
    }
}

/// In-memory configuration
#[derive(Debug, Clone, Default)]
pub struct StaticConfig {
    values: HashMap<String, String>,
}

impl StaticConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl ConfigSource for StaticConfig {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.values.get(key).cloned())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Empty variables count as unset
fn read_env(name: &str) -> Result<Option<String>, ConfigError> {
    match env::var(name) {
        Ok(value) if value.is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode(name.to_string())),
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelary_core::Density;
    use serial_test::serial;

    const ENV_VARS: [&str; 5] = [
        "LABELARY_API_KEY",
        "LABELARY_PRINTERS_URL",
        "LABELARY_BARCODES_URL",
        "LABELARY_TIMEOUT_SECS",
        "LABELARY_NO_PROXY",
    ];

    fn clear_env() {
        for name in ENV_VARS {
            env::remove_var(name);
        }
    }

    #[test]
    fn test_default_config() {
        let config = LabelaryConfig::default();
        assert_eq!(config.printers_url, "http://api.labelary.com/v1/printers/");
        assert_eq!(config.barcodes_url, "https://api.labelary.com/v1/barcodes");
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert!(!config.no_proxy);
        assert_eq!(config.label, RenderConfig::default());
    }

    #[test]
    #[serial]
    fn test_from_env_defaults_when_unset() {
        clear_env();
        let config = LabelaryConfig::from_env().unwrap();
        assert_eq!(config, LabelaryConfig::default());
    }

    #[test]
    #[serial]
    fn test_from_env_reads_variables() {
        clear_env();
        env::set_var("LABELARY_API_KEY", "env-key");
        env::set_var("LABELARY_PRINTERS_URL", "http://localhost:1234");
        env::set_var("LABELARY_TIMEOUT_SECS", "0");
        env::set_var("LABELARY_NO_PROXY", "true");

        let config = LabelaryConfig::from_env().unwrap();
        clear_env();

        assert_eq!(config.label.api_key.as_deref(), Some("env-key"));
        assert_eq!(config.printers_url, "http://localhost:1234");
        assert_eq!(config.barcodes_url, DEFAULT_BARCODES_URL);
        assert_eq!(config.timeout(), None);
        assert!(config.no_proxy);
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_timeout() {
        clear_env();
        env::set_var("LABELARY_TIMEOUT_SECS", "soon");

        let result = LabelaryConfig::from_env();
        clear_env();

        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_from_json_with_section() {
        let json = r#"{
            "labelary": {
                "api_key": "json-key",
                "width": 2,
                "height": 1.25,
                "density": "12dpmm",
                "timeout_secs": 5
            }
        }"#;
        let config = LabelaryConfig::from_json_str(json).unwrap();

        assert_eq!(config.label.api_key.as_deref(), Some("json-key"));
        assert_eq!(config.label.width, 2.0);
        assert_eq!(config.label.height, 1.25);
        assert_eq!(config.label.density, Density::Dpmm12);
        assert_eq!(config.timeout_secs, Some(5));
        assert_eq!(config.printers_url, DEFAULT_PRINTERS_URL);
    }

    #[test]
    fn test_from_json_at_root() {
        let config = LabelaryConfig::from_json_str(r#"{"index": 2, "no_proxy": true}"#).unwrap();
        assert_eq!(config.label.index, Some(2));
        assert!(config.no_proxy);
    }

    #[test]
    fn test_json_zero_timeout_disables_timeout() {
        let config = LabelaryConfig::from_json_str(r#"{"timeout_secs": 0}"#).unwrap();
        assert_eq!(config.timeout_secs, Some(0));
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_json_settings_source_with_and_without_section() {
        let nested = JsonConfig::from_settings(serde_json::json!({"labelary": {"api_key": "nested"}}));
        assert_eq!(nested.get(API_KEY).unwrap().as_deref(), Some("nested"));

        let flat = JsonConfig::from_settings(serde_json::json!({"api_key": "flat"}));
        assert_eq!(flat.get(API_KEY).unwrap().as_deref(), Some("flat"));
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            LabelaryConfig::from_json_str("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_env_variable_name() {
        assert_eq!(EnvConfig::variable_name(API_KEY), "LABELARY_API_KEY");
    }

    #[test]
    #[serial]
    fn test_env_config_lookup() {
        clear_env();
        assert_eq!(EnvConfig.get(API_KEY).unwrap(), None);

        env::set_var("LABELARY_API_KEY", "from-env");
        let value = EnvConfig.get(API_KEY).unwrap();
        clear_env();

        assert_eq!(value.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_json_config_dotted_lookup() {
        let config = JsonConfig::from_json_str(
            r#"{"labelary": {"api_key": "abc", "retries": 3, "nested": {"a": 1}, "unset": null}}"#,
        )
        .unwrap();

        assert_eq!(config.get(API_KEY).unwrap().as_deref(), Some("abc"));
        assert_eq!(config.get("labelary.retries").unwrap().as_deref(), Some("3"));
        assert_eq!(config.get("labelary.unset").unwrap(), None);
        assert_eq!(config.get("labelary.missing").unwrap(), None);
        assert!(matches!(
            config.get("labelary.nested"),
            Err(ConfigError::NotAScalar(_))
        ));
    }

    #[test]
    fn test_static_config() {
        let config = StaticConfig::new().with(API_KEY, "static");
        assert_eq!(config.get(API_KEY).unwrap().as_deref(), Some("static"));
        assert_eq!(config.get("other").unwrap(), None);

        let collected: StaticConfig = [(API_KEY, "collected")].into_iter().collect();
        assert_eq!(collected.get(API_KEY).unwrap().as_deref(), Some("collected"));
    }
}
