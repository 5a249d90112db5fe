//! Engine configuration loaded from `haulplan.toml`.
//!
//! [`EngineConfig`] holds every tunable. Values missing from the file use
//! sensible defaults, and the `HAULPLAN_API_KEY` environment variable takes
//! precedence over the file for the store credential.

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the record store API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key sent with every store request.
    #[serde(default)]
    pub api_key: String,

    /// Window width, in hours, applied when a window stop is rescheduled
    /// before its bounds were ever set.
    #[serde(default = "default_window_hours")]
    pub default_window_hours: i64,

    /// Per-request timeout for store calls, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:8787".to_string()
}

fn default_window_hours() -> i64 {
    4
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: String::new(),
            default_window_hours: default_window_hours(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl EngineConfig {
    /// Load the configuration from the given path, or `haulplan.toml` in
    /// the current directory. Defaults apply when the file does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_overrides(path, std::env::var("HAULPLAN_API_KEY").ok())
    }

    fn load_with_overrides(path: Option<&Path>, api_key_env: Option<String>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new("haulplan.toml"));
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<EngineConfig>(&contents)?
        } else {
            Self::default()
        };

        // Environment variable wins over the config file for the API key.
        if let Some(key) = api_key_env {
            if !key.is_empty() {
                config.api_key = key;
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_values() {
        let config = EngineConfig::default();
        assert_eq!(config.api_url, "http://localhost:8787");
        assert_eq!(config.default_window_hours, 4);
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            api_key = "hk-test-123"
            default_window_hours = 2
        "#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api_key, "hk-test-123");
        assert_eq!(config.default_window_hours, 2);
        assert_eq!(config.api_url, "http://localhost:8787");
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn load_reads_the_given_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_url = \"https://ops.example.com\"").unwrap();
        writeln!(file, "request_timeout_secs = 5").unwrap();

        let config = EngineConfig::load_with_overrides(Some(file.path()), None).unwrap();
        assert_eq!(config.api_url, "https://ops.example.com");
        assert_eq!(config.request_timeout_secs, 5);
    }

    #[test]
    fn env_var_overrides_the_file_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_key = \"from-file\"").unwrap();

        let config =
            EngineConfig::load_with_overrides(Some(file.path()), Some("from-env".to_string()))
                .unwrap();
        assert_eq!(config.api_key, "from-env");

        let config = EngineConfig::load_with_overrides(Some(file.path()), None).unwrap();
        assert_eq!(config.api_key, "from-file");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config =
            EngineConfig::load_with_overrides(Some(Path::new("/nonexistent/haulplan.toml")), None)
                .unwrap();
        assert_eq!(config.default_window_hours, 4);
    }
}
