//! Provider configuration loading and validation.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (explicit)
//! 2. `~/.vcloud/config.toml` (user)
//! 3. `/etc/vcloud/config.toml` (system)
//!
//! The provider token may be omitted from the file and supplied through the
//! `VCLOUD_PROVIDER_TOKEN` environment variable instead.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::api::RetryPolicy;
use crate::cache::CacheConfig;
use crate::{Result, VCloudError};

/// Environment variable consulted when the config file has no token.
pub const TOKEN_ENV_VAR: &str = "VCLOUD_PROVIDER_TOKEN";

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub vcloud: VCloudConfig,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Cluster identity and management endpoint.
#[derive(Clone, Default, Deserialize)]
pub struct VCloudConfig {
    #[serde(default)]
    pub cluster_id: String,
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub mgmt_url: String,
    #[serde(default)]
    pub provider_token: Option<String>,
}

impl std::fmt::Debug for VCloudConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VCloudConfig")
            .field("cluster_id", &self.cluster_id)
            .field("cluster_name", &self.cluster_name)
            .field("mgmt_url", &self.mgmt_url)
            .field("provider_token", &self.provider_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Instance cache tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// TTL for instances that exist (default: 30).
    #[serde(default = "default_present_ttl")]
    pub present_ttl_secs: u64,
    /// TTL for instances confirmed absent (default: 5).
    #[serde(default = "default_absent_ttl")]
    pub absent_ttl_secs: u64,
    /// Entry count above which expired entries are swept (default: 100).
    #[serde(default = "default_sweep_threshold")]
    pub sweep_threshold: usize,
    /// Collapse concurrent misses for the same instance into one fetch.
    #[serde(default)]
    pub single_flight: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            present_ttl_secs: default_present_ttl(),
            absent_ttl_secs: default_absent_ttl(),
            sweep_threshold: default_sweep_threshold(),
            single_flight: false,
        }
    }
}

fn default_present_ttl() -> u64 {
    30
}

fn default_absent_ttl() -> u64 {
    5
}

fn default_sweep_threshold() -> usize {
    100
}

impl From<CacheSettings> for CacheConfig {
    fn from(settings: CacheSettings) -> Self {
        CacheConfig::new()
            .present_ttl(Duration::from_secs(settings.present_ttl_secs))
            .absent_ttl(Duration::from_secs(settings.absent_ttl_secs))
            .sweep_threshold(settings.sweep_threshold)
            .single_flight(settings.single_flight)
    }
}

/// HTTP client behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Per-attempt timeout in seconds (default: 60).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Attempts per request, including the first (default: 3).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Linear backoff unit in milliseconds (default: 1000).
    #[serde(default = "default_backoff_step")]
    pub backoff_step_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_attempts: default_max_attempts(),
            backoff_step_ms: default_backoff_step(),
        }
    }
}

fn default_timeout() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_step() -> u64 {
    1000
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new()
            .max_attempts(self.max_attempts)
            .backoff_step(Duration::from_millis(self.backoff_step_ms))
    }
}

impl VCloudConfig {
    /// Token from the file, or from `VCLOUD_PROVIDER_TOKEN` if the file has none.
    pub fn token(&self) -> Option<String> {
        self.provider_token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var(TOKEN_ENV_VAR).ok().filter(|t| !t.is_empty()))
    }

    /// Check that all required fields are present and well-formed.
    pub fn validate(&self) -> Result<()> {
        if self.cluster_id.is_empty() {
            return Err(invalid("cluster_id is required"));
        }
        if self.cluster_name.is_empty() {
            return Err(invalid("cluster_name is required"));
        }
        if self.mgmt_url.is_empty() {
            return Err(invalid("mgmt_url is required"));
        }
        if self.token().is_none() {
            return Err(invalid(&format!(
                "provider_token is required (or set {TOKEN_ENV_VAR})"
            )));
        }

        uuid::Uuid::parse_str(&self.cluster_id)
            .map_err(|e| invalid(&format!("cluster_id must be a valid UUID: {e}")))?;

        let url = reqwest::Url::parse(&self.mgmt_url)
            .map_err(|e| invalid(&format!("mgmt_url must be a valid URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(&format!(
                "mgmt_url must be a valid URL: unsupported scheme '{}'",
                url.scheme()
            )));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> VCloudError {
    VCloudError::Configuration(format!("invalid vcloud config: {message}"))
}

impl Config {
    /// Load configuration from the standard locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_config_path(explicit_path)?;
        let content = fs::read_to_string(&path).map_err(|e| {
            VCloudError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            VCloudError::Configuration(msg) => {
                VCloudError::Configuration(format!("{msg} (in {path:?})"))
            }
            other => other,
        })
    }

    /// Parse configuration from TOML text. Does not validate.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| VCloudError::Configuration(format!("Failed to parse config: {e}")))
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
            return Err(VCloudError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".vcloud").join("config.toml");
            if user_config.exists() {
                return Ok(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/vcloud/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }

        Err(VCloudError::Configuration(
            "No config file found. Create ~/.vcloud/config.toml or /etc/vcloud/config.toml"
                .to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> VCloudConfig {
        VCloudConfig {
            cluster_id: "d73c6df2-f7fe-4f7c-bf70-9f94cce26430".into(),
            cluster_name: "test-cluster".into(),
            mgmt_url: "https://api.vcloud.example.com".into(),
            provider_token: Some("test-token".into()),
        }
    }

    fn validation_error(cfg: VCloudConfig) -> String {
        cfg.validate().unwrap_err().to_string()
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn missing_cluster_id_rejected() {
        let cfg = VCloudConfig {
            cluster_id: String::new(),
            ..valid()
        };
        assert!(validation_error(cfg).contains("cluster_id is required"));
    }

    #[test]
    fn missing_cluster_name_rejected() {
        let cfg = VCloudConfig {
            cluster_name: String::new(),
            ..valid()
        };
        assert!(validation_error(cfg).contains("cluster_name is required"));
    }

    #[test]
    fn missing_mgmt_url_rejected() {
        let cfg = VCloudConfig {
            mgmt_url: String::new(),
            ..valid()
        };
        assert!(validation_error(cfg).contains("mgmt_url is required"));
    }

    #[test]
    fn invalid_cluster_id_rejected() {
        let cfg = VCloudConfig {
            cluster_id: "invalid-uuid".into(),
            ..valid()
        };
        assert!(validation_error(cfg).contains("cluster_id must be a valid UUID"));
    }

    #[test]
    fn invalid_url_rejected() {
        let cfg = VCloudConfig {
            mgmt_url: "not-a-url".into(),
            ..valid()
        };
        assert!(validation_error(cfg).contains("mgmt_url must be a valid URL"));
    }

    #[test]
    fn non_http_scheme_rejected() {
        let cfg = VCloudConfig {
            mgmt_url: "ftp://api.vcloud.example.com".into(),
            ..valid()
        };
        assert!(validation_error(cfg).contains("unsupported scheme"));
    }

    #[test]
    fn parse_minimal_config_uses_defaults() {
        let toml = r#"
            [vcloud]
            cluster_id = "d73c6df2-f7fe-4f7c-bf70-9f94cce26430"
            cluster_name = "test-cluster"
            mgmt_url = "https://api.vcloud.example.com"
            provider_token = "test-token"
        "#;
        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(config.vcloud.cluster_name, "test-cluster");
        assert_eq!(config.cache.present_ttl_secs, 30);
        assert_eq!(config.cache.absent_ttl_secs, 5);
        assert_eq!(config.cache.sweep_threshold, 100);
        assert!(!config.cache.single_flight);
        assert_eq!(config.http.timeout(), Duration::from_secs(60));
        assert_eq!(config.http.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [vcloud]
            cluster_id = "d73c6df2-f7fe-4f7c-bf70-9f94cce26430"
            cluster_name = "prod"
            mgmt_url = "https://mgmt.example.com/api/v1"
            provider_token = "secret"

            [cache]
            present_ttl_secs = 60
            absent_ttl_secs = 2
            sweep_threshold = 500
            single_flight = true

            [http]
            timeout_secs = 10
            max_attempts = 5
            backoff_step_ms = 250
        "#;
        let config = Config::from_toml_str(toml).unwrap();
        let cache: CacheConfig = config.cache.clone().into();
        assert_eq!(cache.present_ttl, Duration::from_secs(60));
        assert_eq!(cache.absent_ttl, Duration::from_secs(2));
        assert_eq!(cache.sweep_threshold, 500);
        assert!(cache.single_flight);

        let policy = config.http.retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(500));
        assert_eq!(config.http.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn missing_vcloud_section_is_parse_error() {
        let err = Config::from_toml_str("[cache]\nabsent_ttl_secs = 1\n").unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [vcloud]
            cluster_id = "d73c6df2-f7fe-4f7c-bf70-9f94cce26430"
            cluster_name = "from-file"
            mgmt_url = "https://api.vcloud.example.com"
            provider_token = "t"
            "#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.vcloud.cluster_name, "from-file");
        assert!(config.vcloud.validate().is_ok());
    }

    #[test]
    fn config_not_found_returns_error() {
        let result = Config::load(Some(Path::new("/nonexistent/config.toml")));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Config file not found"));
    }
}
