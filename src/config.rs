//! Top-level application configuration.
//!
//! Configuration is stored in `.casebook/config.yaml` (or the file named by
//! `CASEBOOK_CONFIG`) and includes:
//! - The REST backend base URL and API token
//! - Cache freshness and garbage-collection windows
//! - Read retry policy
//! - List view behavior (debounce, page size, selection policy)

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{CasebookError, Result};

/// Directory holding the configuration file, relative to the working directory
pub const CONFIG_DIR: &str = ".casebook";

/// Largest page size the backend accepts
pub const MAX_PAGE_SIZE: u32 = 100;

const CONFIG_PATH_ENV: &str = "CASEBOOK_CONFIG";
const API_URL_ENV: &str = "CASEBOOK_API_URL";
const API_TOKEN_ENV: &str = "CASEBOOK_API_TOKEN";

#[cfg(test)]
pub(crate) const ENV_VARS: [&str; 3] = [CONFIG_PATH_ENV, API_URL_ENV, API_TOKEN_ENV];

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub view: ViewConfig,
}

/// REST backend connection settings
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Request timeout in milliseconds (default: 10s)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api/v1".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Query cache windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a cached result is served without a network call (default: 5 min)
    #[serde(default = "default_stale_time_ms")]
    pub stale_time_ms: u64,

    /// How long an unused entry is kept before eviction (default: 1 hour)
    #[serde(default = "default_gc_time_ms")]
    pub gc_time_ms: u64,
}

fn default_stale_time_ms() -> u64 {
    5 * 60 * 1000
}

fn default_gc_time_ms() -> u64 {
    60 * 60 * 1000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time_ms: default_stale_time_ms(),
            gc_time_ms: default_gc_time_ms(),
        }
    }
}

/// Retry policy for idempotent reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Fraction of the backoff delay added as random jitter
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    8_000
}

fn default_jitter() -> f64 {
    0.3
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter: default_jitter(),
        }
    }
}

/// List view behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Keep selected ids when a filter change hides their rows
    #[serde(default = "default_true")]
    pub persist_selection_across_filter_changes: bool,

    /// Keep a dismissed dialog mounted until its close transition reports completion
    #[serde(default = "default_true")]
    pub animate_dialog_close: bool,
}

fn default_search_debounce_ms() -> u64 {
    300
}

fn default_page_size() -> u32 {
    20
}

fn default_true() -> bool {
    true
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: default_search_debounce_ms(),
            page_size: default_page_size(),
            persist_selection_across_filter_changes: true,
            animate_dialog_close: true,
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        if let Ok(path) = env::var(CONFIG_PATH_ENV)
            && !path.is_empty()
        {
            return PathBuf::from(path);
        }
        PathBuf::from(CONFIG_DIR).join("config.yaml")
    }

    /// Load configuration from the default location, or return defaults if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, or return defaults if the file does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            CasebookError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                CasebookError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create directory for config at {}: {}",
                        parent.display(),
                        e
                    ),
                ))
            })?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content).map_err(|e| {
            CasebookError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write config at {}: {}", path.display(), e),
            ))
        })?;

        // The file may hold an API token
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, permissions)?;
        }

        Ok(())
    }

    /// Reject settings the rest of the crate cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.view.page_size == 0 || self.view.page_size > MAX_PAGE_SIZE {
            return Err(CasebookError::Config(format!(
                "view.page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.view.page_size
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(CasebookError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.retry.jitter) {
            return Err(CasebookError::Config(format!(
                "retry.jitter must be between 0.0 and 1.0, got {}",
                self.retry.jitter
            )));
        }
        Ok(())
    }

    /// Get the API base URL from the environment or the config file
    pub fn base_url(&self) -> String {
        if let Ok(url) = env::var(API_URL_ENV)
            && !url.is_empty()
        {
            return url;
        }
        self.api.base_url.clone()
    }

    /// Get the API token from the environment or the config file
    pub fn api_token(&self) -> Option<SecretString> {
        if let Ok(token) = env::var(API_TOKEN_ENV)
            && !token.is_empty()
        {
            return Some(SecretString::from(token));
        }
        self.api.token.clone().map(SecretString::from)
    }

    pub fn set_api_token(&mut self, token: String) {
        self.api.token = Some(token);
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.api.timeout_ms)
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_millis(self.cache.stale_time_ms)
    }

    pub fn gc_time(&self) -> Duration {
        Duration::from_millis(self.cache.gc_time_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.view.search_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_guards::EnvGuard;
    use secrecy::ExposeSecret;
    use serial_test::serial;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8080/api/v1");
        assert!(config.api.token.is_none());
        assert_eq!(config.view.search_debounce_ms, 300);
        assert_eq!(config.view.page_size, 20);
        assert!(config.view.persist_selection_across_filter_changes);
        assert_eq!(config.stale_time(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
view:
  page_size: 50
retry:
  max_attempts: 5
"#;
        let config: Config = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.view.page_size, 50);
        assert_eq!(config.view.search_debounce_ms, 300);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 1_000);
        assert_eq!(config.cache, CacheConfig::default());
    }

    #[test]
    fn test_validate_rejects_oversized_page() {
        let mut config = Config::default();
        config.view.page_size = 101;
        assert!(matches!(config.validate(), Err(CasebookError::Config(_))));

        config.view.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_retry() {
        let mut config = Config::default();
        config.retry.jitter = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut config = Config::default();
        config.set_api_token("secret-token-value".to_string());
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-token-value"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.api.base_url = "https://api.example.test/v1".to_string();
        config.view.persist_selection_across_filter_changes = false;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    #[serial]
    fn test_env_overrides_token_and_url() {
        let _env = unsafe {
            EnvGuard::clean()
                .set(API_TOKEN_ENV, "env-token")
                .set(API_URL_ENV, "https://env.example.test")
        };

        let mut config = Config::default();
        config.set_api_token("file-token".to_string());

        let token = config.api_token().unwrap();
        assert_eq!(token.expose_secret(), "env-token");
        assert_eq!(config.base_url(), "https://env.example.test");
    }

    #[test]
    #[serial]
    fn test_token_falls_back_to_file() {
        let _env = unsafe { EnvGuard::clean() };
        let mut config = Config::default();
        assert!(config.api_token().is_none());

        config.set_api_token("file-token".to_string());
        assert_eq!(config.api_token().unwrap().expose_secret(), "file-token");
    }
}
