//! Configuration for plugin-deps
//!
//! User settings live in one TOML file:
//!
//! - Unix/macOS: `~/.plugin-deps/config.toml`
//! - Windows: `%LOCALAPPDATA%\plugin-deps\config.toml`
//! - Override: `--config <path>` or the `PLUGIN_DEPS_CONFIG` environment variable
//!
//! A missing file means defaults. Every field is optional:
//!
//! ```toml
//! [resolver]
//! metadata_ttl_secs = 43200
//! synthesized_ttl_secs = 600   # 0 disables caching of placeholder records
//! fetch_timeout_secs = 10
//! max_concurrency = 8
//!
//! [cache]
//! path = "/custom/metadata-cache.json"
//! persist = true
//!
//! [[endpoints]]
//! identifier = "ext"
//! url = "https://example.com/ext.json"
//! ```
//!
//! Configured endpoints are default endpoints: they are tried after any inline
//! override, in file order.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::constants::{
    APP_DIR_NAME, DEFAULT_FETCH_TIMEOUT, DEFAULT_METADATA_TTL, DEFAULT_SYNTHESIZED_TTL,
    default_max_concurrency,
};
use crate::core::PluginDepsError;
use crate::resolver::ResolverOptions;
use crate::source::EndpointProvider;

/// Name of the persisted cache snapshot inside the app directory.
const CACHE_FILE_NAME: &str = "metadata-cache.json";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub resolver: ResolverSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    /// Default endpoints, in the order they should be tried.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<EndpointEntry>,
}

/// `[resolver]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverSettings {
    #[serde(default = "default_metadata_ttl_secs")]
    pub metadata_ttl_secs: u64,

    #[serde(default = "default_synthesized_ttl_secs")]
    pub synthesized_ttl_secs: u64,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Omitted means `max(4, cores * 2)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,
}

fn default_metadata_ttl_secs() -> u64 {
    DEFAULT_METADATA_TTL.as_secs()
}

fn default_synthesized_ttl_secs() -> u64 {
    DEFAULT_SYNTHESIZED_TTL.as_secs()
}

fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT.as_secs()
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            metadata_ttl_secs: default_metadata_ttl_secs(),
            synthesized_ttl_secs: default_synthesized_ttl_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            max_concurrency: None,
        }
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Snapshot location; omitted means the app directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Whether the CLI loads and saves the snapshot.
    #[serde(default = "default_persist")]
    pub persist: bool,
}

fn default_persist() -> bool {
    true
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            path: None,
            persist: default_persist(),
        }
    }
}

/// One `[[endpoints]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointEntry {
    pub identifier: String,
    pub url: String,
}

impl Config {
    /// Load from the default location, or defaults when the file is missing.
    pub async fn load() -> Result<Self> {
        Self::load_with_optional(None).await
    }

    /// Load from `path` when given, otherwise from the default location.
    ///
    /// A missing file yields the defaults either way.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate a specific file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&content).map_err(|e| PluginDepsError::ConfigError {
            message: format!("Failed to parse config from {}: {e}", path.display()),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.resolver.max_concurrency == Some(0) {
            return Err(PluginDepsError::ConfigError {
                message: "resolver.max_concurrency must be at least 1".to_string(),
            }
            .into());
        }
        if self.resolver.fetch_timeout_secs == 0 {
            return Err(PluginDepsError::ConfigError {
                message: "resolver.fetch_timeout_secs must be at least 1".to_string(),
            }
            .into());
        }
        if let Some(entry) = self.endpoints.iter().find(|e| e.identifier.trim().is_empty() || e.url.trim().is_empty())
        {
            return Err(PluginDepsError::ConfigError {
                message: format!(
                    "endpoint entries need both an identifier and a url (got identifier '{}', url '{}')",
                    entry.identifier, entry.url
                ),
            }
            .into());
        }
        Ok(())
    }

    /// Directory holding the config file and cache snapshot.
    pub fn app_dir() -> Result<PathBuf> {
        if cfg!(target_os = "windows") {
            Ok(dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("plugin-deps"))
        } else {
            Ok(dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(APP_DIR_NAME))
        }
    }

    /// Default config file location.
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join("config.toml"))
    }

    /// Where the cache snapshot is persisted.
    pub fn cache_path(&self) -> Result<PathBuf> {
        match &self.cache.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::app_dir()?.join(CACHE_FILE_NAME)),
        }
    }

    /// Resolver options derived from the `[resolver]` section.
    pub fn resolver_options(&self) -> ResolverOptions {
        let settings = &self.resolver;
        ResolverOptions {
            metadata_ttl: Duration::from_secs(settings.metadata_ttl_secs),
            synthesized_ttl: Duration::from_secs(settings.synthesized_ttl_secs),
            fetch_timeout: Duration::from_secs(settings.fetch_timeout_secs),
            max_concurrency: settings.max_concurrency.unwrap_or_else(default_max_concurrency),
        }
    }
}

impl EndpointProvider for Config {
    fn default_endpoints(&self) -> Vec<(String, String)> {
        self.endpoints.iter().map(|entry| (entry.identifier.clone(), entry.url.clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn write_config(content: &str) -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, content).await.unwrap();
        (temp, path)
    }

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_with_optional(Some(temp.path().join("absent.toml"))).await.unwrap();
        assert_eq!(config, Config::default());

        let options = config.resolver_options();
        assert_eq!(options.metadata_ttl, DEFAULT_METADATA_TTL);
        assert_eq!(options.synthesized_ttl, DEFAULT_SYNTHESIZED_TTL);
        assert!(config.cache.persist);
    }

    #[tokio::test]
    async fn test_full_config() {
        let (_temp, path) = write_config(
            r#"
[resolver]
metadata_ttl_secs = 60
synthesized_ttl_secs = 0
fetch_timeout_secs = 3
max_concurrency = 2

[cache]
path = "/tmp/plugin-deps-cache.json"
persist = false

[[endpoints]]
identifier = "ext"
url = "https://example.com/ext.json"

[[endpoints]]
identifier = "ext"
url = "https://mirror.example/ext.json"
"#,
        )
        .await;

        let config = Config::load_from(&path).await.unwrap();
        let options = config.resolver_options();
        assert_eq!(options.metadata_ttl, Duration::from_secs(60));
        assert_eq!(options.synthesized_ttl, Duration::ZERO);
        assert_eq!(options.fetch_timeout, Duration::from_secs(3));
        assert_eq!(options.max_concurrency, 2);
        assert!(!config.cache.persist);
        assert_eq!(config.cache_path().unwrap(), PathBuf::from("/tmp/plugin-deps-cache.json"));

        let endpoints = config.default_endpoints();
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[1].1, "https://mirror.example/ext.json");
    }

    #[tokio::test]
    async fn test_partial_sections_use_defaults() {
        let (_temp, path) = write_config("[resolver]\nfetch_timeout_secs = 5\n").await;
        let config = Config::load_from(&path).await.unwrap();
        assert_eq!(config.resolver.fetch_timeout_secs, 5);
        assert_eq!(config.resolver.metadata_ttl_secs, DEFAULT_METADATA_TTL.as_secs());
        assert!(config.endpoints.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_values_are_rejected() {
        let (_temp, path) = write_config("[resolver]\nmax_concurrency = 0\n").await;
        let err = Config::load_from(&path).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<PluginDepsError>(), Some(PluginDepsError::ConfigError { .. })));

        let (_temp, path) = write_config("[[endpoints]]\nidentifier = \"\"\nurl = \"https://x\"\n").await;
        assert!(Config::load_from(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_toml() {
        let (_temp, path) = write_config("[resolver\n").await;
        let err = Config::load_from(&path).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));

        let ctx = crate::core::user_friendly_error(err);
        assert!(matches!(ctx.error, PluginDepsError::ConfigError { .. }));
        let rendered = ctx.to_string();
        assert!(rendered.contains(&path.display().to_string()));
        assert!(!rendered.contains("units manifest"));
    }

    #[test]
    fn test_serialize_round_trip() {
        let config = Config {
            endpoints: vec![EndpointEntry {
                identifier: "ext".into(),
                url: "https://example.com/ext.json".into(),
            }],
            ..Config::default()
        };
        let text = toml::to_string(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
