//! Application Configuration - store, pipeline and per-plugin settings
//!
//! Every section implements `Default`, so an empty or missing file yields a
//! working configuration against the default profile store.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults::{
    CONFIG_ENV_VAR, DEFAULT_CONCURRENCY, DEFAULT_PLUGIN, DEFAULT_STORE_PATH, LOCAL_CONFIG_FILE,
    MAX_CONCURRENCY,
};
use super::options::FromProfileOptions;
use crate::plugin::FROM_PROFILE_PLUGIN;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a geo-fixing deployment.
///
/// Load with `AppConfig::load()` which searches:
/// 1. `$GEOFIX_CONFIG` env var
/// 2. `./geofix.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Profile database location
    #[serde(default)]
    pub store: StoreConfig,

    /// Operator selection and concurrency
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Raw per-plugin option tables, keyed by plugin name
    #[serde(default)]
    pub plugins: toml::Table,
}

impl AppConfig {
    /// Load configuration using the standard search order:
    /// 1. `$GEOFIX_CONFIG` environment variable
    /// 2. `./geofix.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), plugin = %config.pipeline.plugin, "Loaded config from GEOFIX_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from GEOFIX_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "GEOFIX_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./geofix.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(plugin = %config.pipeline.plugin, "Loaded config from ./geofix.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./geofix.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No geofix.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML document held in memory.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section, collecting all problems rather than stopping at the first.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.store.path.as_os_str().is_empty() {
            errors.push("store.path must not be empty".to_string());
        }

        if self.pipeline.plugin.trim().is_empty() {
            errors.push("pipeline.plugin must not be empty".to_string());
        }

        if !(1..=MAX_CONCURRENCY).contains(&self.pipeline.concurrency) {
            errors.push(format!(
                "pipeline.concurrency must be between 1 and {MAX_CONCURRENCY}, got {}",
                self.pipeline.concurrency
            ));
        }

        for (name, value) in &self.plugins {
            if !value.is_table() {
                errors.push(format!("plugins.{name} must be a table"));
            }
        }

        if let Some(value) = self.plugins.get(FROM_PROFILE_PLUGIN) {
            match FromProfileOptions::from_toml(value) {
                Ok(options) => errors.extend(
                    options
                        .problems()
                        .into_iter()
                        .map(|p| format!("plugins.{FROM_PROFILE_PLUGIN}: {p}")),
                ),
                Err(e) => errors.push(format!("plugins.{FROM_PROFILE_PLUGIN}: {e}")),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Options table for `plugin`, or an empty table when none is configured.
    pub fn plugin_options(&self, plugin: &str) -> toml::Value {
        self.plugins
            .get(plugin)
            .cloned()
            .unwrap_or_else(|| toml::Value::Table(toml::Table::new()))
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Sled database directory
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Registered name of the geo-fixing plugin to run
    #[serde(default = "default_plugin")]
    pub plugin: String,

    /// Messages processed concurrently (output order is preserved)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            plugin: default_plugin(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_plugin() -> String {
    DEFAULT_PLUGIN.to_string()
}

const fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(_, e) => Some(e),
            ConfigError::Parse(_, e) => Some(e),
            ConfigError::Serialize(e) => Some(e),
            ConfigError::Validation(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = AppConfig::from_toml_str("").expect("empty TOML should parse");
        assert_eq!(config.store.path, PathBuf::from(DEFAULT_STORE_PATH));
        assert_eq!(config.pipeline.plugin, "fromprofile");
        assert_eq!(config.pipeline.concurrency, DEFAULT_CONCURRENCY);
        assert!(config.plugins.is_empty());
    }

    #[test]
    fn test_plugin_options_default_to_empty_table() {
        let config = AppConfig::default();
        let options = config.plugin_options("fromprofile");
        assert!(options.as_table().is_some_and(toml::Table::is_empty));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let err = AppConfig::from_toml_str("[pipeline]\nconcurrency = 0\n").unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("pipeline.concurrency"));
            }
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_all_problems_reported() {
        let toml_str = r#"
[store]
path = ""

[pipeline]
plugin = " "
concurrency = 100000

[plugins.fromprofile]
db = "__sled__default"
"#;
        let Err(ConfigError::Validation(errors)) = AppConfig::from_toml_str(toml_str) else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 4, "got: {errors:?}");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[pipeline]\nconcurrency = 4\n\n[plugins.fromprofile]\ndb = \"crowd\""
        )
        .unwrap();

        let config = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.pipeline.concurrency, 4);
        assert_eq!(config.plugin_options("fromprofile")["db"].as_str(), Some("crowd"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AppConfig::load_from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
        assert!(err.to_string().contains("Config I/O error"));
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let config = AppConfig::default();
        let text = config.to_toml().unwrap();
        let back = AppConfig::from_toml_str(&text).unwrap();
        assert_eq!(back.pipeline.plugin, config.pipeline.plugin);
        assert_eq!(back.store.path, config.store.path);
    }
}
