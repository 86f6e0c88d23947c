//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value. The
//! CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables: `BUDDY_<SECTION>__<KEY>`, e.g.
//!    `BUDDY_DATABASE__PATH=/tmp/app.json`
//! 3. Config file (`--config`, or [`AppConfig::config_path`] when present)
//! 4. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

use stacks_adapters::Dialect;
use stacks_core::domain::DEFAULT_PAGE_SIZE;

const ENV_PREFIX: &str = "BUDDY";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Storage settings.
    pub database: DatabaseConfig,
    /// Output settings.
    pub output: OutputConfig,
    /// Where user-defined models live.
    pub models: ModelsConfig,
    /// Paging defaults for `buddy all`.
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// JSON database document.
    pub path: PathBuf,
    /// Dialect `buddy explain` renders for.
    pub dialect: Dialect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Directory of `*.toml` model definitions, loaded on top of the
    /// built-in models.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_limit: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                path: Self::default_database_path(),
                dialect: Dialect::default(),
            },
            output: OutputConfig {
                no_color: false,
                format: "auto".into(),
            },
            models: ModelsConfig::default(),
            pagination: PaginationConfig {
                default_limit: DEFAULT_PAGE_SIZE,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration, starting from defaults.
    ///
    /// `config_file` is the path the user passed via `--config`; it must
    /// exist. Without it the default location is used when present.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let default_path = Self::config_path();
        let (path, required) = match config_file {
            Some(path) => (path.as_path(), true),
            None => (default_path.as_path(), false),
        };
        Self::load_from(path, required)
    }

    fn load_from(path: &Path, required: bool) -> anyhow::Result<Self> {
        debug!(path = %path.display(), required, "Loading configuration");

        let defaults = Config::try_from(&Self::default())
            .context("Failed to encode built-in configuration defaults")?;

        let settings = Config::builder()
            .add_source(defaults)
            .add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(required),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from '{}'", path.display()))?;

        settings
            .try_deserialize()
            .context("Configuration has invalid values")
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.buddy.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("org", "stacks", "buddy")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".buddy.toml"))
    }

    fn default_database_path() -> PathBuf {
        directories::ProjectDirs::from("org", "stacks", "buddy")
            .map(|d| d.data_dir().join("database.json"))
            .unwrap_or_else(|| PathBuf::from(".buddy/database.json"))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_limit_matches_core() {
        assert_eq!(AppConfig::default().pagination.default_limit, 10);
    }

    #[test]
    fn default_dialect_is_sqlite() {
        assert_eq!(AppConfig::default().database.dialect, Dialect::Sqlite);
    }

    #[test]
    fn missing_optional_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let cfg = AppConfig::load_from(&temp.path().join("absent.toml"), false).unwrap();
        assert_eq!(cfg.output.format, "auto");
        assert!(cfg.models.path.is_none());
    }

    #[test]
    fn missing_required_file_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(AppConfig::load_from(&temp.path().join("absent.toml"), true).is_err());
    }

    #[test]
    fn file_overrides_defaults_per_key() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "[database]\npath = \"/tmp/app.json\"\ndialect = \"postgres\"\n\n[pagination]\ndefault_limit = 25\n",
        )
        .unwrap();

        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.database.path, PathBuf::from("/tmp/app.json"));
        assert_eq!(cfg.database.dialect, Dialect::Postgres);
        assert_eq!(cfg.pagination.default_limit, 25);
        assert!(!cfg.output.no_color);
    }

    #[test]
    fn invalid_value_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[database]\ndialect = \"oracle\"\n").unwrap();

        assert!(AppConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let toml = toml::to_string_pretty(&AppConfig::default()).unwrap();
        assert!(toml.contains("[database]"));
        assert!(toml.contains("default_limit = 10"));
    }

    #[test]
    fn config_path_is_not_empty() {
        let p = AppConfig::config_path();
        assert!(!p.as_os_str().is_empty());
    }
}
