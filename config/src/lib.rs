//! Configuration loading for tabsort.
//!
//! ```toml
//! [app]
//! log_filter = "debug"
//!
//! [settings]
//! remove_keywords = ["www."]
//!
//! [domain_aliases]
//! "github.com" = "GitHub"
//!
//! [[rules]]
//! id = "docs"
//! group_title = "Docs"
//! priority = 5
//! group_color = "blue"
//! match_type = "domain"
//! match_content = "docs.rs"
//! sort_index = 0
//! ```
//!
//! A missing file is not an error: it resolves to the empty configuration,
//! under which every tab falls back to domain grouping.

use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::Deserialize;

use tabsort_types::{Configuration, DomainAliasMap, Rule, Settings};

/// Overrides the default config location.
pub const CONFIG_PATH_ENV: &str = "TABSORT_CONFIG";

#[derive(Debug, Default, Deserialize)]
pub struct TabsortConfig {
    pub app: Option<AppConfig>,
    pub settings: Option<Settings>,
    pub domain_aliases: Option<DomainAliasMap>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

impl TabsortConfig {
    /// Load from [`config_path`]. `Ok(None)` when there is no file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    /// Load from an explicit path. `Ok(None)` when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        Self::parse(&content, path).map(Some)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        match toml::from_str(content) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    #[must_use]
    pub fn log_filter(&self) -> Option<&str> {
        self.app
            .as_ref()
            .and_then(|app| app.log_filter.as_deref())
            .map(str::trim)
            .filter(|filter| !filter.is_empty())
    }

    /// Resolve into the engine's view. Absent sections become empty.
    #[must_use]
    pub fn into_configuration(self) -> Configuration {
        Configuration {
            rules: self.rules,
            settings: self.settings.unwrap_or_default(),
            aliases: self.domain_aliases.unwrap_or_default(),
        }
    }
}

/// `$TABSORT_CONFIG`, else `~/.tabsort/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".tabsort").join("config.toml"))
}

/// Re-reads configuration from disk each time it is asked.
///
/// Unreadable or malformed files are logged and treated as empty
/// configuration rather than stopping reconciliation.
#[derive(Debug, Clone, Default)]
pub struct FileConfigSource {
    path: Option<PathBuf>,
}

impl FileConfigSource {
    /// Source reading from [`config_path`] at every load.
    #[must_use]
    pub fn default_location() -> Self {
        Self { path: None }
    }

    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    #[must_use]
    pub fn path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(config_path)
    }

    #[must_use]
    pub fn configuration(&self) -> Configuration {
        let Some(path) = self.path() else {
            tracing::warn!("No config location available; using empty configuration");
            return Configuration::default();
        };
        match TabsortConfig::load_from(&path) {
            Ok(Some(config)) => {
                let configuration = config.into_configuration();
                tracing::info!(
                    path = %path.display(),
                    rules = configuration.rules.len(),
                    aliases = configuration.aliases.len(),
                    "Configuration loaded"
                );
                configuration
            }
            Ok(None) => {
                tracing::info!(path = %path.display(), "No config file; using empty configuration");
                Configuration::default()
            }
            Err(err) => {
                tracing::warn!("{err}; using empty configuration");
                Configuration::default()
            }
        }
    }
}
