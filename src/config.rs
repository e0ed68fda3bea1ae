//! Configuration loading.
//!
//! Settings come from, in increasing priority: built-in defaults, a config
//! file (TOML, YAML or JSON), and environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::llm::LlmConfig;
use crate::repository::DbContext;
use crate::services::DEFAULT_DATABASE_NAME;

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "leafmark.db";

/// Default catalog cache TTL in seconds.
pub const DEFAULT_CATALOG_CACHE_TTL_SECS: u64 = 300;

/// Config file basename looked up in the working and config directories.
const CONFIG_BASENAME: &str = "leafmark";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    pub database_url: Option<String>,
    /// Label written to exported documents.
    pub database_name: String,
    /// How long leaf node listings stay cached by the server.
    pub catalog_cache_ttl: Duration,
    /// Provider settings for annotation rounds.
    pub llm: LlmConfig,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("leafmark");

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            catalog_cache_ttl: Duration::from_secs(DEFAULT_CATALOG_CACHE_TTL_SECS),
            llm: LlmConfig::default(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        if let Some(ref url) = self.database_url {
            url.clone()
        } else {
            format!("sqlite:{}", self.database_path().display())
        }
    }

    /// Get the full path to the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        if self.database_url.is_none() {
            std::fs::create_dir_all(&self.data_dir)?;
        }
        Ok(())
    }

    pub fn create_db_context(&self) -> DbContext {
        DbContext::from_url(&self.database_url())
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Database URL (`sqlite:path`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Label written to exported documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_name: Option<String>,
    /// Catalog cache TTL in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_cache_ttl_secs: Option<u64>,
    /// Annotation provider configuration.
    #[serde(default, skip_serializing_if = "LlmConfig::is_default")]
    pub llm: LlmConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a specific file path.
    /// The format is picked from the file extension (JSON when unknown).
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        config.llm = config.llm.with_env_overrides();
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref url) = self.database_url {
            settings.database_url = Some(url.clone());
        }
        if let Some(ref name) = self.database_name {
            settings.database_name = name.clone();
        }
        if let Some(ttl) = self.catalog_cache_ttl_secs {
            settings.catalog_cache_ttl = Duration::from_secs(ttl);
        }
        settings.llm = self.llm.clone();
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory or database file (`--data` flag).
    pub data: Option<PathBuf>,
}

/// Look for `leafmark.{toml,yaml,yml,json}` in the working directory, then
/// in the user config directory.
fn discover_config_file() -> Option<PathBuf> {
    let extensions = ["toml", "yaml", "yml", "json"];
    let mut dirs_to_check = vec![std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))];
    if let Some(config_dir) = dirs::config_dir() {
        dirs_to_check.push(config_dir.join(CONFIG_BASENAME));
    }

    for dir in dirs_to_check {
        for ext in extensions {
            let path = dir.join(format!("{}.{}", CONFIG_BASENAME, ext));
            if path.exists() {
                return Some(path);
            }
        }
    }
    None
}

async fn load_file_config(options: &LoadOptions) -> Config {
    let path = options.config_path.clone().or_else(discover_config_file);

    match path {
        Some(path) => match Config::load_from_path(&path).await {
            Ok(config) => {
                tracing::debug!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("Ignoring config file {}: {}", path.display(), e);
                Config::default()
            }
        },
        None => Config::default(),
    }
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let config = load_file_config(&options).await;
    let mut settings = Settings::default();

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let base_dir = config.base_dir().unwrap_or_else(|| cwd.clone());
    config.apply_to_settings(&mut settings, &base_dir);

    if let Some(ref data) = options.data {
        let data = if data.is_absolute() {
            data.clone()
        } else {
            cwd.join(data)
        };
        let is_db_file = data
            .extension()
            .is_some_and(|ext| ext == "db" || ext == "sqlite" || ext == "sqlite3");
        if is_db_file {
            if let Some(name) = data.file_name().and_then(|n| n.to_str()) {
                settings.database_filename = name.to_string();
            }
            settings.data_dir = data.parent().unwrap_or(Path::new(".")).to_path_buf();
        } else {
            settings.data_dir = data;
        }
        settings.database_url = None;
    }

    if let Ok(url) = std::env::var("DATABASE_URL") {
        if !url.trim().is_empty() {
            settings.database_url = Some(url);
        }
    }

    (settings, config)
}
