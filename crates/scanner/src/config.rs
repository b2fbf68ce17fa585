use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

#[derive(Clone, Debug, Deserialize)]
pub struct FilesConfig {
    #[serde(default = "default_hostnames_file")]
    pub hostnames: String,
    #[serde(default = "default_shodan_file")]
    pub shodan: String,
    #[serde(default = "default_database_file")]
    pub database: String,
    #[serde(default = "default_web_data_file")]
    pub web_data: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            hostnames: default_hostnames_file(),
            shodan: default_shodan_file(),
            database: default_database_file(),
            web_data: default_web_data_file(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SettingsConfig {
    /// Concurrent probes for the delegation scan.
    #[serde(default = "default_workers")]
    pub hs_workers: usize,
    /// Concurrent probes for the Shodan geo scan.
    #[serde(default = "default_workers")]
    pub shodan_workers: usize,
    #[serde(default)]
    pub debug: bool,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            hs_workers: default_workers(),
            shodan_workers: default_workers(),
            debug: false,
        }
    }
}

/// Optional relational source of candidate names (`destinations(destination)`).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DestinationsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub limit: Option<u64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_directory")]
    pub data_directory: PathBuf,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub destinations: DestinationsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_directory: default_data_directory(),
            files: FilesConfig::default(),
            settings: SettingsConfig::default(),
            destinations: DestinationsConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn hostnames_path(&self) -> PathBuf {
        self.data_directory.join(&self.files.hostnames)
    }

    pub fn shodan_path(&self) -> PathBuf {
        self.data_directory.join(&self.files.shodan)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_directory.join(&self.files.database)
    }

    pub fn web_data_path(&self) -> PathBuf {
        self.data_directory.join(&self.files.web_data)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settings.hs_workers == 0 {
            return Err(ConfigError::Validation(
                "settings.hs_workers must be > 0".into(),
            ));
        }
        if self.settings.shodan_workers == 0 {
            return Err(ConfigError::Validation(
                "settings.shodan_workers must be > 0".into(),
            ));
        }
        if self.destinations.enabled
            && self
                .destinations
                .database_url
                .as_deref()
                .is_none_or(str::is_empty)
        {
            return Err(ConfigError::Validation(
                "destinations.database_url is required when destinations.enabled is true".into(),
            ));
        }
        Ok(())
    }
}

fn default_data_directory() -> PathBuf {
    PathBuf::from("data")
}

fn default_hostnames_file() -> String {
    "hostnames.txt".to_string()
}

fn default_shodan_file() -> String {
    "shodan-export.json".to_string()
}

fn default_database_file() -> String {
    "delegated.sqlite".to_string()
}

fn default_web_data_file() -> String {
    "matrix_servers.js".to_string()
}

fn default_workers() -> usize {
    10
}

/// Load configuration from `path` (optional on disk) + environment overrides.
///
/// Environment variables use double underscores as the key path separator,
/// e.g. `SETTINGS__HS_WORKERS=50`. The result is not validated, so that command
/// line overrides can be applied first; call [`AppConfig::validate`] afterwards.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};
    let cfg = Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(Environment::default().separator("__"))
        .build()?;

    Ok(cfg.try_deserialize()?)
}
