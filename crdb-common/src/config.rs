//! Configuration loading and database path resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming the database file
pub const DATABASE_ENV_VAR: &str = "CRDB_DATABASE";

/// File name used when nothing else names the database
pub const DEFAULT_DATABASE_FILE: &str = "rowing_database.db";

/// Optional settings from `<config_dir>/crdb/config.toml`
///
/// ```toml
/// database_path = "/srv/rowing/rowing_database.db"
/// port = 5800
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TomlConfig {
    pub database_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub bind: Option<String>,
}

/// Per-user config file location
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("crdb").join("config.toml"))
}

/// Parse a TOML config file
pub fn load_toml_config_from(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
}

/// Load the per-user config, falling back to defaults
///
/// A missing file is normal. An unreadable or malformed one is logged and
/// ignored so the service still starts.
pub fn load_toml_config() -> TomlConfig {
    let Some(path) = config_file_path() else {
        return TomlConfig::default();
    };
    if !path.exists() {
        debug!("No config file at {}", path.display());
        return TomlConfig::default();
    }
    match load_toml_config_from(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Ignoring config file: {}", e);
            TomlConfig::default()
        }
    }
}

/// Database path resolution priority:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent default (fallback)
pub fn resolve_database_path(cli_arg: Option<&Path>, env_var_name: &str) -> PathBuf {
    resolve_database_path_with(cli_arg, env_var_name, &load_toml_config())
}

/// [`resolve_database_path`] against an already loaded config
pub fn resolve_database_path_with(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config: &TomlConfig,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.database_path {
        return path.clone();
    }

    default_database_path()
}

/// `<data_local_dir>/crdb/rowing_database.db`
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("crdb").join(DEFAULT_DATABASE_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE))
}
