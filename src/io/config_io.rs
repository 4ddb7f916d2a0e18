use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::model::config::AppConfig;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "CAMPUSFLOW_CONFIG";
/// Environment variable naming the data directory
pub const DATA_DIR_ENV: &str = "CAMPUSFLOW_DATA_DIR";

const APP_DIR: &str = "campusflow";

/// Error type for config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("invalid config {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Read a config file. A missing file is the default config; a file that
/// exists but does not parse is an error.
pub fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file");
            return Ok(AppConfig::default());
        }
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Config file location: `$CAMPUSFLOW_CONFIG`, else
/// `$XDG_CONFIG_HOME/campusflow/config.toml`, else `~/.config/campusflow/config.toml`
pub fn config_path() -> PathBuf {
    if let Some(explicit) = env_path(CONFIG_ENV) {
        return explicit;
    }
    let config_dir = env_path("XDG_CONFIG_HOME").unwrap_or_else(|| home_dir().join(".config"));
    config_dir.join(APP_DIR).join("config.toml")
}

/// Data directory from the process environment. See [`resolve_data_dir_with`].
pub fn resolve_data_dir(cli_dir: Option<&Path>, config: &AppConfig) -> PathBuf {
    let env = DirEnv {
        data_dir: env_path(DATA_DIR_ENV),
        xdg_data_home: env_path("XDG_DATA_HOME"),
        home: home_dir(),
    };
    resolve_data_dir_with(cli_dir, config, &env)
}

/// The environment inputs to data directory resolution
#[derive(Debug, Clone)]
pub struct DirEnv {
    pub data_dir: Option<PathBuf>,
    pub xdg_data_home: Option<PathBuf>,
    pub home: PathBuf,
}

/// First match wins: command-line flag, `$CAMPUSFLOW_DATA_DIR`, config
/// `store.dir`, `$XDG_DATA_HOME/campusflow`, `~/.local/share/campusflow`.
pub fn resolve_data_dir_with(cli_dir: Option<&Path>, config: &AppConfig, env: &DirEnv) -> PathBuf {
    if let Some(dir) = cli_dir {
        return dir.to_path_buf();
    }
    if let Some(dir) = &env.data_dir {
        return dir.clone();
    }
    if let Some(dir) = config.store.dir.as_deref().filter(|d| !d.trim().is_empty()) {
        return expand_tilde(dir, &env.home);
    }
    match &env.xdg_data_home {
        Some(base) => base.join(APP_DIR),
        None => env.home.join(".local").join("share").join(APP_DIR),
    }
}

fn expand_tilde(path: &str, home: &Path) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None if path == "~" => home.to_path_buf(),
        None => PathBuf::from(path),
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Get the user's home directory
fn home_dir() -> PathBuf {
    env_path("HOME").unwrap_or_else(|| PathBuf::from("/"))
}
