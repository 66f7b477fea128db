use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::{fs, io};

use serde::Deserialize;
use url::Url;

use common::path::UserName;

pub const APP_DIR_NAME: &str = ".dirserver";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Server settings read from `config.toml`. Every field is optional;
/// command line flags win over anything set here.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub listen_addr: Option<SocketAddr>,
    pub sqlite_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub cache_capacity: Option<u64>,
    pub remote_group_ttl_secs: Option<u64>,
    pub remote_dir_url: Option<Url>,
    pub server_user: Option<UserName>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid config in {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl FileConfig {
    /// The default config file, `~/.dirserver/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads an explicit config file, which must exist, or the default one
    /// if present. No file at the default location yields empty settings.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::read(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }
}
