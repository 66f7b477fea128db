use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use url::Url;

use common::path::UserName;
use service::{spawn_service, ServiceConfig, ServiceError};

use crate::cli::config::{ConfigError, FileConfig};

#[derive(Args, Debug, Clone, Default)]
pub struct Serve {
    /// Address to serve the API on (default 0.0.0.0:3000)
    #[arg(long)]
    pub listen_addr: Option<SocketAddr>,

    /// SQLite database file (in-memory if not set)
    #[arg(long)]
    pub sqlite_path: Option<PathBuf>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long)]
    pub log_level: Option<tracing::Level>,

    /// Deadline for each directory operation, in seconds
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    /// Peer directory server holding Group files of other domains
    #[arg(long)]
    pub remote_dir_url: Option<Url>,

    /// User this server acts as when reading remote Group files
    #[arg(long)]
    pub server_user: Option<UserName>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid log level in config: {0}")]
    LogLevel(String),
    #[error("service failed: {0}")]
    Service(#[from] ServiceError),
}

impl Serve {
    /// Merges flags over the file settings over the defaults.
    pub fn service_config(&self, file: FileConfig) -> Result<ServiceConfig, ServeError> {
        let mut config = ServiceConfig::default();

        if let Some(addr) = self.listen_addr.or(file.listen_addr) {
            config.listen_addr = Some(addr);
        }
        config.sqlite_path = self.sqlite_path.clone().or(file.sqlite_path);

        config.log_level = match (self.log_level, file.log_level) {
            (Some(level), _) => level,
            (None, Some(raw)) => raw.parse().map_err(|_| ServeError::LogLevel(raw))?,
            (None, None) => config.log_level,
        };

        if let Some(secs) = self.request_timeout_secs.or(file.request_timeout_secs) {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(capacity) = file.cache_capacity {
            config.cache.max_capacity = capacity;
        }
        if let Some(secs) = file.remote_group_ttl_secs {
            config.cache.remote_group_ttl = Duration::from_secs(secs);
        }

        config.remote_dir_url = self.remote_dir_url.clone().or(file.remote_dir_url);
        config.server_user = self.server_user.clone().or(file.server_user);
        Ok(config)
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Serve {
    type Error = ServeError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let file = FileConfig::load(ctx.config_path.as_deref())?;
        let config = self.service_config(file)?;

        spawn_service(&config).await?;
        Ok("server stopped".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_file() {
        let file = FileConfig {
            listen_addr: Some("127.0.0.1:4000".parse().unwrap()),
            sqlite_path: Some(PathBuf::from("/tmp/file.sqlite")),
            log_level: Some("warn".to_string()),
            request_timeout_secs: Some(5),
            cache_capacity: Some(12),
            ..Default::default()
        };
        let serve = Serve {
            listen_addr: Some("127.0.0.1:5000".parse().unwrap()),
            log_level: Some(tracing::Level::DEBUG),
            ..Default::default()
        };

        let config = serve.service_config(file).unwrap();
        assert_eq!(config.listen_addr(), "127.0.0.1:5000".parse().unwrap());
        assert_eq!(config.sqlite_path, Some(PathBuf::from("/tmp/file.sqlite")));
        assert_eq!(config.log_level, tracing::Level::DEBUG);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.cache.max_capacity, 12);
    }

    #[test]
    fn test_defaults_without_file() {
        let config = Serve::default().service_config(FileConfig::default()).unwrap();
        assert_eq!(config.listen_addr(), "0.0.0.0:3000".parse().unwrap());
        assert!(config.sqlite_path.is_none());
        assert!(config.remote_dir_url.is_none());
        assert_eq!(config.log_level, tracing::Level::INFO);
    }

    #[test]
    fn test_bad_log_level_in_file() {
        let file = FileConfig {
            log_level: Some("loud".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            Serve::default().service_config(file),
            Err(ServeError::LogLevel(_))
        ));
    }
}
