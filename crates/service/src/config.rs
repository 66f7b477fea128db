use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use common::path::UserName;

use crate::access::CacheConfig;

#[derive(Debug, Clone)]
pub struct Config {
    // http server configuration
    /// address for the API server to listen on.
    ///  if not set then 0.0.0.0:3000 will be used
    pub listen_addr: Option<SocketAddr>,

    // data store configuration
    /// a path to a sqlite database, if not set then an
    ///  in-memory database will be used
    pub sqlite_path: Option<PathBuf>,

    // request handling
    /// deadline applied to every directory operation
    pub request_timeout: Duration,
    /// sizing of the Access and Group file caches
    pub cache: CacheConfig,

    // remote groups
    /// a peer directory server used to read Group files held
    ///  outside this server; remote groups never resolve without it
    pub remote_dir_url: Option<Url>,
    /// the user this server acts as when talking to the peer
    pub server_user: Option<UserName>,

    // misc
    pub log_level: tracing::Level,
}

impl Config {
    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
            .unwrap_or(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 3000))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: Some(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 3000)),
            sqlite_path: None,
            request_timeout: Duration::from_secs(30),
            cache: CacheConfig::default(),
            remote_dir_url: None,
            server_user: None,
            log_level: tracing::Level::INFO,
        }
    }
}
