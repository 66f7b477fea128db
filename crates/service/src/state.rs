use std::sync::Arc;
use std::time::Duration;

use url::Url;

use super::access::{
    HttpRemoteGroups, NoRemoteGroups, RemoteGroups, StoreAccessCache,
};
use super::config::Config;
use super::content::{ContentFetcher, HttpContentFetcher};
use super::database::{Database, DatabaseSetupError};
use super::dir::DirServer;
use super::http::api::client::{ApiClient, ApiError};

/// Main service state, shared by every request handler.
#[derive(Debug, Clone)]
pub struct State {
    dir: DirServer<Database>,
    database: Database,
    request_timeout: Duration,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Setup database
        let sqlite_database_url = match config.sqlite_path {
            Some(ref path) => {
                // the file itself is created on first use, its directory is not
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        return Err(StateSetupError::DatabasePathDoesNotExist);
                    }
                }
                // parse the path into a URL
                Url::parse(&format!("sqlite://{}", path.display()))
                    .map_err(|_| StateSetupError::InvalidDatabaseUrl)
            }
            // otherwise just set up an in-memory database
            None => Url::parse("sqlite::memory:").map_err(|_| StateSetupError::InvalidDatabaseUrl),
        }?;
        tracing::info!("Database URL: {:?}", sqlite_database_url);
        let database = Database::connect(&sqlite_database_url).await?;

        // 2. Setup content and remote group resolution
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| StateSetupError::HttpClient(e.into()))?;
        let content: Arc<dyn ContentFetcher> = Arc::new(HttpContentFetcher::new(client));
        let remote: Arc<dyn RemoteGroups> = match (&config.remote_dir_url, &config.server_user) {
            (Some(url), Some(user)) => {
                tracing::info!(remote = %url, identity = %user, "resolving remote groups via peer");
                let api = ApiClient::new(url, user).map_err(StateSetupError::HttpClient)?;
                Arc::new(HttpRemoteGroups::new(api, content.clone()))
            }
            (Some(_), None) => return Err(StateSetupError::MissingServerUser),
            _ => {
                tracing::info!("no peer directory configured, remote groups will not resolve");
                Arc::new(NoRemoteGroups)
            }
        };

        // 3. Setup the directory server
        let cache = StoreAccessCache::new(database.clone(), content.clone(), remote, &config.cache);
        let dir = DirServer::new(database.clone(), Arc::new(cache), content);

        Ok(Self::new(dir, database, config.request_timeout))
    }

    /// Assembles state from parts, e.g. an in-memory content store in tests.
    pub fn new(dir: DirServer<Database>, database: Database, request_timeout: Duration) -> Self {
        Self {
            dir,
            database,
            request_timeout,
        }
    }

    pub fn dir(&self) -> &DirServer<Database> {
        &self.dir
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

impl AsRef<Database> for State {
    fn as_ref(&self) -> &Database {
        self.database()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("Database path does not exist")]
    DatabasePathDoesNotExist,
    #[error("Database setup error")]
    DatabaseSetupError(#[from] DatabaseSetupError),
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,
    #[error("HTTP client error: {0}")]
    HttpClient(ApiError),
    #[error("a remote directory is configured without a server user")]
    MissingServerUser,
}
