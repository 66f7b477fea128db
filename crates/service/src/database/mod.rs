pub mod dir_store;
mod types;

use std::ops::Deref;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

/// How long a connection waits on the SQLite write lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct Database(SqlitePool);

impl Database {
    pub async fn connect(database_url: &url::Url) -> Result<Self, DatabaseSetupError> {
        if database_url.scheme() != "sqlite" {
            return Err(DatabaseSetupError::UnknownDbType(
                database_url.scheme().to_string(),
            ));
        }

        // an in-memory database only exists for the connection that made it
        if database_url.as_str().contains(":memory:") {
            return Self::in_memory().await;
        }

        let options = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(DatabaseSetupError::Unavailable)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(DatabaseSetupError::Unavailable)?;

        let db = Database::new(pool);
        db.migrate().await?;
        Ok(db)
    }

    /// Single-connection in-memory database, used by tests and when no
    /// database path is configured.
    pub async fn in_memory() -> Result<Self, DatabaseSetupError> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(DatabaseSetupError::Unavailable)?;

        let db = Database::new(pool);
        db.migrate().await?;
        Ok(db)
    }

    pub fn new(pool: SqlitePool) -> Self {
        Self(pool)
    }

    async fn migrate(&self) -> Result<(), DatabaseSetupError> {
        sqlx::migrate!("./migrations")
            .run(&self.0)
            .await
            .map_err(DatabaseSetupError::MigrationFailed)
    }

    /// Cheap round trip used by the readiness probe.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.0).await?;
        Ok(())
    }
}

impl Deref for Database {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseSetupError {
    #[error("error occurred while attempting database migration: {0}")]
    MigrationFailed(sqlx::migrate::MigrateError),

    #[error("unable to perform initial connection and check of the database: {0}")]
    Unavailable(sqlx::Error),

    #[error("requested database type was not recognized: {0}")]
    UnknownDbType(String),
}
