//! Directory server runtime.
//!
//! - Database (SQLite with the [`DirStore`](common::dir_store::DirStore) implementation)
//! - Access resolution (Access and Group files, cached)
//! - Directory operations ([`DirServer`])
//! - HTTP API, health checks and process bootstrap

pub mod access;
pub mod config;
pub mod content;
pub mod context;
pub mod database;
pub mod dir;
pub mod http;
pub mod process;
pub mod state;

// Re-export key types for convenience
pub use config::Config as ServiceConfig;
pub use context::RequestContext;
pub use database::{Database, DatabaseSetupError};
pub use dir::{DirServer, GlobMatches};
pub use process::{spawn_service, ServiceError};
pub use state::{State as ServiceState, StateSetupError};
