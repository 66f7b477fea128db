//! Shared setup for directory server integration tests
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use ::common::entry::{DirEntry, Packing, SEQ_IGNORE};
use ::common::error::{DirError, Resolution};
use ::common::path::UserName;
use service::access::{CacheConfig, NoRemoteGroups, StoreAccessCache};
use service::content::{ContentFetcher, HttpContentFetcher, MemoryContent};
use service::{Database, DirServer, RequestContext, ServiceState};

pub const OWNER: &str = "ann@example.com";

pub struct TestEnv {
    pub server: DirServer<Database>,
    pub db: Database,
    pub content: MemoryContent,
}

/// An in-memory database and block store behind a fresh server.
pub async fn setup_test_env() -> TestEnv {
    let content = MemoryContent::new();
    setup_with_fetcher(content.clone(), Arc::new(content)).await
}

/// Contents are read over HTTP; `content` is only used to build entries.
pub async fn setup_http_env() -> TestEnv {
    let fetcher = HttpContentFetcher::new(reqwest::Client::new());
    setup_with_fetcher(MemoryContent::new(), Arc::new(fetcher)).await
}

async fn setup_with_fetcher(content: MemoryContent, fetcher: Arc<dyn ContentFetcher>) -> TestEnv {
    let db = Database::in_memory().await.unwrap();
    let cache = StoreAccessCache::new(
        db.clone(),
        fetcher.clone(),
        Arc::new(NoRemoteGroups),
        &CacheConfig::default(),
    );
    let server = DirServer::new(db.clone(), Arc::new(cache), fetcher);
    TestEnv {
        server,
        db,
        content,
    }
}

/// Like [`setup_test_env`] with the owner's root already created.
pub async fn setup_with_root() -> TestEnv {
    let env = setup_test_env().await;
    env.mkdir(OWNER, &format!("{OWNER}/")).await.unwrap();
    env
}

pub fn user(s: &str) -> UserName {
    UserName::parse(s).unwrap()
}

pub fn ctx(s: &str) -> RequestContext {
    RequestContext::new(user(s))
}

pub fn complete<T: std::fmt::Debug>(resolution: Resolution<T>) -> T {
    match resolution {
        Resolution::Complete(value) => value,
        Resolution::FollowLink(link) => panic!("unexpected link {}", link.name),
    }
}

impl TestEnv {
    pub fn state(&self) -> ServiceState {
        ServiceState::new(self.server.clone(), self.db.clone(), Duration::from_secs(5))
    }

    pub async fn mkdir(&self, who: &str, name: &str) -> Result<DirEntry, DirError> {
        let entry = DirEntry::directory(name.into(), user(who));
        self.server.put(&ctx(who), entry).await.map(complete)
    }

    /// A plain file whose single block holds `text`.
    pub fn file_entry(&self, who: &str, name: &str, text: &str) -> DirEntry {
        let mut entry = DirEntry::file(name.into(), user(who), Packing::Plain);
        entry.blocks.push(self.content.store(text.as_bytes()));
        entry.sequence = SEQ_IGNORE;
        entry
    }

    pub async fn put_file(&self, who: &str, name: &str, text: &str) -> Result<DirEntry, DirError> {
        let entry = self.file_entry(who, name, text);
        self.server.put(&ctx(who), entry).await.map(complete)
    }

    pub async fn lookup(&self, who: &str, name: &str) -> Result<Resolution<DirEntry>, DirError> {
        self.server.lookup(&ctx(who), &name.into()).await
    }

    pub async fn delete(&self, who: &str, name: &str) -> Result<Resolution<DirEntry>, DirError> {
        self.server.delete(&ctx(who), &name.into()).await
    }
}
