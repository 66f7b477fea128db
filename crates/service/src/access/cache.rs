use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use common::access::{parse_group, Access, AccessError, Grantee};
use common::dir_store::DirStore;
use common::entry::{DirEntry, Sequence};
use common::path::{Parsed, PathError, PathName};

use super::remote::{RemoteGroupError, RemoteGroups};
use crate::content::{ContentError, ContentFetcher};
use crate::context::RequestContext;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("reading {name}: {source}")]
    Content {
        name: PathName,
        #[source]
        source: ContentError,
    },
    #[error(transparent)]
    Parse(#[from] AccessError),
    #[error("group file {0} does not exist")]
    GroupNotFound(PathName),
    #[error(transparent)]
    Remote(#[from] RemoteGroupError),
    #[error("store error: {0}")]
    Store(String),
    #[error("invalid group name: {0}")]
    InvalidName(#[from] PathError),
}

/// Parsed Access and Group files, shared by every request.
#[async_trait]
pub trait AccessCache: Send + Sync + Debug {
    /// The parsed contents of the Access file described by `entry`.
    async fn get_access(&self, ctx: &RequestContext, entry: &DirEntry) -> Result<Arc<Access>, CacheError>;

    /// Direct members of the group file `name`, which may live in another
    /// user's tree.
    async fn get_group(&self, ctx: &RequestContext, name: &PathName) -> Result<Arc<Vec<Grantee>>, CacheError>;

    /// Drops anything cached for `name`.
    async fn invalidate(&self, name: &PathName);
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub max_capacity: u64,
    /// How long members of a group held by another server stay cached.
    pub remote_group_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            remote_group_ttl: Duration::from_secs(60),
        }
    }
}

/// [`AccessCache`] backed by moka, reading local files through a
/// [`DirStore`].
///
/// Local entries are keyed by name and validated against the current
/// sequence on every hit, so a rewritten file is never served stale.
/// Remote groups cannot be validated that way and expire after a TTL.
pub struct StoreAccessCache<S> {
    store: S,
    content: Arc<dyn ContentFetcher>,
    remote: Arc<dyn RemoteGroups>,
    access: Cache<PathName, (Sequence, Arc<Access>)>,
    local_groups: Cache<PathName, (Sequence, Arc<Vec<Grantee>>)>,
    remote_groups: Cache<PathName, Arc<Vec<Grantee>>>,
}

impl<S> Debug for StoreAccessCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreAccessCache")
            .field("access_entries", &self.access.entry_count())
            .field("local_group_entries", &self.local_groups.entry_count())
            .field("remote_group_entries", &self.remote_groups.entry_count())
            .finish()
    }
}

impl<S: DirStore> StoreAccessCache<S> {
    pub fn new(
        store: S,
        content: Arc<dyn ContentFetcher>,
        remote: Arc<dyn RemoteGroups>,
        config: &CacheConfig,
    ) -> Self {
        Self {
            store,
            content,
            remote,
            access: Cache::builder().max_capacity(config.max_capacity).build(),
            local_groups: Cache::builder().max_capacity(config.max_capacity).build(),
            remote_groups: Cache::builder()
                .max_capacity(config.max_capacity)
                .time_to_live(config.remote_group_ttl)
                .build(),
        }
    }

    async fn read(&self, entry: &DirEntry) -> Result<Vec<u8>, CacheError> {
        self.content
            .fetch(entry)
            .await
            .map_err(|source| CacheError::Content {
                name: entry.name.clone(),
                source,
            })
    }

    async fn local_group(&self, parsed: &Parsed) -> Result<Arc<Vec<Grantee>>, CacheError> {
        let name = parsed.path();
        let entry = self
            .store
            .lookup(&name)
            .await
            .map_err(|e| CacheError::Store(e.to_string()))?
            .filter(|e| e.is_regular())
            .ok_or_else(|| CacheError::GroupNotFound(name.clone()))?;

        if let Some((seq, members)) = self.local_groups.get(&name).await {
            if seq == entry.sequence {
                return Ok(members);
            }
        }

        let data = self.read(&entry).await?;
        let members = Arc::new(parse_group(parsed, &data)?);
        self.local_groups
            .insert(name, (entry.sequence, members.clone()))
            .await;
        Ok(members)
    }
}

#[async_trait]
impl<S: DirStore> AccessCache for StoreAccessCache<S> {
    async fn get_access(&self, _ctx: &RequestContext, entry: &DirEntry) -> Result<Arc<Access>, CacheError> {
        if let Some((seq, access)) = self.access.get(&entry.name).await {
            if seq == entry.sequence {
                return Ok(access);
            }
        }

        let data = self.read(entry).await?;
        let access = Arc::new(Access::parse(&entry.name, &data)?);
        self.access
            .insert(entry.name.clone(), (entry.sequence, access.clone()))
            .await;
        Ok(access)
    }

    async fn get_group(&self, ctx: &RequestContext, name: &PathName) -> Result<Arc<Vec<Grantee>>, CacheError> {
        let parsed = Parsed::parse(name)?;

        // groups in trees this server holds are read directly
        let local = self
            .store
            .lookup_elem(&parsed.first(0))
            .await
            .map_err(|e| CacheError::Store(e.to_string()))?
            .is_some();
        if local {
            return self.local_group(&parsed).await;
        }

        let name = parsed.path();
        if let Some(members) = self.remote_groups.get(&name).await {
            return Ok(members);
        }
        tracing::debug!(group = %name, "resolving remote group");
        let data = self.remote.fetch_group(ctx, &name).await?;
        let members = Arc::new(parse_group(&parsed, &data)?);
        self.remote_groups.insert(name, members.clone()).await;
        Ok(members)
    }

    async fn invalidate(&self, name: &PathName) {
        self.access.invalidate(name).await;
        self.local_groups.invalidate(name).await;
        self.remote_groups.invalidate(name).await;
    }
}
