//! Finding and evaluating the Access file that governs a path.

mod cache;
mod remote;

use std::collections::HashSet;
use std::sync::Arc;

use common::access::{Access, Check, Grantee, Right, ACCESS_FILE};
use common::dir_store::{DirStore, DirStoreError};
use common::entry::DirEntry;
use common::path::Parsed;

use crate::context::RequestContext;

pub use cache::{AccessCache, CacheConfig, CacheError, StoreAccessCache};
pub use remote::{HttpRemoteGroups, NoRemoteGroups, RemoteGroupError, RemoteGroups};

#[derive(Debug, Clone)]
pub struct AccessResolver<S> {
    store: S,
    cache: Arc<dyn AccessCache>,
}

impl<S: DirStore> AccessResolver<S> {
    pub fn new(store: S, cache: Arc<dyn AccessCache>) -> Self {
        Self { store, cache }
    }

    pub fn cache(&self) -> &Arc<dyn AccessCache> {
        &self.cache
    }

    /// The nearest Access file at or above the directory holding `path`
    /// (`path` itself when it is a directory).
    pub async fn controlling_access_file(
        &self,
        path: &Parsed,
        is_dir: bool,
    ) -> Result<Option<DirEntry>, DirStoreError<S::Error>> {
        let mut dir = if is_dir { Some(path.clone()) } else { path.parent() };
        while let Some(current) = dir {
            let candidate = current.join(ACCESS_FILE).path();
            if let Some(entry) = self.store.lookup(&candidate).await? {
                if entry.is_regular() {
                    return Ok(Some(entry));
                }
            }
            dir = current.parent();
        }
        Ok(None)
    }

    /// Parses the given Access file. A file that cannot be read or parsed
    /// is treated as absent, which leaves only the owner with rights.
    pub async fn load(&self, ctx: &RequestContext, entry: Option<&DirEntry>) -> Option<Arc<Access>> {
        let entry = entry?;
        match self.cache.get_access(ctx, entry).await {
            Ok(access) => Some(access),
            Err(e) => {
                tracing::warn!(
                    access_file = %entry.name,
                    correlation_id = %ctx.correlation_id(),
                    error = %e,
                    "unusable access file, falling back to owner-only rights"
                );
                None
            }
        }
    }

    /// Whether the requester holds `right` on `path` under `access`.
    /// Groups are expanded transitively; each is visited at most once.
    pub async fn can(
        &self,
        ctx: &RequestContext,
        access: Option<&Access>,
        right: Right,
        path: &Parsed,
    ) -> Result<bool, CacheError> {
        let requester = ctx.requester();
        let Some(access) = access else {
            return Ok(requester == path.user());
        };

        let mut pending = match access.check(requester, right, path) {
            Check::Granted => return Ok(true),
            Check::Denied => return Ok(false),
            Check::Groups(groups) => groups,
        };

        let mut visited = HashSet::new();
        while let Some(group) = pending.pop() {
            if !visited.insert(group.clone()) {
                continue;
            }
            let members = self.cache.get_group(ctx, &group).await?;
            for member in members.iter() {
                match member {
                    Grantee::Group(nested) => pending.push(nested.clone()),
                    other if other.matches(requester) => return Ok(true),
                    _ => {}
                }
            }
        }
        Ok(false)
    }
}
