//! # Directory operations
//!
//! [`DirServer`] implements the client-facing operations over any
//! [`DirStore`]: Lookup, Glob, WhichAccess, Put, Delete and Watch.
//!
//! Every read starts by resolving the requested path:
//! 1. fetch the chain of entries from the root towards the path
//! 2. find the Access file governing the deepest entry reached
//! 3. require *some* right on the requested path, otherwise the caller
//!    learns nothing (`Private`), not even whether the path exists
//! 4. stop at a link and hand it back for the client to follow
//! 5. only then report a missing path as `NotExist`
//!
//! Contents of regular files are elided unless the requester may read
//! them. Access and Group files are always returned whole.

mod delete;
mod glob;
mod lookup;
mod put;
mod watch;
mod which_access;

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use common::access::{Access, Right};
use common::dir_store::DirStore;
use common::entry::DirEntry;
use common::error::{DirError, Resolution};
use common::path::{Parsed, PathName};

use crate::access::{AccessCache, AccessResolver};
use crate::content::ContentFetcher;
use crate::context::RequestContext;

pub use glob::GlobMatches;

#[derive(Debug, Clone)]
pub struct DirServer<S> {
    store: S,
    access: AccessResolver<S>,
    content: Arc<dyn ContentFetcher>,
}

/// What resolving a path found, short of checking it exists.
#[derive(Debug)]
struct Walk {
    path: Parsed,
    /// Deepest entry reached; `None` when the user's root is missing.
    entry: Option<DirEntry>,
    /// Whether `entry` is the requested path itself.
    reached: bool,
    access: Option<Arc<Access>>,
    access_entry: Option<DirEntry>,
}

/// A resolved, existing path.
#[derive(Debug)]
struct Resolved {
    path: Parsed,
    entry: DirEntry,
    access: Option<Arc<Access>>,
}

impl<S: DirStore> DirServer<S> {
    pub fn new(store: S, cache: Arc<dyn AccessCache>, content: Arc<dyn ContentFetcher>) -> Self {
        Self {
            access: AccessResolver::new(store.clone(), cache),
            store,
            content,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn parse(name: &PathName) -> Result<Parsed, DirError> {
        Parsed::parse(name).map_err(|e| DirError::invalid(name.clone(), e.to_string()))
    }

    /// Steps 1 through 4 of resolution.
    async fn walk(&self, ctx: &RequestContext, op: &'static str, path: Parsed) -> Result<Resolution<Walk>, DirError> {
        let name = path.path();
        let chain = self
            .store
            .lookup_all(&path)
            .await
            .map_err(|e| internal(ctx, op, &name, e))?;
        let reached = chain.len() == path.n_elem() + 1;
        let entry = chain.into_iter().last();

        let access_entry = match &entry {
            Some(e) => {
                let at = Self::parse(&e.name)?;
                self.access
                    .controlling_access_file(&at, e.is_dir())
                    .await
                    .map_err(|err| internal(ctx, op, &name, err))?
            }
            None => None,
        };
        let access = self.access.load(ctx, access_entry.as_ref()).await;

        if !self.can(ctx, op, access.as_deref(), Right::Any, &path).await? {
            return Err(DirError::Private(name));
        }
        if let Some(e) = &entry {
            if e.is_link() {
                return Ok(Resolution::FollowLink(e.clone()));
            }
        }

        Ok(Resolution::Complete(Walk {
            path,
            entry,
            reached,
            access,
            access_entry,
        }))
    }

    /// Full resolution: the path must exist.
    async fn resolve(&self, ctx: &RequestContext, op: &'static str, path: Parsed) -> Result<Resolution<Resolved>, DirError> {
        let walk = match self.walk(ctx, op, path).await? {
            Resolution::Complete(walk) => walk,
            Resolution::FollowLink(link) => return Ok(Resolution::FollowLink(link)),
        };
        match walk.entry {
            Some(entry) if walk.reached => Ok(Resolution::Complete(Resolved {
                path: walk.path,
                entry,
                access: walk.access,
            })),
            _ => Err(DirError::NotExist(walk.path.path())),
        }
    }

    async fn can(
        &self,
        ctx: &RequestContext,
        op: &'static str,
        access: Option<&Access>,
        right: Right,
        path: &Parsed,
    ) -> Result<bool, DirError> {
        self.access
            .can(ctx, access, right, path)
            .await
            .map_err(|e| internal(ctx, op, &path.path(), e))
    }

    /// Hides file contents the requester may not read.
    async fn complete_or_elide(
        &self,
        ctx: &RequestContext,
        op: &'static str,
        access: Option<&Access>,
        path: &Parsed,
        entry: &mut DirEntry,
    ) -> Result<(), DirError> {
        if !entry.is_regular() || entry.is_access_control() {
            return Ok(());
        }
        if !self.can(ctx, op, access, Right::Read, path).await? {
            entry.mark_incomplete();
        }
        Ok(())
    }

    /// Whether the requester holds any right at all, for choosing between
    /// `Permission` and `Private`.
    async fn denied(
        &self,
        ctx: &RequestContext,
        op: &'static str,
        access: Option<&Access>,
        path: &Parsed,
    ) -> Result<DirError, DirError> {
        if self.can(ctx, op, access, Right::Any, path).await? {
            Ok(DirError::Permission(path.path()))
        } else {
            Ok(DirError::Private(path.path()))
        }
    }
}

/// Logs the details of an unexpected failure and returns an opaque error
/// carrying only the correlation id.
fn internal(ctx: &RequestContext, op: &'static str, name: &PathName, err: impl Display) -> DirError {
    tracing::error!(
        operation = op,
        pathname = %name,
        requester = %ctx.requester(),
        correlation_id = %ctx.correlation_id(),
        error = %err,
        "internal error"
    );
    DirError::Internal {
        reference: ctx.correlation_id(),
    }
}

/// Runs `fut` under the request deadline, if there is one.
async fn with_deadline<T>(
    ctx: &RequestContext,
    op: &'static str,
    fut: impl Future<Output = Result<T, DirError>>,
) -> Result<T, DirError> {
    let Some(deadline) = ctx.deadline() else {
        return fut.await;
    };
    // an expired request never touches the store
    if tokio::time::Instant::now() >= deadline {
        return Err(timed_out(ctx, op));
    }
    match tokio::time::timeout_at(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(timed_out(ctx, op)),
    }
}

fn timed_out(ctx: &RequestContext, op: &'static str) -> DirError {
    tracing::warn!(
        operation = op,
        requester = %ctx.requester(),
        correlation_id = %ctx.correlation_id(),
        "deadline exceeded"
    );
    DirError::Timeout
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use common::path::UserName;

    use super::*;

    fn ctx() -> RequestContext {
        RequestContext::new(UserName::parse("ann@example.com").unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_operation_times_out() {
        let ctx = ctx().with_timeout(Duration::from_secs(5));
        let result: Result<(), DirError> = with_deadline(&ctx, "test", std::future::pending()).await;
        assert!(matches!(result, Err(DirError::Timeout)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_deadline_skips_the_work() {
        let ctx = ctx().with_timeout(Duration::from_secs(1));
        tokio::time::advance(Duration::from_secs(2)).await;
        let started = std::cell::Cell::new(false);
        let result = with_deadline(&ctx, "test", async {
            started.set(true);
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(DirError::Timeout)));
        assert!(!started.get());
    }

    #[tokio::test]
    async fn test_no_deadline_runs_to_completion() {
        let result = with_deadline(&ctx(), "test", async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
