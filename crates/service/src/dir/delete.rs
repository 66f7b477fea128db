use common::access::Right;
use common::dir_store::DirStore;
use common::entry::DirEntry;
use common::error::{DirError, Resolution};
use common::path::PathName;

use super::{internal, with_deadline, DirServer};
use crate::context::RequestContext;

const OP: &str = "dir.Delete";

impl<S: DirStore> DirServer<S> {
    /// Removes an entry and returns it as it was. Directories must be
    /// empty and roots are never removed. Rights come from the Access file
    /// of the directory holding the entry.
    pub async fn delete(&self, ctx: &RequestContext, name: &PathName) -> Result<Resolution<DirEntry>, DirError> {
        with_deadline(ctx, OP, self.delete_inner(ctx, name)).await
    }

    async fn delete_inner(&self, ctx: &RequestContext, name: &PathName) -> Result<Resolution<DirEntry>, DirError> {
        let path = Self::parse(name)?;
        let name = path.path();
        if path.is_root() {
            return Err(DirError::invalid(name, "cannot delete a root"));
        }

        let chain = self
            .store
            .lookup_all(&path)
            .await
            .map_err(|e| internal(ctx, OP, &name, e))?;
        let reached = chain.len() == path.n_elem() + 1;
        let Some(last) = chain.into_iter().last() else {
            return Err(if ctx.requester() == path.user() {
                DirError::NotExist(name)
            } else {
                DirError::Private(name)
            });
        };
        let last_path = Self::parse(&last.name)?;

        // a link on the way down is handed back; the target itself may be a link
        let access_entry = if reached {
            self.access.controlling_access_file(&path, false).await
        } else {
            self.access
                .controlling_access_file(&last_path, last.is_dir())
                .await
        }
        .map_err(|e| internal(ctx, OP, &name, e))?;
        let access = self.access.load(ctx, access_entry.as_ref()).await;
        let access = access.as_deref();

        if !reached {
            if last.is_link() {
                if self.can(ctx, OP, access, Right::Any, &last_path).await? {
                    return Ok(Resolution::FollowLink(last));
                }
                return Err(DirError::Private(name));
            }
            return Err(if self.can(ctx, OP, access, Right::Any, &path).await? {
                DirError::NotExist(name)
            } else {
                DirError::Private(name)
            });
        }

        if !self.can(ctx, OP, access, Right::Delete, &path).await? {
            return Err(self.denied(ctx, OP, access, &path).await?);
        }

        let mut target = last;
        if target.is_dir() {
            let dir_ref = self
                .store
                .lookup_elem(&path)
                .await
                .map_err(|e| internal(ctx, OP, &name, e))?
                .filter(|r| r.path == path)
                .ok_or_else(|| DirError::NotExist(name.clone()))?;
            let children = self
                .store
                .list(&dir_ref)
                .await
                .map_err(|e| internal(ctx, OP, &name, e))?;
            if !children.is_empty() {
                return Err(DirError::NotEmpty(name));
            }
        }

        let seq = self
            .store
            .delete(&path)
            .await
            .map_err(|e| internal(ctx, OP, &name, e))?;
        if target.is_access_control() {
            self.access.cache().invalidate(&name).await;
        }
        tracing::debug!(pathname = %name, sequence = seq, "deleted");

        self.complete_or_elide(ctx, OP, access, &path, &mut target).await?;
        Ok(Resolution::Complete(target))
    }
}
