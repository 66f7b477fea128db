use common::dir_store::DirStore;
use common::entry::DirEntry;
use common::error::{DirError, Resolution};
use common::path::PathName;

use super::{with_deadline, DirServer};
use crate::context::RequestContext;

const OP: &str = "dir.Lookup";

impl<S: DirStore> DirServer<S> {
    /// The entry at `name`, with file contents elided unless the requester
    /// holds Read.
    pub async fn lookup(&self, ctx: &RequestContext, name: &PathName) -> Result<Resolution<DirEntry>, DirError> {
        with_deadline(ctx, OP, self.lookup_inner(ctx, name)).await
    }

    pub(super) async fn lookup_inner(
        &self,
        ctx: &RequestContext,
        name: &PathName,
    ) -> Result<Resolution<DirEntry>, DirError> {
        let path = Self::parse(name)?;
        let resolved = match self.resolve(ctx, OP, path).await? {
            Resolution::Complete(resolved) => resolved,
            Resolution::FollowLink(link) => return Ok(Resolution::FollowLink(link)),
        };

        let mut entry = resolved.entry;
        self.complete_or_elide(ctx, OP, resolved.access.as_deref(), &resolved.path, &mut entry)
            .await?;
        Ok(Resolution::Complete(entry))
    }
}
