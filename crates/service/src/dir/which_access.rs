use common::dir_store::DirStore;
use common::entry::DirEntry;
use common::error::{DirError, Resolution};
use common::path::PathName;

use super::{with_deadline, DirServer};
use crate::context::RequestContext;

const OP: &str = "dir.WhichAccess";

impl<S: DirStore> DirServer<S> {
    /// The Access file governing `name`, or `None` when only the owner has
    /// rights. `name` itself need not exist.
    pub async fn which_access(
        &self,
        ctx: &RequestContext,
        name: &PathName,
    ) -> Result<Resolution<Option<DirEntry>>, DirError> {
        with_deadline(ctx, OP, async {
            let path = Self::parse(name)?;
            Ok(self
                .walk(ctx, OP, path)
                .await?
                .map(|walk| walk.access_entry))
        })
        .await
    }
}
