use std::convert::Infallible;

use common::dir_store::DirStore;
use common::entry::Sequence;
use common::error::DirError;
use common::path::PathName;

use super::DirServer;
use crate::context::RequestContext;

impl<S: DirStore> DirServer<S> {
    /// Change notification is not offered by this server.
    pub async fn watch(
        &self,
        ctx: &RequestContext,
        name: &PathName,
        sequence: Sequence,
    ) -> Result<Infallible, DirError> {
        tracing::debug!(
            pathname = %name,
            sequence,
            requester = %ctx.requester(),
            "watch requested"
        );
        Err(DirError::NotSupported)
    }
}
