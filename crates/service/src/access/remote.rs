use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use common::path::PathName;

use crate::content::{ContentError, ContentFetcher};
use crate::context::RequestContext;
use crate::http::api::client::{ApiClient, ApiError, ApiRequest};
use crate::http::api::v0::dir::{LookupRequest, LookupResponse, REQUEST_ID_HEADER};

#[derive(Debug, thiserror::Error)]
pub enum RemoteGroupError {
    #[error("no remote directory configured to resolve {0}")]
    Unavailable(PathName),
    #[error("remote lookup of {0} hit a link")]
    FollowLink(PathName),
    #[error("remote lookup failed: {0}")]
    Api(#[from] ApiError),
    #[error("invalid remote url: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Fetches the contents of a group file that lives in another user's tree.
#[async_trait]
pub trait RemoteGroups: Send + Sync + Debug {
    async fn fetch_group(&self, ctx: &RequestContext, name: &PathName) -> Result<Vec<u8>, RemoteGroupError>;
}

/// Used when no peer directory is configured: every remote group is
/// unresolvable.
#[derive(Debug, Clone, Default)]
pub struct NoRemoteGroups;

#[async_trait]
impl RemoteGroups for NoRemoteGroups {
    async fn fetch_group(&self, _ctx: &RequestContext, name: &PathName) -> Result<Vec<u8>, RemoteGroupError> {
        Err(RemoteGroupError::Unavailable(name.clone()))
    }
}

/// Looks the group up through a peer directory server's API, then reads
/// its blocks. The client carries the identity this server acts as.
#[derive(Debug, Clone)]
pub struct HttpRemoteGroups {
    client: ApiClient,
    content: Arc<dyn ContentFetcher>,
}

impl HttpRemoteGroups {
    pub fn new(client: ApiClient, content: Arc<dyn ContentFetcher>) -> Self {
        Self { client, content }
    }
}

#[async_trait]
impl RemoteGroups for HttpRemoteGroups {
    async fn fetch_group(&self, ctx: &RequestContext, name: &PathName) -> Result<Vec<u8>, RemoteGroupError> {
        let mut request = LookupRequest { name: name.clone() }
            .build_request(self.client.base_url(), self.client.http_client())?
            .header(REQUEST_ID_HEADER, ctx.correlation_id().to_string());
        if let Some(remaining) = ctx.remaining() {
            request = request.timeout(remaining);
        }

        let body: LookupResponse = self.client.send(request).await?;
        if body.follow_link {
            return Err(RemoteGroupError::FollowLink(name.clone()));
        }
        Ok(self.content.fetch(&body.entry).await?)
    }
}
