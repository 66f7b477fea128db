use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::entry::DirEntry;
use common::error::Resolution;

use super::DirApiError;
use crate::context::RequestContext;
use crate::http::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutRequest {
    pub entry: DirEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutResponse {
    /// The stored entry carrying its new sequence, or the link to follow.
    pub entry: DirEntry,
    pub follow_link: bool,
}

pub async fn handler(
    State(state): State<ServiceState>,
    ctx: RequestContext,
    payload: Result<Json<PutRequest>, JsonRejection>,
) -> Result<impl IntoResponse, DirApiError> {
    let Json(req) = payload?;
    let (status, response) = match state.dir().put(&ctx, req.entry).await? {
        Resolution::Complete(entry) => (
            http::StatusCode::CREATED,
            PutResponse {
                entry,
                follow_link: false,
            },
        ),
        Resolution::FollowLink(link) => (
            http::StatusCode::OK,
            PutResponse {
                entry: link,
                follow_link: true,
            },
        ),
    };
    Ok((status, Json(response)))
}

impl ApiRequest for PutRequest {
    type Response = PutResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join("/api/v0/dir/put")?;
        Ok(client.post(full_url).json(&self))
    }
}
