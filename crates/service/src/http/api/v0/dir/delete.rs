use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::entry::DirEntry;
use common::error::Resolution;
use common::path::PathName;

use super::DirApiError;
use crate::context::RequestContext;
use crate::http::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub name: PathName,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// The removed entry, or the link to follow.
    pub entry: DirEntry,
    pub follow_link: bool,
}

pub async fn handler(
    State(state): State<ServiceState>,
    ctx: RequestContext,
    payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<impl IntoResponse, DirApiError> {
    let Json(req) = payload?;
    let response = match state.dir().delete(&ctx, &req.name).await? {
        Resolution::Complete(entry) => DeleteResponse {
            entry,
            follow_link: false,
        },
        Resolution::FollowLink(link) => DeleteResponse {
            entry: link,
            follow_link: true,
        },
    };
    Ok((http::StatusCode::OK, Json(response)))
}

impl ApiRequest for DeleteRequest {
    type Response = DeleteResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join("/api/v0/dir/delete")?;
        Ok(client.post(full_url).json(&self))
    }
}
