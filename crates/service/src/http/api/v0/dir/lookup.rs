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
pub struct LookupRequest {
    pub name: PathName,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResponse {
    /// The entry, or the link to follow when `follow_link` is set.
    pub entry: DirEntry,
    pub follow_link: bool,
}

impl From<Resolution<DirEntry>> for LookupResponse {
    fn from(resolution: Resolution<DirEntry>) -> Self {
        match resolution {
            Resolution::Complete(entry) => Self {
                entry,
                follow_link: false,
            },
            Resolution::FollowLink(entry) => Self {
                entry,
                follow_link: true,
            },
        }
    }
}

pub async fn handler(
    State(state): State<ServiceState>,
    ctx: RequestContext,
    payload: Result<Json<LookupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, DirApiError> {
    let Json(req) = payload?;
    let resolution = state.dir().lookup(&ctx, &req.name).await?;
    Ok((http::StatusCode::OK, Json(LookupResponse::from(resolution))))
}

impl ApiRequest for LookupRequest {
    type Response = LookupResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join("/api/v0/dir/lookup")?;
        Ok(client.post(full_url).json(&self))
    }
}
