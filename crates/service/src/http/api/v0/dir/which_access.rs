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
pub struct WhichAccessRequest {
    pub name: PathName,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhichAccessResponse {
    /// The governing Access file; absent when only the owner has rights.
    /// Holds the link to follow when `follow_link` is set.
    pub entry: Option<DirEntry>,
    pub follow_link: bool,
}

pub async fn handler(
    State(state): State<ServiceState>,
    ctx: RequestContext,
    payload: Result<Json<WhichAccessRequest>, JsonRejection>,
) -> Result<impl IntoResponse, DirApiError> {
    let Json(req) = payload?;
    let response = match state.dir().which_access(&ctx, &req.name).await? {
        Resolution::Complete(entry) => WhichAccessResponse {
            entry,
            follow_link: false,
        },
        Resolution::FollowLink(link) => WhichAccessResponse {
            entry: Some(link),
            follow_link: true,
        },
    };
    Ok((http::StatusCode::OK, Json(response)))
}

impl ApiRequest for WhichAccessRequest {
    type Response = WhichAccessResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join("/api/v0/dir/which-access")?;
        Ok(client.post(full_url).json(&self))
    }
}
