use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::entry::DirEntry;

use super::DirApiError;
use crate::context::RequestContext;
use crate::dir::GlobMatches;
use crate::http::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobRequest {
    pub pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobResponse {
    pub entries: Vec<DirEntry>,
    /// Some of `entries` are links that cut the expansion short.
    pub follow_link: bool,
}

impl From<GlobMatches> for GlobResponse {
    fn from(matches: GlobMatches) -> Self {
        Self {
            entries: matches.entries,
            follow_link: matches.follow_link,
        }
    }
}

pub async fn handler(
    State(state): State<ServiceState>,
    ctx: RequestContext,
    payload: Result<Json<GlobRequest>, JsonRejection>,
) -> Result<impl IntoResponse, DirApiError> {
    let Json(req) = payload?;
    let matches = state.dir().glob(&ctx, &req.pattern).await?;
    Ok((http::StatusCode::OK, Json(GlobResponse::from(matches))))
}

impl ApiRequest for GlobRequest {
    type Response = GlobResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join("/api/v0/dir/glob")?;
        Ok(client.post(full_url).json(&self))
    }
}
