use std::convert::Infallible;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::Response;
use serde::{Deserialize, Serialize};

use common::entry::Sequence;
use common::path::PathName;

use super::DirApiError;
use crate::context::RequestContext;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchRequest {
    pub name: PathName,
    pub sequence: Sequence,
}

pub async fn handler(
    State(state): State<ServiceState>,
    ctx: RequestContext,
    payload: Result<Json<WatchRequest>, JsonRejection>,
) -> Result<Response, DirApiError> {
    let Json(req) = payload?;
    let never: Infallible = state.dir().watch(&ctx, &req.name, req.sequence).await?;
    match never {}
}
