use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequestParts;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use http::request::Parts;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::error::{DirError, ErrorKind};
use common::path::UserName;

use crate::context::RequestContext;
use crate::ServiceState;

pub mod delete;
pub mod glob;
pub mod lookup;
pub mod put;
pub mod watch;
pub mod which_access;

pub use delete::{DeleteRequest, DeleteResponse};
pub use glob::{GlobRequest, GlobResponse};
pub use lookup::{LookupRequest, LookupResponse};
pub use put::{PutRequest, PutResponse};
pub use watch::WatchRequest;
pub use which_access::{WhichAccessRequest, WhichAccessResponse};

/// Authenticated user name, set by the fronting authenticator.
pub const REQUESTER_HEADER: &str = "x-dir-requester";
/// Optional correlation id; one is generated when absent.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/lookup", post(lookup::handler))
        .route("/glob", post(glob::handler))
        .route("/which-access", post(which_access::handler))
        .route("/put", post(put::handler))
        .route("/delete", post(delete::handler))
        .route("/watch", post(watch::handler))
        .with_state(state)
}

#[async_trait]
impl FromRequestParts<ServiceState> for RequestContext {
    type Rejection = DirApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ServiceState) -> Result<Self, Self::Rejection> {
        let requester = parts
            .headers
            .get(REQUESTER_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| UserName::parse(v).ok())
            .ok_or(DirApiError::Unauthenticated)?;

        let ctx = RequestContext::new(requester).with_timeout(state.request_timeout());
        let request_id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok());
        Ok(match request_id {
            Some(id) => ctx.with_correlation_id(id),
            None => ctx,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub msg: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DirApiError {
    #[error(transparent)]
    Dir(#[from] DirError),
    #[error("invalid request body: {0}")]
    Body(#[from] JsonRejection),
    #[error("missing or invalid requester header")]
    Unauthenticated,
}

fn status_for(err: &DirError) -> StatusCode {
    match err.kind() {
        ErrorKind::Invalid | ErrorKind::NotDir => StatusCode::BAD_REQUEST,
        ErrorKind::Private | ErrorKind::Permission => StatusCode::FORBIDDEN,
        ErrorKind::NotExist => StatusCode::NOT_FOUND,
        ErrorKind::Exist | ErrorKind::NotEmpty | ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::NotSupported => StatusCode::NOT_IMPLEMENTED,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
    }
}

impl IntoResponse for DirApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            DirApiError::Dir(e) => (status_for(e), e.kind()),
            DirApiError::Body(_) => (StatusCode::BAD_REQUEST, ErrorKind::Invalid),
            DirApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, ErrorKind::Permission),
        };
        if status.is_server_error() {
            tracing::debug!(error = %self, "dir request failed");
        }
        let body = ErrorResponse {
            kind,
            msg: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
