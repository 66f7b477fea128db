use reqwest::StatusCode;

use super::super::v0::dir::ErrorResponse;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("invalid requester header: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
    #[error("HTTP status {0}: {1}")]
    HttpStatus(StatusCode, String),
    #[error("HTTP status {status}: {} ({:?})", .body.msg, .body.kind)]
    Dir { status: StatusCode, body: ErrorResponse },
}
