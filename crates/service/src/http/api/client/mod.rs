//! Typed client for the directory API, shared by the CLI and by remote
//! group resolution.

mod error;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

use common::path::UserName;

pub use error::ApiError;

use super::v0::dir::{ErrorResponse, REQUESTER_HEADER};

/// A request type that knows its own route.
pub trait ApiRequest {
    type Response: DeserializeOwned;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, url::ParseError>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    pub remote: Url,
    client: Client,
}

impl ApiClient {
    /// A client that acts as `requester` on every call.
    pub fn new(remote: &Url, requester: &UserName) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        default_headers.insert(REQUESTER_HEADER, HeaderValue::from_str(requester.as_str())?);
        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    pub async fn call<T: ApiRequest>(&self, request: T) -> Result<T::Response, ApiError> {
        self.send(request.build_request(&self.remote, &self.client)?).await
    }

    /// Sends a request built by the caller, e.g. with extra headers.
    pub async fn send<R: DeserializeOwned>(&self, request: RequestBuilder) -> Result<R, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<R>().await?);
        }

        let text = response.text().await?;
        match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(body) => Err(ApiError::Dir { status, body }),
            Err(_) => Err(ApiError::HttpStatus(status, text)),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.remote
    }

    pub fn http_client(&self) -> &Client {
        &self.client
    }
}
