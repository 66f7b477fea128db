use clap::Args;

use common::path::PathName;
use service::http::api::client::ApiError;
use service::http::api::v0::dir::LookupRequest;

use super::format_entry;
use crate::cli::op::ClientError;

#[derive(Args, Debug, Clone)]
pub struct Lookup {
    /// Path name to look up, e.g. ann@example.com/docs
    pub name: PathName,
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Lookup {
    type Error = LookupError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let client = ctx.client()?;
        let response = client
            .call(LookupRequest {
                name: self.name.clone(),
            })
            .await?;

        let line = format_entry(&response.entry);
        if response.follow_link {
            return Ok(format!("{}\nfollow the link to continue", line));
        }
        Ok(line)
    }
}
