use clap::Args;

use common::path::PathName;
use service::http::api::client::ApiError;
use service::http::api::v0::dir::DeleteRequest;

use super::format_entry;
use crate::cli::op::ClientError;

#[derive(Args, Debug, Clone)]
pub struct Rm {
    /// Entry to delete; directories must be empty
    pub name: PathName,
}

#[derive(Debug, thiserror::Error)]
pub enum RmError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Rm {
    type Error = RmError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let client = ctx.client()?;
        let response = client
            .call(DeleteRequest {
                name: self.name.clone(),
            })
            .await?;

        if response.follow_link {
            return Ok(format!(
                "{}\nfollow the link to continue",
                format_entry(&response.entry)
            ));
        }
        Ok(format!("deleted {}", format_entry(&response.entry)))
    }
}
