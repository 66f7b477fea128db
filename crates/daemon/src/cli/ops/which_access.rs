use clap::Args;

use common::path::PathName;
use service::http::api::client::ApiError;
use service::http::api::v0::dir::WhichAccessRequest;

use super::format_entry;
use crate::cli::op::ClientError;

#[derive(Args, Debug, Clone)]
pub struct WhichAccess {
    /// Path name whose governing Access file to find
    pub name: PathName,
}

#[derive(Debug, thiserror::Error)]
pub enum WhichAccessError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for WhichAccess {
    type Error = WhichAccessError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let client = ctx.client()?;
        let response = client
            .call(WhichAccessRequest {
                name: self.name.clone(),
            })
            .await?;

        Ok(match (response.entry, response.follow_link) {
            (Some(link), true) => format!("{}\nfollow the link to continue", format_entry(&link)),
            (Some(access), false) => format_entry(&access),
            (None, _) => "No Access file, only the owner has rights".to_string(),
        })
    }
}
