use clap::Args;

use common::entry::DirEntry;
use common::path::{Parsed, PathError, PathName};
use service::http::api::client::ApiError;
use service::http::api::v0::dir::PutRequest;

use super::format_entry;
use crate::cli::op::ClientError;

#[derive(Args, Debug, Clone)]
pub struct Mkdir {
    /// Directory to create; a bare user name creates that user's root
    pub name: PathName,
}

#[derive(Debug, thiserror::Error)]
pub enum MkdirError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("invalid path name: {0}")]
    Path(#[from] PathError),
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Mkdir {
    type Error = MkdirError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let client = ctx.client()?;
        let name = Parsed::parse(&self.name)?.path();
        // the server stamps the writer of directories itself
        let writer = ctx.user.clone().ok_or(ClientError::NoUser)?;
        let entry = DirEntry::directory(name, writer);

        let response = client.call(PutRequest { entry }).await?;
        if response.follow_link {
            return Ok(format!(
                "{}\nfollow the link to continue",
                format_entry(&response.entry)
            ));
        }
        Ok(format!("created {}", format_entry(&response.entry)))
    }
}
