use clap::Args;

use service::http::api::client::ApiError;
use service::http::api::v0::dir::GlobRequest;

use super::format_entry;
use crate::cli::op::ClientError;

#[derive(Args, Debug, Clone)]
pub struct Glob {
    /// Pattern to match, e.g. 'ann@example.com/docs/*.txt'
    pub pattern: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GlobError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Glob {
    type Error = GlobError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let client = ctx.client()?;
        let response = client
            .call(GlobRequest {
                pattern: self.pattern.clone(),
            })
            .await?;

        if response.entries.is_empty() {
            return Ok("No matches".to_string());
        }
        let mut lines: Vec<String> = response.entries.iter().map(format_entry).collect();
        if response.follow_link {
            lines.push("some matches are links, follow them to continue".to_string());
        }
        Ok(lines.join("\n"))
    }
}
