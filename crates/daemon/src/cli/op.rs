use std::error::Error;
use std::path::PathBuf;

use url::Url;

use common::path::UserName;
use service::http::api::client::{ApiClient, ApiError};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("no user given, pass --user")]
    NoUser,
    #[error("failed to create API client: {0}")]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone)]
pub struct OpContext {
    /// Server the client commands talk to
    pub remote: Url,
    /// User the client commands act as
    pub user: Option<UserName>,
    /// Optional custom config file (defaults to ~/.dirserver/config.toml)
    pub config_path: Option<PathBuf>,
}

impl OpContext {
    pub fn new(remote: Url, user: Option<UserName>, config_path: Option<PathBuf>) -> Self {
        Self {
            remote,
            user,
            config_path,
        }
    }

    /// An API client acting as the configured user.
    pub fn client(&self) -> Result<ApiClient, ClientError> {
        let user = self.user.as_ref().ok_or(ClientError::NoUser)?;
        Ok(ApiClient::new(&self.remote, user)?)
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_user() {
        let remote = Url::parse("http://localhost:3000").unwrap();
        let ctx = OpContext::new(remote.clone(), None, None);
        assert!(matches!(ctx.client(), Err(ClientError::NoUser)));

        let ann = UserName::parse("ann@example.com").unwrap();
        let ctx = OpContext::new(remote, Some(ann), None);
        assert!(ctx.client().is_ok());
    }
}
