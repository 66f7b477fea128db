pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

use common::path::UserName;

#[derive(Parser, Debug)]
#[command(name = "dirserver")]
#[command(about = "Directory server for user-rooted trees of signed entries")]
pub struct Args {
    /// Directory server to talk to, for client commands
    #[arg(long, global = true, default_value = "http://localhost:3000")]
    pub remote: Url,

    /// User to act as, for client commands
    #[arg(long, global = true)]
    pub user: Option<UserName>,

    /// Path to a TOML config file (defaults to ~/.dirserver/config.toml)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Command;

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "dirserver",
            "lookup",
            "ann@example.com/docs",
            "--user",
            "ann@example.com",
            "--remote",
            "http://dir.example.com:4000",
        ])
        .unwrap();

        assert_eq!(args.user.unwrap().as_str(), "ann@example.com");
        assert_eq!(args.remote.port(), Some(4000));
        match args.command {
            Command::Lookup(lookup) => assert_eq!(lookup.name.as_str(), "ann@example.com/docs"),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_malformed_user() {
        assert!(Args::try_parse_from(["dirserver", "health", "--user", "nobody"]).is_err());
    }

    #[test]
    fn test_serve_flags() {
        let args = Args::try_parse_from([
            "dirserver",
            "serve",
            "--listen-addr",
            "127.0.0.1:3001",
            "--log-level",
            "debug",
        ])
        .unwrap();
        match args.command {
            Command::Serve(serve) => {
                assert_eq!(serve.listen_addr, Some("127.0.0.1:3001".parse().unwrap()));
                assert_eq!(serve.log_level, Some(tracing::Level::DEBUG));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
