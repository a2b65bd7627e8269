use crate::cli::{commands::Commands, handlers};
use crate::error::Result;
use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::path::PathBuf;
use tollgate_sdk::ClientConfig;

/// Tollgate CLI - authenticated requests with automatic credential renewal
#[derive(Parser, Debug)]
#[command(
    name = "tollgate",
    version,
    about = "Tollgate CLI - authenticated requests with automatic credential renewal",
    long_about = "Send requests to an API with short-lived access tokens.

QUICK START:
  tollgate login --access-token <jwt> --refresh-token <token>
  tollgate status                   # Show session expiry
  tollgate request GET /items       # Authenticated request
  tollgate logout                   # Forget the session"
)]
pub struct Args {
    /// Configuration file path (defaults to ./tollgate.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Args {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        let config = ClientConfig::load(self.config.as_deref())?;

        match self.command {
            Commands::Login {
                access_token,
                refresh_token,
                registered,
                profile,
            } => {
                handlers::session::handle_login(
                    &config,
                    &access_token,
                    &refresh_token,
                    registered,
                    profile.as_deref(),
                )
                .await
            }
            Commands::Logout => handlers::session::handle_logout(&config).await,
            Commands::Status => handlers::session::handle_status(&config).await,
            Commands::Request { method, path, data } => {
                handlers::request::handle_request(&config, &method, &path, data.as_deref()).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_command() {
        let args =
            Args::try_parse_from(["tollgate", "request", "post", "/items", "-d", "{}"]).unwrap();
        match args.command {
            Commands::Request { method, path, data } => {
                assert_eq!(method, "post");
                assert_eq!(path, "/items");
                assert_eq!(data.as_deref(), Some("{}"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_login_flags() {
        let args = Args::try_parse_from([
            "tollgate",
            "--config",
            "custom.toml",
            "login",
            "--access-token",
            "a.b.c",
            "--refresh-token",
            "r1",
            "--registered",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(
            args.command,
            Commands::Login { registered: true, .. }
        ));
    }
}
