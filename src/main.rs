//! Entry point for the `diplomat` command.

use std::process::ExitCode;

use clap::Parser;
use diplomat::cli::{
    self,
    Arguments,
};
use tracing_subscriber::EnvFilter;

/// Installs logging and runs the command until it finishes or Ctrl-C.
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Arguments::parse();
    let shutdown = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    match cli::run(args, shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "diplomat failed");
            ExitCode::FAILURE
        }
    }
}
