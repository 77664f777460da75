//! `swarm-secrets` binary
//!
//! See [`swarm_secret_provisioner::cli`] for commands and exit codes.

use clap::Parser;
use std::process::ExitCode;
use swarm_secret_provisioner::cli::{run, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let code = run(cli).await;
    u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from)
}
