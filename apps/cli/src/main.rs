//! Tenant Assistant CLI: sign up, sign in, and chat with the tenant
//! assistant from a terminal.

mod commands;
mod repl;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
