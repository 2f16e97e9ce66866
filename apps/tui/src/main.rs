//! Tenant chat TUI: sign-up, sign-in, and the assistant conversation in the
//! terminal, built with `ratatui` + `crossterm`.
//!
//! Logs go to `~/.tenantchat/tenantchat-tui.log` so they never draw over
//! the screen. Set `RUST_LOG` to change the level.

mod app;
mod screens;
mod widgets;

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use color_eyre::eyre::Result;
use tenantchat_shared::{ConfigOverrides, config_dir, resolve_config};
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "tenantchat-tui.log";

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing()?;

    // Same layering as the CLI, which passes its flags down as env vars.
    let config_path = std::env::var_os("TENANTCHAT_CONFIG").map(PathBuf::from);
    let overrides = ConfigOverrides::from_env()?;
    let config = resolve_config(config_path.as_deref(), &overrides)?;
    let services = app::Services::open(config).await?;
    app::run(services).await
}

fn init_tracing() -> Result<()> {
    let dir = config_dir()?;
    fs::create_dir_all(&dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE_NAME))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tenantchat=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
