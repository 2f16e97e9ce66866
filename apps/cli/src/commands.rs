//! CLI command definitions, routing, and tracing setup.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Report, Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tenantchat_core::auth::{self, RegistrationForm};
use tenantchat_core::{ChatSession, Route, SessionStore, router};
use tenantchat_gateway::{ConfiguredBackend, WebhookClient, webhook_client};
use tenantchat_shared::{
    AppConfig, AuthMode, ConfigOverrides, ENV_AUTH, ENV_DB, ENV_WEBHOOK_BASE, SessionKey,
    TenantChatError, TenantSession, init_config, resolve_config,
};
use tracing::info;

use crate::repl;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Tenant Assistant: chat with your property's tenant support assistant.
#[derive(Parser)]
#[command(
    name = "tenantchat",
    version,
    about = "Register, sign in, and chat with the Tenant Assistant.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.tenantchat/tenantchat.toml.
    #[arg(long, env = "TENANTCHAT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Override `[webhooks] base_url`.
    #[arg(long, env = ENV_WEBHOOK_BASE, global = true)]
    pub webhook_base: Option<String>,

    /// Override `[session] db_path`.
    #[arg(long, env = ENV_DB, global = true)]
    pub db: Option<String>,

    /// Override `[backend] auth`.
    #[arg(long, env = ENV_AUTH, global = true)]
    pub auth: Option<AuthArg>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Auth backend selector.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum AuthArg {
    Webhook,
    Table,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Create a tenant account; a one-time code is sent afterwards.
    Register {
        /// Full name (prompted when omitted).
        #[arg(long)]
        name: Option<String>,

        /// Email address (prompted when omitted).
        #[arg(long)]
        email: Option<String>,

        /// Dialing code, e.g. +44 (defaults to `[registration] default_country_code`).
        #[arg(long)]
        country_code: Option<String>,

        /// Phone number without the country code (prompted when omitted).
        #[arg(long)]
        phone: Option<String>,
    },

    /// Verify the one-time code received after registering.
    Otp {
        /// The code (prompted when omitted).
        code: Option<String>,
    },

    /// Sign in again with the phone number used at registration.
    Login {
        /// Phone number including the country code digits, without `+`.
        phone: Option<String>,
    },

    /// Start an interactive chat.
    Chat,

    /// Send one message and print the reply.
    Send {
        /// Message text.
        message: String,
    },

    /// Forward a speech transcript to the mic webhook (reads stdin when omitted).
    Mic {
        transcript: Option<String>,
    },

    /// Show the stored tenant session.
    Whoami {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Clear the stored tenant session.
    Logout,

    /// Launch the interactive TUI.
    Tui,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so they never
/// mix with chat output.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "tenantchat=error",
        1 => "tenantchat=info",
        2 => "tenantchat=debug",
        _ => "tenantchat=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let overrides = cli.overrides();
    let config = resolve_config(cli.config.as_deref(), &overrides)?;

    match cli.command {
        Command::Register {
            name,
            email,
            country_code,
            phone,
        } => cmd_register(&config, name, email, country_code, phone).await,
        Command::Otp { code } => cmd_otp(&config, code).await,
        Command::Login { phone } => cmd_login(&config, phone).await,
        Command::Chat => cmd_chat(&config).await,
        Command::Send { message } => cmd_send(&config, &message).await,
        Command::Mic { transcript } => cmd_mic(&config, transcript).await,
        Command::Whoami { json } => cmd_whoami(&config, json).await,
        Command::Logout => cmd_logout(&config).await,
        Command::Tui => cmd_tui(cli.config.as_deref(), &overrides).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&config).await,
        },
    }
}

impl Cli {
    /// Command-line (or env) values layered over the config file.
    pub(crate) fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            webhook_base: self.webhook_base.clone(),
            db_path: self.db.clone(),
            auth: self.auth.map(|auth| match auth {
                AuthArg::Webhook => AuthMode::Webhook,
                AuthArg::Table => AuthMode::Table,
            }),
        }
    }
}

/// Turn a flow error into the report shown to the user: form and rejection
/// messages verbatim, anything else with full diagnostics.
pub(crate) fn popup(err: TenantChatError) -> Report {
    match err {
        TenantChatError::Form { message } | TenantChatError::Rejected { message } => {
            eyre!(message)
        }
        other => Report::new(other),
    }
}

/// Use `value` when given, otherwise ask on stdin.
fn value_or_prompt(value: Option<String>, label: &str) -> Result<String> {
    if let Some(v) = value {
        return Ok(v);
    }
    print!("{label}: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Spinner shown while a request is in flight.
pub(crate) fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

async fn open_session(config: &AppConfig) -> Result<SessionStore> {
    Ok(SessionStore::open(&config.session).await?)
}

fn auth_backend(config: &AppConfig, webhooks: &WebhookClient) -> Result<ConfiguredBackend> {
    Ok(ConfiguredBackend::from_config(config, webhooks)?)
}

fn next_step(route: Route) -> &'static str {
    match route {
        Route::Otp => "Check your phone for a one-time code, then run `tenantchat otp <code>`.",
        Route::Home => "You're signed in. Run `tenantchat chat` to talk to the assistant.",
        Route::Login | Route::Register => "",
    }
}

// ---------------------------------------------------------------------------
// Auth commands
// ---------------------------------------------------------------------------

async fn cmd_register(
    config: &AppConfig,
    name: Option<String>,
    email: Option<String>,
    country_code: Option<String>,
    phone: Option<String>,
) -> Result<()> {
    let country_code =
        country_code.unwrap_or_else(|| config.registration.default_country_code.clone());
    if !config.registration.country_codes.contains(&country_code) {
        return Err(eyre!(
            "unsupported country code '{country_code}': expected one of {}",
            config.registration.country_codes.join(", ")
        ));
    }

    let form = RegistrationForm {
        full_name: value_or_prompt(name, "Full name")?,
        email: value_or_prompt(email, "Email")?,
        country_code,
        phone: auth::digits_only(&value_or_prompt(phone, "Phone number")?),
    };

    let webhooks = webhook_client(config)?;
    let backend = auth_backend(config, &webhooks)?;
    let store = open_session(config).await?;

    info!(email = %form.email, "registering");
    let progress = spinner("Registering...");
    let result = auth::register(&backend, &store, &form).await;
    progress.finish_and_clear();

    let route = result.map_err(popup)?;
    println!("Registered {}.", form.international_phone());
    println!("{}", next_step(route));
    Ok(())
}

async fn cmd_otp(config: &AppConfig, code: Option<String>) -> Result<()> {
    let code = auth::digits_only(&value_or_prompt(code, "One-time code")?);

    let webhooks = webhook_client(config)?;
    let backend = auth_backend(config, &webhooks)?;
    let store = open_session(config).await?;

    let progress = spinner("Verifying...");
    let result = auth::verify_otp(&backend, &store, &code).await;
    progress.finish_and_clear();

    let route = result.map_err(popup)?;
    println!("Code verified.");
    println!("{}", next_step(route));
    Ok(())
}

async fn cmd_login(config: &AppConfig, phone: Option<String>) -> Result<()> {
    let phone = value_or_prompt(phone, "Phone number (with country code, digits only)")?;

    let webhooks = webhook_client(config)?;
    let backend = auth_backend(config, &webhooks)?;
    let store = open_session(config).await?;

    let progress = spinner("Signing in...");
    let result = auth::login(&backend, &store, &phone).await;
    progress.finish_and_clear();

    let route = result.map_err(popup)?;
    println!("{}", next_step(route));
    Ok(())
}

async fn cmd_whoami(config: &AppConfig, json: bool) -> Result<()> {
    let session = match SessionStore::open_readonly(&config.session).await? {
        Some(store) => store.load().await?,
        None => TenantSession::default(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
        return Ok(());
    }
    if !session.is_signed_in() {
        println!("Not signed in.");
    }
    for key in SessionKey::ALL {
        if let Some(value) = session.get(key) {
            println!("  {:<18} {value}", key.as_str());
        }
    }
    Ok(())
}

async fn cmd_logout(config: &AppConfig) -> Result<()> {
    let store = open_session(config).await?;
    store.logout().await?;
    println!("Signed out.");
    Ok(())
}

// ---------------------------------------------------------------------------
// Chat commands
// ---------------------------------------------------------------------------

/// Open the session and make sure the home screen is reachable.
async fn signed_in_session(config: &AppConfig) -> Result<SessionStore> {
    let store = open_session(config).await?;
    if router::resolve(Route::Home, &store).await? != Route::Home {
        return Err(eyre!(
            "not signed in. Run `tenantchat login` or `tenantchat register` first."
        ));
    }
    Ok(store)
}

async fn cmd_chat(config: &AppConfig) -> Result<()> {
    let store = signed_in_session(config).await?;
    let client = webhook_client(config)?;
    let chat = ChatSession::start(&store).await?;
    repl::run(config, &client, &store, chat).await
}

async fn cmd_send(config: &AppConfig, message: &str) -> Result<()> {
    let store = signed_in_session(config).await?;
    let client = webhook_client(config)?;
    let mut chat = ChatSession::start(&store).await?;

    let progress = spinner("Assistant is typing...");
    let result = chat.send(&client, &store, message).await;
    progress.finish_and_clear();

    match result? {
        Some(reply) => repl::print_message(reply, None),
        None => return Err(eyre!("message is empty")),
    }
    Ok(())
}

async fn cmd_mic(config: &AppConfig, transcript: Option<String>) -> Result<()> {
    let transcript = match transcript {
        Some(t) => t,
        None => {
            let mut buf = String::new();
            for line in std::io::stdin().lock().lines() {
                buf.push_str(&line?);
                buf.push('\n');
            }
            buf.trim().to_string()
        }
    };
    if transcript.is_empty() {
        return Err(eyre!("no transcript given"));
    }

    let client = webhook_client(config)?;
    client.forward_transcript(&transcript).await;
    println!("{transcript}");
    Ok(())
}

// ---------------------------------------------------------------------------
// TUI / config
// ---------------------------------------------------------------------------

/// Launch the TUI binary with the same config file and overrides.
async fn cmd_tui(config_path: Option<&std::path::Path>, overrides: &ConfigOverrides) -> Result<()> {
    let sibling = std::env::current_exe()?.with_file_name("tenantchat-tui");
    let program = if sibling.exists() {
        sibling
    } else {
        PathBuf::from("tenantchat-tui")
    };

    info!(program = %program.display(), "launching TUI");
    let mut command = tokio::process::Command::new(&program);
    if let Some(path) = config_path {
        command.env("TENANTCHAT_CONFIG", path);
    }
    command.envs(overrides.env_vars());
    let status = command
        .status()
        .await
        .map_err(|e| eyre!("failed to launch {}: {e}", program.display()))?;

    if !status.success() {
        return Err(eyre!(
            "TUI exited with status: {}",
            status.code().unwrap_or(-1)
        ));
    }
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn tui_receives_command_line_overrides() {
        let cli = Cli::try_parse_from([
            "tenantchat",
            "--db",
            "/tmp/other.db",
            "--webhook-base",
            "http://127.0.0.1:5678/webhook/",
            "--auth",
            "table",
            "tui",
        ])
        .expect("parse args");
        assert!(matches!(cli.command, Command::Tui));

        let overrides = cli.overrides();
        let env: HashMap<&str, String> = overrides.env_vars().into_iter().collect();
        assert_eq!(env.get(ENV_AUTH).map(String::as_str), Some("table"));

        // What the TUI rebuilds from its environment must match.
        let seen = ConfigOverrides::from_lookup(|name| env.get(name).cloned()).expect("read env");
        assert_eq!(seen, overrides);

        let mut config = AppConfig::default();
        seen.apply(&mut config);
        assert_eq!(config.session.db_path, "/tmp/other.db");
        assert_eq!(config.backend.auth, AuthMode::Table);
    }
}
