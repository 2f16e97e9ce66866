//! Application configuration for the tenant chat client.
//!
//! User config lives at `~/.tenantchat/tenantchat.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, TenantChatError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "tenantchat.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".tenantchat";

// ---------------------------------------------------------------------------
// Config structs (matching tenantchat.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Webhook endpoints.
    #[serde(default)]
    pub webhooks: WebhooksConfig,

    /// Which backend answers the auth flows.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Local session persistence.
    #[serde(default)]
    pub session: SessionConfig,

    /// Text-to-speech playback.
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Registration form choices.
    #[serde(default)]
    pub registration: RegistrationConfig,
}

/// `[webhooks]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhooksConfig {
    /// Base URL every path below is appended to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Assistant chat endpoint.
    #[serde(default = "default_chat_path")]
    pub chat_path: String,

    /// Registration endpoint (also used for login).
    #[serde(default = "default_registration_path")]
    pub registration_path: String,

    /// OTP verification endpoint.
    #[serde(default = "default_otp_path")]
    pub otp_path: String,

    /// Dictated transcript sink.
    #[serde(default = "default_mic_path")]
    pub mic_path: String,

    /// Request timeout in seconds. Unset means wait for the webhook indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for WebhooksConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            chat_path: default_chat_path(),
            registration_path: default_registration_path(),
            otp_path: default_otp_path(),
            mic_path: default_mic_path(),
            timeout_secs: None,
        }
    }
}

fn default_base_url() -> String {
    "https://primary-production-320b8.up.railway.app/webhook".into()
}
fn default_chat_path() -> String {
    "48eb8ab2-d760-41f9-bb01-35bf4eda8028/chat".into()
}
fn default_registration_path() -> String {
    "registration".into()
}
fn default_otp_path() -> String {
    "OTPWEBHOOK-send-minirvresa23ssw3".into()
}
fn default_mic_path() -> String {
    "mic".into()
}

/// Which remote system answers register / OTP / login.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// The registration and OTP webhooks.
    #[default]
    Webhook,
    /// The hosted `tenant_reg` table.
    Table,
}

impl AuthMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Webhook => "webhook",
            Self::Table => "table",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "webhook" => Ok(Self::Webhook),
            "table" => Ok(Self::Table),
            other => Err(TenantChatError::config(format!(
                "unknown auth mode `{other}` (expected webhook or table)"
            ))),
        }
    }
}

/// `[backend]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub auth: AuthMode,

    /// Project URL of the hosted table service.
    #[serde(default = "default_table_url")]
    pub table_url: String,

    /// Table holding tenant registrations.
    #[serde(default = "default_table_name")]
    pub table_name: String,

    /// Name of the env var holding the anon key (never store the key itself).
    #[serde(default = "default_anon_key_env")]
    pub anon_key_env: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            auth: AuthMode::default(),
            table_url: default_table_url(),
            table_name: default_table_name(),
            anon_key_env: default_anon_key_env(),
        }
    }
}

fn default_table_url() -> String {
    "https://rehietifqyozzxsqiuro.supabase.co".into()
}
fn default_table_name() -> String {
    "tenant_reg".into()
}
fn default_anon_key_env() -> String {
    "TENANTCHAT_ANON_KEY".into()
}

/// `[session]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session database path; a leading `~` expands to the home directory.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "~/.tenantchat/session.db".into()
}

impl SessionConfig {
    /// Resolve `db_path`, expanding a leading `~`.
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        expand_home(&self.db_path)
    }
}

/// `[speech]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Text-to-speech program.
    #[serde(default = "default_speech_program")]
    pub program: String,

    /// Program arguments; `{text}` is replaced by the cleaned message text.
    #[serde(default = "default_speech_args")]
    pub args: Vec<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: default_speech_program(),
            args: default_speech_args(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_speech_program() -> String {
    "espeak".into()
}
fn default_speech_args() -> Vec<String> {
    vec!["-v".into(), "en-us".into(), "{text}".into()]
}

/// `[registration]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Dialing codes offered by the registration form.
    #[serde(default = "default_country_codes")]
    pub country_codes: Vec<String>,

    #[serde(default = "default_country_code")]
    pub default_country_code: String,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            country_codes: default_country_codes(),
            default_country_code: default_country_code(),
        }
    }
}

fn default_country_codes() -> Vec<String> {
    ["+1", "+44", "+61", "+63", "+65"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_country_code() -> String {
    "+1".into()
}

// ---------------------------------------------------------------------------
// Resolved endpoints (runtime, derived from config)
// ---------------------------------------------------------------------------

/// Fully resolved webhook URLs.
#[derive(Debug, Clone)]
pub struct WebhookEndpoints {
    pub chat: Url,
    pub registration: Url,
    pub otp: Url,
    pub mic: Url,
    pub timeout_secs: Option<u64>,
}

impl TryFrom<&WebhooksConfig> for WebhookEndpoints {
    type Error = TenantChatError;

    fn try_from(config: &WebhooksConfig) -> Result<Self> {
        let base = config.base_url.trim_end_matches('/');
        let join = |path: &str| -> Result<Url> {
            let raw = format!("{base}/{}", path.trim_start_matches('/'));
            Url::parse(&raw)
                .map_err(|e| TenantChatError::config(format!("invalid webhook URL '{raw}': {e}")))
        };

        Ok(Self {
            chat: join(&config.chat_path)?,
            registration: join(&config.registration_path)?,
            otp: join(&config.otp_path)?,
            mic: join(&config.mic_path)?,
            timeout_secs: config.timeout_secs,
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.tenantchat/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TenantChatError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.tenantchat/tenantchat.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TenantChatError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        TenantChatError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TenantChatError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TenantChatError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TenantChatError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the anon key for the hosted table from the env var named in config.
pub fn anon_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.backend.anon_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(TenantChatError::config(format!(
            "table backend anon key not found. Set the {var_name} environment variable."
        ))),
    }
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// Env var overriding `[webhooks] base_url`.
pub const ENV_WEBHOOK_BASE: &str = "TENANTCHAT_WEBHOOK_BASE";
/// Env var overriding `[session] db_path`.
pub const ENV_DB: &str = "TENANTCHAT_DB";
/// Env var overriding `[backend] auth` (`webhook` or `table`).
pub const ENV_AUTH: &str = "TENANTCHAT_AUTH";

/// Values layered over the config file by command-line flags or the
/// environment. The CLI hands them to the TUI through [`Self::env_vars`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub webhook_base: Option<String>,
    pub db_path: Option<String>,
    pub auth: Option<AuthMode>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(base) = &self.webhook_base {
            config.webhooks.base_url = base.clone();
        }
        if let Some(db) = &self.db_path {
            config.session.db_path = db.clone();
        }
        if let Some(auth) = self.auth {
            config.backend.auth = auth;
        }
    }

    /// The overrides as environment variables for a child process.
    pub fn env_vars(&self) -> Vec<(&'static str, String)> {
        let mut vars = Vec::new();
        if let Some(base) = &self.webhook_base {
            vars.push((ENV_WEBHOOK_BASE, base.clone()));
        }
        if let Some(db) = &self.db_path {
            vars.push((ENV_DB, db.clone()));
        }
        if let Some(auth) = self.auth {
            vars.push((ENV_AUTH, auth.as_str().to_string()));
        }
        vars
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read overrides through `lookup`; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let auth = get(ENV_AUTH).map(|v| AuthMode::parse(&v)).transpose()?;
        Ok(Self {
            webhook_base: get(ENV_WEBHOOK_BASE),
            db_path: get(ENV_DB),
            auth,
        })
    }
}

/// Load the config file at `path` (or the default location) and layer
/// `overrides` on top.
pub fn resolve_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    overrides.apply(&mut config);
    Ok(config)
}

fn expand_home(raw: &str) -> Result<PathBuf> {
    match raw.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| TenantChatError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("registration_path"));
        assert!(toml_str.contains("TENANTCHAT_ANON_KEY"));
        assert!(!toml_str.contains("timeout_secs"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.backend.auth, AuthMode::Webhook);
        assert_eq!(parsed.registration.default_country_code, "+1");
        assert_eq!(parsed.registration.country_codes.len(), 5);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[webhooks]
base_url = "http://localhost:5678/webhook/"
timeout_secs = 30

[backend]
auth = "table"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.backend.auth, AuthMode::Table);
        assert_eq!(config.backend.table_name, "tenant_reg");
        assert_eq!(config.webhooks.mic_path, "mic");
        assert!(config.speech.enabled);
    }

    #[test]
    fn endpoints_join_paths() {
        let mut webhooks = WebhooksConfig::default();
        webhooks.base_url = "http://localhost:5678/webhook/".into();
        webhooks.otp_path = "/otp".into();
        let endpoints = WebhookEndpoints::try_from(&webhooks).expect("endpoints");
        assert_eq!(endpoints.registration.as_str(), "http://localhost:5678/webhook/registration");
        assert_eq!(endpoints.otp.as_str(), "http://localhost:5678/webhook/otp");
        assert!(endpoints.chat.as_str().ends_with("/chat"));
    }

    #[test]
    fn endpoints_reject_bad_base() {
        let mut webhooks = WebhooksConfig::default();
        webhooks.base_url = "not a url".into();
        assert!(WebhookEndpoints::try_from(&webhooks).is_err());
    }

    #[test]
    fn overrides_survive_the_trip_to_a_child_process() {
        let overrides = ConfigOverrides {
            webhook_base: Some("http://127.0.0.1:5678/webhook/".into()),
            db_path: Some("/tmp/tc-session.db".into()),
            auth: Some(AuthMode::Table),
        };
        let env: std::collections::HashMap<&str, String> =
            overrides.env_vars().into_iter().collect();
        let received =
            ConfigOverrides::from_lookup(|name| env.get(name).cloned()).expect("read overrides");
        assert_eq!(received, overrides);

        let mut config = AppConfig::default();
        received.apply(&mut config);
        assert_eq!(config.webhooks.base_url, "http://127.0.0.1:5678/webhook/");
        assert_eq!(config.session.db_path, "/tmp/tc-session.db");
        assert_eq!(config.backend.auth, AuthMode::Table);
    }

    #[test]
    fn empty_overrides_leave_config_alone() {
        let overrides = ConfigOverrides::from_lookup(|_| Some(String::new())).expect("read");
        assert_eq!(overrides, ConfigOverrides::default());
        assert!(overrides.env_vars().is_empty());

        let mut config = AppConfig::default();
        overrides.apply(&mut config);
        assert_eq!(config.session.db_path, SessionConfig::default().db_path);
    }

    #[test]
    fn bad_auth_override_is_a_config_error() {
        let err = ConfigOverrides::from_lookup(|name| (name == ENV_AUTH).then(|| "ldap".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("unknown auth mode"));
    }

    #[test]
    fn anon_key_missing() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.backend.anon_key_env = "TENANTCHAT_TEST_NONEXISTENT_KEY_4821".into();
        let result = anon_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("anon key not found"));
    }

    #[test]
    fn db_path_expansion() {
        let session = SessionConfig {
            db_path: "/tmp/tenantchat/session.db".into(),
        };
        assert_eq!(
            session.resolved_db_path().unwrap(),
            PathBuf::from("/tmp/tenantchat/session.db")
        );

        let home = SessionConfig::default().resolved_db_path().unwrap();
        assert!(home.ends_with(".tenantchat/session.db"));
    }
}
