//! Shared types, error model, and configuration for the tenant chat client.
//!
//! This crate is the foundation depended on by all other workspace crates.
//! It provides:
//! - [`TenantChatError`]: the unified error type
//! - Domain types ([`Message`], [`AiOption`], [`TenantSession`], [`SessionKey`], [`SessionId`])
//! - Configuration ([`AppConfig`], [`WebhookEndpoints`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, AuthMode, BackendConfig, ConfigOverrides, ENV_AUTH, ENV_DB, ENV_WEBHOOK_BASE,
    RegistrationConfig, SessionConfig, SpeechConfig, WebhookEndpoints, WebhooksConfig, anon_key,
    config_dir, config_file_path, init_config, load_config, load_config_from, resolve_config,
};
pub use error::{Result, TenantChatError, UNEXPECTED_ERROR};
pub use types::{
    AiOption, DocumentLink, Message, Sender, SessionId, SessionKey, TenantSession,
};
