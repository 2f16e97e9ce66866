//! HTTP access to the tenant assistant's remote services.
//!
//! Two backends can answer the auth flows:
//! - [`WebhookClient`]: the automation webhooks (registration, OTP, chat, mic)
//! - [`TenantTable`]: the hosted `tenant_reg` table, queried directly
//!
//! Both produce [`WebhookReply`] values so callers never care which one ran.

mod reply;
mod requests;
mod table;
mod webhook;

use std::future::Future;

use tenantchat_shared::{AppConfig, AuthMode, Result, WebhookEndpoints, anon_key};

pub use reply::{WebhookReply, value_text};
pub use requests::{ChatRequest, LoginRequest, OtpRequest, RegistrationRequest};
pub use table::TenantTable;
pub use webhook::WebhookClient;

/// The three calls the register → OTP → login flow needs.
pub trait AuthBackend: Send + Sync {
    fn register(&self, req: &RegistrationRequest) -> impl Future<Output = Result<WebhookReply>> + Send;
    fn verify_otp(&self, req: &OtpRequest) -> impl Future<Output = Result<WebhookReply>> + Send;
    fn login(&self, req: &LoginRequest) -> impl Future<Output = Result<WebhookReply>> + Send;
}

impl AuthBackend for WebhookClient {
    async fn register(&self, req: &RegistrationRequest) -> Result<WebhookReply> {
        WebhookClient::register(self, req).await
    }

    async fn verify_otp(&self, req: &OtpRequest) -> Result<WebhookReply> {
        WebhookClient::verify_otp(self, req).await
    }

    async fn login(&self, req: &LoginRequest) -> Result<WebhookReply> {
        WebhookClient::login(self, req).await
    }
}

impl AuthBackend for TenantTable {
    async fn register(&self, req: &RegistrationRequest) -> Result<WebhookReply> {
        TenantTable::register(self, req).await
    }

    async fn verify_otp(&self, req: &OtpRequest) -> Result<WebhookReply> {
        TenantTable::verify_otp(self, req).await
    }

    async fn login(&self, req: &LoginRequest) -> Result<WebhookReply> {
        TenantTable::login(self, req).await
    }
}

/// Auth backend chosen by `[backend] auth` in the config file.
#[derive(Debug, Clone)]
pub enum ConfiguredBackend {
    Webhook(WebhookClient),
    Table(TenantTable),
}

impl ConfiguredBackend {
    /// Build the configured backend. The table backend needs its anon key
    /// in the environment.
    pub fn from_config(config: &AppConfig, webhooks: &WebhookClient) -> Result<Self> {
        match config.backend.auth {
            AuthMode::Webhook => Ok(Self::Webhook(webhooks.clone())),
            AuthMode::Table => {
                let key = anon_key(config)?;
                let table = TenantTable::new(&config.backend, key, config.webhooks.timeout_secs)?;
                Ok(Self::Table(table))
            }
        }
    }
}

impl AuthBackend for ConfiguredBackend {
    async fn register(&self, req: &RegistrationRequest) -> Result<WebhookReply> {
        match self {
            Self::Webhook(client) => client.register(req).await,
            Self::Table(table) => table.register(req).await,
        }
    }

    async fn verify_otp(&self, req: &OtpRequest) -> Result<WebhookReply> {
        match self {
            Self::Webhook(client) => client.verify_otp(req).await,
            Self::Table(table) => table.verify_otp(req).await,
        }
    }

    async fn login(&self, req: &LoginRequest) -> Result<WebhookReply> {
        match self {
            Self::Webhook(client) => client.login(req).await,
            Self::Table(table) => table.login(req).await,
        }
    }
}

/// Build the webhook client straight from config.
pub fn webhook_client(config: &AppConfig) -> Result<WebhookClient> {
    WebhookClient::new(WebhookEndpoints::try_from(&config.webhooks)?)
}
