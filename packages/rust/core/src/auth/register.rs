use std::sync::LazyLock;

use regex::Regex;
use tenantchat_gateway::{AuthBackend, RegistrationRequest};
use tenantchat_shared::{Result, SessionKey, TenantChatError};
use tracing::{info, instrument, warn};

use super::check_phone;
use crate::router::Route;
use crate::session::SessionStore;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

const MIN_PHONE_DIGITS: usize = 6;

const MSG_DUPLICATE: &str = "This account already exists. Please try logging in instead.";
const MSG_FAILED: &str = "Failed to register. Please try again.";
const MSG_UNKNOWN: &str = "Registration failed. Please try again.";

/// Registration form fields as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationForm {
    pub full_name: String,
    pub email: String,
    /// Dialing code including the `+`, e.g. `+44`.
    pub country_code: String,
    /// National number, digits only.
    pub phone: String,
}

impl RegistrationForm {
    /// Check fields in form order; the first problem wins.
    pub fn validate(&self) -> Result<()> {
        if self.full_name.trim().is_empty() {
            return Err(TenantChatError::form("Please enter your full name"));
        }
        if self.email.trim().is_empty() {
            return Err(TenantChatError::form("Please enter your email"));
        }
        if !EMAIL_RE.is_match(&self.email) {
            return Err(TenantChatError::form("Please enter a valid email address"));
        }
        check_phone(&self.phone)?;
        if self.phone.len() < MIN_PHONE_DIGITS {
            return Err(TenantChatError::form(format!(
                "Phone number must be at least {MIN_PHONE_DIGITS} digits"
            )));
        }
        Ok(())
    }

    /// Country code followed by the national number.
    pub fn international_phone(&self) -> String {
        format!("{}{}", self.country_code, self.phone)
    }
}

/// Register a new tenant. On success the name, phone, email, and user id
/// are stored and the OTP screen comes next.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn register<B: AuthBackend>(
    backend: &B,
    session: &SessionStore,
    form: &RegistrationForm,
) -> Result<Route> {
    form.validate()?;

    let phone = form.international_phone();
    let request = RegistrationRequest {
        full_name: form.full_name.clone(),
        email: form.email.clone(),
        phone_number: phone.clone(),
        country_code: form.country_code.clone(),
        raw_phone: form.phone.clone(),
    };

    let reply = match backend.register(&request).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(error = %e, "registration request failed");
            return Err(TenantChatError::rejected(MSG_FAILED));
        }
    };

    // Only a top-level error object counts here; array bodies on an
    // error status fall through to the generic failure.
    if !reply.http_ok {
        return Err(match reply.field(&["Error", "error"]) {
            Some(msg) if msg.to_lowercase().contains("duplicate") => {
                TenantChatError::rejected(MSG_DUPLICATE)
            }
            Some(msg) => TenantChatError::rejected(msg),
            None => {
                warn!(status = reply.status, "registration rejected without a message");
                TenantChatError::rejected(MSG_FAILED)
            }
        });
    }

    if reply.is_success() {
        session.set(SessionKey::Name, &form.full_name).await?;
        session.set(SessionKey::Phone, &phone).await?;
        session.set(SessionKey::Email, &form.email).await?;
        match reply.field(&["UserId", "userId"]) {
            Some(user_id) => {
                session.set(SessionKey::UserId, &user_id).await?;
                info!(%user_id, "registered");
            }
            None => warn!("no UserId in registration response"),
        }
        return Ok(Route::Otp);
    }

    Err(TenantChatError::rejected(
        reply.error_message().unwrap_or_else(|| MSG_UNKNOWN.into()),
    ))
}
