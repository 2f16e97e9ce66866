use tenantchat_gateway::{AuthBackend, OtpRequest, WebhookReply};
use tenantchat_shared::{Result, SessionKey, TenantChatError};
use tracing::{debug, info, instrument, warn};

use crate::router::Route;
use crate::session::SessionStore;

const MSG_FAILED: &str = "Failed to verify OTP. Please try again.";
const MSG_INVALID: &str = "Invalid OTP. Please check the code and try again.";

/// Reply field → session key, copied verbatim when present.
const PROFILE_FIELDS: [(&str, SessionKey); 10] = [
    ("fname", SessionKey::FirstName),
    ("lname", SessionKey::LastName),
    ("phone", SessionKey::Phone),
    ("email", SessionKey::Email),
    ("address", SessionKey::Address),
    ("tenantType", SessionKey::TenantType),
    ("tenantid", SessionKey::TenantTenantId),
    ("unitid", SessionKey::UnitId),
    ("propertyid", SessionKey::PropertyId),
    ("occupancyid", SessionKey::OccupancyId),
];

/// Verify the code sent after registration, then store the full profile.
#[instrument(skip_all)]
pub async fn verify_otp<B: AuthBackend>(
    backend: &B,
    session: &SessionStore,
    code: &str,
) -> Result<Route> {
    let code = code.trim();
    if code.is_empty() {
        return Err(TenantChatError::form("Please enter the OTP code"));
    }

    let request = OtpRequest {
        otp: code.to_string(),
        user_id: session.get(SessionKey::UserId).await?,
    };
    if request.user_id.is_none() {
        warn!("verifying OTP without a stored user id");
    }

    let reply = match backend.verify_otp(&request).await {
        Ok(reply) if reply.http_ok => reply,
        Ok(reply) => {
            warn!(status = reply.status, "OTP webhook returned an error status");
            return Err(TenantChatError::rejected(MSG_FAILED));
        }
        Err(e) => {
            warn!(error = %e, "OTP request failed");
            return Err(TenantChatError::rejected(MSG_FAILED));
        }
    };

    if reply.body.is_none() {
        warn!("no data in OTP response");
        return Err(TenantChatError::rejected(MSG_INVALID));
    }
    if !reply.is_success() {
        warn!(status = ?reply.field(&["status", "Status"]), "OTP status not Success");
        return Err(TenantChatError::rejected(MSG_INVALID));
    }

    store_profile(session, &reply).await?;
    info!("OTP verified");
    Ok(Route::Home)
}

async fn store_profile(session: &SessionStore, reply: &WebhookReply) -> Result<()> {
    session
        .set_opt(SessionKey::TenantId, reply.field(&["id"]).as_deref())
        .await?;
    session
        .set_opt(SessionKey::UserId, reply.field(&["UserId", "userId"]).as_deref())
        .await?;

    let full_name = format!(
        "{} {}",
        reply.field(&["fname"]).unwrap_or_default(),
        reply.field(&["lname"]).unwrap_or_default()
    );
    let full_name = full_name.trim();
    if !full_name.is_empty() {
        session.set(SessionKey::Name, full_name).await?;
    }

    for (field, key) in PROFILE_FIELDS {
        if let Some(value) = reply.field(&[field]) {
            session.set(key, &value).await?;
        }
    }
    debug!("OTP profile saved");
    Ok(())
}
