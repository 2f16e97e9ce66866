use tenantchat_gateway::{AuthBackend, LoginRequest, WebhookReply};
use tenantchat_shared::{Result, SessionKey, TenantChatError};
use tracing::{debug, info, instrument, warn};

use super::check_phone;
use crate::router::Route;
use crate::session::SessionStore;

const MSG_NOT_FOUND: &str = "User not found. Please register first.";
const MSG_FAILED: &str = "Failed to login. Please try again.";
const MSG_UNKNOWN: &str = "Login failed. Please try again.";

/// Alternative reply keys → session key.
const REFRESHED_FIELDS: [(&[&str], SessionKey); 8] = [
    (&["UserId", "userId"], SessionKey::UserId),
    (&["fullName"], SessionKey::Name),
    (&["phoneNumber"], SessionKey::Phone),
    (&["email"], SessionKey::Email),
    (&["tenantId", "tenantid"], SessionKey::TenantTenantId),
    (&["unitId", "unitid"], SessionKey::UnitId),
    (&["propertyId", "propertyid"], SessionKey::PropertyId),
    (&["occupancyId", "occupancyid"], SessionKey::OccupancyId),
];

/// Sign back in with the email stored at registration and the phone
/// number typed now (digits including the country code, no `+`).
#[instrument(skip_all)]
pub async fn login<B: AuthBackend>(
    backend: &B,
    session: &SessionStore,
    phone: &str,
) -> Result<Route> {
    check_phone(phone)?;

    let Some(email) = session.get(SessionKey::Email).await? else {
        return Err(TenantChatError::rejected(MSG_NOT_FOUND));
    };

    let request = LoginRequest {
        email,
        phone_number: format!("+{phone}"),
    };

    let reply = match backend.login(&request).await {
        Ok(reply) if reply.http_ok => reply,
        Ok(reply) => {
            warn!(status = reply.status, "login webhook returned an error status");
            return Err(TenantChatError::rejected(MSG_FAILED));
        }
        Err(e) => {
            warn!(error = %e, "login request failed");
            return Err(TenantChatError::rejected(MSG_FAILED));
        }
    };

    if reply.is_success() {
        refresh_profile(session, &reply).await?;
        info!("logged in");
        return Ok(Route::Home);
    }

    Err(TenantChatError::rejected(
        reply
            .field(&["Error", "error"])
            .unwrap_or_else(|| MSG_UNKNOWN.into()),
    ))
}

async fn refresh_profile(session: &SessionStore, reply: &WebhookReply) -> Result<()> {
    for (fields, key) in REFRESHED_FIELDS {
        if let Some(value) = reply.field(fields) {
            debug!(key = %key, "updated on login");
            session.set(key, &value).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::temp_store;
    use crate::test_support::client_for;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn non_digit_phone_never_hits_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let store = temp_store().await;
        store.set(SessionKey::Email, "ada@example.com").await.unwrap();

        let err = login(&client_for(&server), &store, "+1 555").await.unwrap_err();
        assert_eq!(err.to_string(), "Phone number must contain only digits");
        let err = login(&client_for(&server), &store, "").await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter your phone number");
    }

    #[tokio::test]
    async fn missing_email_means_not_registered() {
        let server = MockServer::start().await;
        let store = temp_store().await;
        let err = login(&client_for(&server), &store, "15551234").await.unwrap_err();
        assert_eq!(err.to_string(), MSG_NOT_FOUND);
    }

    #[tokio::test]
    async fn success_refreshes_identity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/registration"))
            .and(body_json(json!({"email": "ada@example.com", "phoneNumber": "+15551234"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "Success",
                "userId": "u-1",
                "fullName": "Ada King",
                "phoneNumber": "+15551234",
                "tenantid": "T-2",
                "unitId": "U-4",
                "propertyid": 8
            })))
            .mount(&server)
            .await;

        let store = temp_store().await;
        store.set(SessionKey::Email, "ada@example.com").await.unwrap();

        let next = login(&client_for(&server), &store, "15551234").await.unwrap();
        assert_eq!(next, Route::Home);

        let s = store.load().await.unwrap();
        assert_eq!(s.user_id.as_deref(), Some("u-1"));
        assert_eq!(s.name.as_deref(), Some("Ada King"));
        assert_eq!(s.phone.as_deref(), Some("+15551234"));
        assert_eq!(s.email.as_deref(), Some("ada@example.com"));
        assert_eq!(s.tenant_tenant_id.as_deref(), Some("T-2"));
        assert_eq!(s.unit_id.as_deref(), Some("U-4"));
        assert_eq!(s.property_id.as_deref(), Some("8"));
        assert!(s.occupancy_id.is_none());
    }

    #[tokio::test]
    async fn error_field_is_shown() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/registration"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"Error": "Phone does not match"})),
            )
            .mount(&server)
            .await;

        let store = temp_store().await;
        store.set(SessionKey::Email, "ada@example.com").await.unwrap();
        let err = login(&client_for(&server), &store, "15551234").await.unwrap_err();
        assert_eq!(err.to_string(), "Phone does not match");
    }

    #[tokio::test]
    async fn http_error_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/registration"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"Error": "nope"})))
            .mount(&server)
            .await;

        let store = temp_store().await;
        store.set(SessionKey::Email, "ada@example.com").await.unwrap();
        let err = login(&client_for(&server), &store, "15551234").await.unwrap_err();
        assert_eq!(err.to_string(), MSG_FAILED);
    }
}
