//! JSON-over-POST client for the automation webhooks.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tenantchat_shared::{Result, TenantChatError, WebhookEndpoints};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::reply::WebhookReply;
use crate::requests::{ChatRequest, LoginRequest, OtpRequest, RegistrationRequest, TranscriptRequest};

/// User-Agent string for webhook requests.
pub(crate) const USER_AGENT: &str = concat!("TenantChat/", env!("CARGO_PKG_VERSION"));

/// Client for the registration, OTP, chat, and mic webhooks.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: Client,
    endpoints: WebhookEndpoints,
}

impl WebhookClient {
    pub fn new(endpoints: WebhookEndpoints) -> Result<Self> {
        let client = build_client(endpoints.timeout_secs)?;
        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &WebhookEndpoints {
        &self.endpoints
    }

    /// Submit the registration form.
    #[instrument(skip_all, fields(email = %req.email))]
    pub async fn register(&self, req: &RegistrationRequest) -> Result<WebhookReply> {
        post_json(&self.client, &self.endpoints.registration, req).await
    }

    /// Look up an existing tenant by email and phone.
    #[instrument(skip_all, fields(email = %req.email))]
    pub async fn login(&self, req: &LoginRequest) -> Result<WebhookReply> {
        post_json(&self.client, &self.endpoints.registration, req).await
    }

    /// Verify a one-time password.
    #[instrument(skip_all, fields(user_id = ?req.user_id))]
    pub async fn verify_otp(&self, req: &OtpRequest) -> Result<WebhookReply> {
        post_json(&self.client, &self.endpoints.otp, req).await
    }

    /// Send one chat turn.
    #[instrument(skip_all, fields(session_id = %req.session_id))]
    pub async fn chat(&self, req: &ChatRequest) -> Result<WebhookReply> {
        post_json(&self.client, &self.endpoints.chat, req).await
    }

    /// Forward a speech transcript. Failures are logged and dropped.
    #[instrument(skip_all)]
    pub async fn forward_transcript(&self, transcript: &str) {
        let body = TranscriptRequest { transcript };
        match post_json(&self.client, &self.endpoints.mic, &body).await {
            Ok(reply) if reply.http_ok => debug!(status = reply.status, "transcript forwarded"),
            Ok(reply) => warn!(status = reply.status, "mic webhook rejected transcript"),
            Err(e) => warn!(error = %e, "failed to forward transcript"),
        }
    }
}

/// Build a reqwest client. No timeout unless one is configured.
pub(crate) fn build_client(timeout_secs: Option<u64>) -> Result<Client> {
    let mut builder = Client::builder().user_agent(USER_AGENT);
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
        .build()
        .map_err(|e| TenantChatError::Network(format!("failed to build HTTP client: {e}")))
}

/// POST a JSON body and capture the reply whatever its status.
async fn post_json<T: Serialize + ?Sized>(client: &Client, url: &Url, body: &T) -> Result<WebhookReply> {
    let response = client
        .post(url.clone())
        .json(body)
        .send()
        .await
        .map_err(|e| TenantChatError::Network(format!("{url}: {e}")))?;

    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| TenantChatError::Network(format!("{url}: failed to read body: {e}")))?;

    debug!(%url, status, bytes = text.len(), "webhook replied");
    Ok(WebhookReply::from_text(status, &text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tenantchat_shared::WebhooksConfig;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> WebhookClient {
        let config = WebhooksConfig {
            base_url: format!("{}/webhook", server.uri()),
            chat_path: "chat".into(),
            registration_path: "registration".into(),
            otp_path: "otp".into(),
            mic_path: "mic".into(),
            timeout_secs: Some(5),
        };
        let endpoints = WebhookEndpoints::try_from(&config).unwrap();
        WebhookClient::new(endpoints).unwrap()
    }

    #[tokio::test]
    async fn register_posts_form_and_reads_reply() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/webhook/registration"))
            .and(body_json(json!({
                "fullName": "Ada",
                "email": "ada@example.com",
                "phoneNumber": "+445551234",
                "countryCode": "+44",
                "rawPhone": "5551234",
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"status": "Success", "UserId": 12})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let reply = client
            .register(&RegistrationRequest {
                full_name: "Ada".into(),
                email: "ada@example.com".into(),
                phone_number: "+445551234".into(),
                country_code: "+44".into(),
                raw_phone: "5551234".into(),
            })
            .await
            .unwrap();

        assert!(reply.http_ok);
        assert!(reply.is_success());
        assert_eq!(reply.field(&["UserId", "userId"]).as_deref(), Some("12"));
    }

    #[tokio::test]
    async fn non_2xx_is_a_reply_not_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/webhook/otp"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let reply = client_for(&server)
            .verify_otp(&OtpRequest {
                otp: "0000".into(),
                user_id: None,
            })
            .await
            .unwrap();

        assert!(!reply.http_ok);
        assert_eq!(reply.status, 500);
        assert!(reply.body.is_none());
    }

    #[tokio::test]
    async fn chat_hits_chat_endpoint() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/webhook/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"output": "Hello"})))
            .mount(&server)
            .await;

        let reply = client_for(&server)
            .chat(&ChatRequest {
                message: "hi".into(),
                session_id: "sess_a_1".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(reply.chat_text().as_deref(), Some("Hello"));
    }

    #[tokio::test]
    async fn transport_failure_is_network_error() {
        let server = MockServer::start().await;
        let client = client_for(&server);
        drop(server);

        let result = client
            .login(&LoginRequest {
                email: "a@b.co".into(),
                phone_number: "+1555".into(),
            })
            .await;
        assert!(matches!(result, Err(TenantChatError::Network(_))));
    }

    #[tokio::test]
    async fn forward_transcript_posts_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/webhook/mic"))
            .and(body_json(json!({"transcript": "the sink is leaking"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .forward_transcript("the sink is leaking")
            .await;
    }
}
