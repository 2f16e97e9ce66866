use tenantchat_gateway::WebhookClient;
use tenantchat_shared::{WebhookEndpoints, WebhooksConfig};
use wiremock::MockServer;

/// Webhook client whose endpoints are `/registration`, `/otp`, `/chat`,
/// and `/mic` on the mock server.
pub(crate) fn client_for(server: &MockServer) -> WebhookClient {
    let config = WebhooksConfig {
        base_url: server.uri(),
        chat_path: "chat".into(),
        registration_path: "registration".into(),
        otp_path: "otp".into(),
        mic_path: "mic".into(),
        timeout_secs: Some(5),
    };
    WebhookClient::new(WebhookEndpoints::try_from(&config).expect("endpoints")).expect("client")
}
