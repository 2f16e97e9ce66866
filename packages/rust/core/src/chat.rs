//! The conversation: message list, id allocation, and the chat webhook turn.
//!
//! A turn is split in two so front-ends can keep drawing while the webhook
//! answers: [`ChatSession::begin_send`] appends the user message and reserves
//! the reply id, [`fetch_reply`] does the network call without borrowing the
//! session, and [`ChatSession::finish`] appends the answer. [`ChatSession::send`]
//! runs all three in sequence.

use std::collections::HashMap;

use tenantchat_gateway::{ChatRequest, WebhookClient};
use tenantchat_markdown::parse_ai_options;
use tenantchat_shared::{Message, Result, SessionId, TenantSession};
use tracing::{debug, info, instrument, warn};

use crate::session::SessionStore;

pub const WELCOME: &str = "Welcome! I am your Tenant Assistant. How can I help you today?";
pub const UNREGISTERED_EMAIL: &str = "It looks like you are not using your registered tenant email. Please log in with your tenant email and try again.";
pub const NO_RESPONSE: &str = "Sorry, I was unable to get a response. Please try again.";

/// A user message that has been shown and is waiting for its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTurn {
    /// Id the assistant reply will get.
    pub reply_id: u64,
    /// Text sent to the webhook.
    pub text: String,
}

/// One chat conversation. Lives only in memory; a new one starts with each
/// visit to the home screen.
#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<Message>,
    next_id: u64,
    session_id: SessionId,
    selected: HashMap<u64, String>,
}

impl ChatSession {
    /// Start a conversation with a freshly minted, persisted session id.
    pub async fn start(store: &SessionStore) -> Result<Self> {
        let session_id = store.new_session_id().await?;
        Ok(Self::with_session_id(session_id))
    }

    pub fn with_session_id(session_id: SessionId) -> Self {
        Self {
            messages: vec![Message::assistant(1, WELCOME, Vec::new())],
            next_id: 2,
            session_id,
            selected: HashMap::new(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Option previously picked on an assistant message.
    pub fn selected_option(&self, message_id: u64) -> Option<&str> {
        self.selected.get(&message_id).map(String::as_str)
    }

    /// Show the user's message and reserve the reply id. Blank input is
    /// ignored.
    pub fn begin_send(&mut self, text: &str) -> Option<PendingTurn> {
        if text.trim().is_empty() {
            return None;
        }
        let user_id = self.next_id;
        self.next_id += 2;
        self.messages.push(Message::user(user_id, text));
        Some(PendingTurn {
            reply_id: user_id + 1,
            text: text.to_string(),
        })
    }

    /// Record the pick on `message_id` and send `value` as the next message.
    pub fn select_option(&mut self, message_id: u64, value: &str) -> Option<PendingTurn> {
        let offers_options = self
            .messages
            .iter()
            .any(|m| m.id == message_id && !m.is_user() && !m.options.is_empty());
        if offers_options {
            self.selected.insert(message_id, value.to_string());
        } else {
            warn!(message_id, "option picked on a message without options");
        }
        self.begin_send(value)
    }

    /// Append the assistant reply for a pending turn.
    pub fn finish(&mut self, turn: PendingTurn, reply: String) -> &Message {
        let options = parse_ai_options(&reply);
        debug!(id = turn.reply_id, options = options.len(), "assistant replied");
        self.messages
            .push(Message::assistant(turn.reply_id, reply, options));
        &self.messages[self.messages.len() - 1]
    }

    /// Full turn: show, ask, append.
    pub async fn send(
        &mut self,
        client: &WebhookClient,
        store: &SessionStore,
        text: &str,
    ) -> Result<Option<&Message>> {
        let Some(turn) = self.begin_send(text) else {
            return Ok(None);
        };
        let reply = fetch_reply(client, store, &self.session_id, &turn.text).await?;
        Ok(Some(self.finish(turn, reply)))
    }

    /// [`ChatSession::select_option`] followed by the rest of the turn.
    pub async fn choose(
        &mut self,
        client: &WebhookClient,
        store: &SessionStore,
        message_id: u64,
        value: &str,
    ) -> Result<Option<&Message>> {
        let Some(turn) = self.select_option(message_id, value) else {
            return Ok(None);
        };
        let reply = fetch_reply(client, store, &self.session_id, &turn.text).await?;
        Ok(Some(self.finish(turn, reply)))
    }
}

/// Build the webhook payload from the session as stored right now.
pub fn chat_request(session: &TenantSession, session_id: &SessionId, text: &str) -> ChatRequest {
    for (value, name) in [
        (&session.user_id, "UserId"),
        (&session.unit_id, "unit_id"),
        (&session.tenant_id, "tenant_id"),
        (&session.property_id, "property_id"),
    ] {
        if value.is_none() {
            warn!("no {name} in session");
        }
    }

    ChatRequest {
        message: text.to_string(),
        full_name: session.name.clone(),
        phone_number: session.phone.clone(),
        session_id: session_id.to_string(),
        email: session.email.clone(),
        user_id: session.user_id.clone(),
        unit_id: session.unit_id.clone(),
        tenant_id: session.tenant_id.clone(),
        tenant_tenant_id: session.tenant_tenant_id.clone(),
        property_id: session.property_id.clone(),
        occupancy_id: session.occupancy_id.clone(),
    }
}

/// Ask the chat webhook and turn whatever comes back into display text.
/// Only a storage failure is an error; every remote failure becomes
/// [`NO_RESPONSE`].
#[instrument(skip_all, fields(session_id = %session_id))]
pub async fn fetch_reply(
    client: &WebhookClient,
    store: &SessionStore,
    session_id: &SessionId,
    text: &str,
) -> Result<String> {
    let session = store.load().await?;
    let request = chat_request(&session, session_id, text);

    let reply = match client.chat(&request).await {
        Ok(reply) if reply.http_ok => reply,
        Ok(reply) => {
            warn!(status = reply.status, "chat webhook returned an error status");
            return Ok(NO_RESPONSE.to_string());
        }
        Err(e) => {
            warn!(error = %e, "failed to get response from chat webhook");
            return Ok(NO_RESPONSE.to_string());
        }
    };

    if reply.is_error_marker() {
        info!("chat webhook flagged an unregistered email");
        return Ok(UNREGISTERED_EMAIL.to_string());
    }
    Ok(reply.chat_text().unwrap_or_else(|| NO_RESPONSE.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::temp_store;
    use crate::test_support::client_for;
    use serde_json::json;
    use tenantchat_shared::SessionKey;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session() -> ChatSession {
        ChatSession::with_session_id(SessionId("sess_test_1".into()))
    }

    async fn mount_chat(server: &MockServer, status: u16, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    #[test]
    fn starts_with_welcome() {
        let chat = session();
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.messages()[0].id, 1);
        assert_eq!(chat.messages()[0].text, WELCOME);
        assert!(!chat.messages()[0].is_user());
    }

    #[test]
    fn ids_advance_by_two() {
        let mut chat = session();
        let first = chat.begin_send("hello").unwrap();
        let second = chat.begin_send("again").unwrap();
        assert_eq!(first.reply_id, 3);
        assert_eq!(second.reply_id, 5);
        let ids: Vec<u64> = chat.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 4]);

        // Replies land in completion order with their reserved ids.
        chat.finish(second, "b".into());
        chat.finish(first, "a".into());
        let ids: Vec<u64> = chat.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 4, 5, 3]);
    }

    #[test]
    fn blank_input_is_not_sent() {
        let mut chat = session();
        assert!(chat.begin_send("   \n").is_none());
        assert_eq!(chat.messages().len(), 1);
    }

    #[test]
    fn finish_parses_options() {
        let mut chat = session();
        let turn = chat.begin_send("my sink leaks").unwrap();
        let reply = chat.finish(turn, "Where is the leak?\n1. Kitchen\n2. Bathroom".into());
        assert_eq!(reply.options.len(), 2);
        assert_eq!(reply.options[1].label, "Bathroom");
    }

    #[test]
    fn select_option_records_and_sends_value() {
        let mut chat = session();
        let turn = chat.begin_send("leak").unwrap();
        let reply_id = chat.finish(turn, "Which room?\n1. Kitchen\n2. Bath".into()).id;

        let turn = chat.select_option(reply_id, "2").unwrap();
        assert_eq!(turn.text, "2");
        assert_eq!(chat.selected_option(reply_id), Some("2"));
        assert_eq!(chat.messages().last().unwrap().text, "2");
        assert!(chat.messages().last().unwrap().is_user());
    }

    #[test]
    fn request_includes_only_present_ids() {
        let session = TenantSession {
            name: Some("Ada".into()),
            phone: Some("+15551234".into()),
            unit_id: Some("U-1".into()),
            ..TenantSession::default()
        };
        let req = chat_request(&session, &SessionId("sess_a_1".into()), "hi");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "message": "hi",
                "fullName": "Ada",
                "phoneNumber": "+15551234",
                "sessionId": "sess_a_1",
                "unitId": "U-1",
            })
        );
    }

    #[tokio::test]
    async fn send_reads_session_fresh_and_appends_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_json(json!({
                "message": "hello",
                "fullName": "Ada",
                "phoneNumber": "+15551234",
                "sessionId": "sess_test_1",
                "email": "ada@example.com",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"output": "Hi Ada"})))
            .mount(&server)
            .await;

        let store = temp_store().await;
        let mut chat = session();
        store.set(SessionKey::Name, "Ada").await.unwrap();
        store.set(SessionKey::Phone, "+15551234").await.unwrap();
        store.set(SessionKey::Email, "ada@example.com").await.unwrap();

        let reply = chat.send(&client_for(&server), &store, "hello").await.unwrap().unwrap();
        assert_eq!(reply.id, 3);
        assert_eq!(reply.text, "Hi Ada");
    }

    #[tokio::test]
    async fn error_marker_becomes_email_hint() {
        let server = MockServer::start().await;
        mount_chat(&server, 200, json!([{"error": "Error"}])).await;

        let store = temp_store().await;
        let mut chat = session();
        let reply = chat.send(&client_for(&server), &store, "hi").await.unwrap().unwrap();
        assert_eq!(reply.text, UNREGISTERED_EMAIL);
    }

    #[tokio::test]
    async fn failures_fall_back() {
        let server = MockServer::start().await;
        mount_chat(&server, 500, json!({"output": "ignored"})).await;

        let store = temp_store().await;
        let mut chat = session();
        let reply = chat.send(&client_for(&server), &store, "hi").await.unwrap().unwrap();
        assert_eq!(reply.text, NO_RESPONSE);
        assert!(reply.options.is_empty());
    }

    #[tokio::test]
    async fn reply_without_text_falls_back() {
        let server = MockServer::start().await;
        mount_chat(&server, 200, json!({"status": "ok"})).await;

        let store = temp_store().await;
        let mut chat = session();
        let reply = chat.send(&client_for(&server), &store, "hi").await.unwrap().unwrap();
        assert_eq!(reply.text, NO_RESPONSE);
    }

    #[tokio::test]
    async fn start_persists_session_id() {
        let store = temp_store().await;
        let chat = ChatSession::start(&store).await.unwrap();
        assert_eq!(
            store.get(SessionKey::SessionId).await.unwrap().as_deref(),
            Some(chat.session_id().as_str())
        );
    }
}
