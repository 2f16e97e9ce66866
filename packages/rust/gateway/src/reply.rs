//! Normalization of loosely-shaped webhook replies.
//!
//! The webhooks are not consistent about casing (`status` / `Status`,
//! `UserId` / `userId`) or shape (an object, or an array whose first element
//! is the object). [`WebhookReply`] hides that behind typed accessors.

use serde_json::{Map, Value};

/// Value of `status` / `Status` on a successful call.
const SUCCESS: &str = "Success";

/// Value of `Error` / `error` the chat webhook uses as a bare failure marker.
const ERROR_MARKER: &str = "Error";

/// A webhook (or synthesized table) response.
#[derive(Debug, Clone)]
pub struct WebhookReply {
    /// Whether the HTTP status was 2xx.
    pub http_ok: bool,
    /// Raw HTTP status code.
    pub status: u16,
    /// Parsed JSON body; `None` when the body was empty or not JSON.
    pub body: Option<Value>,
}

impl WebhookReply {
    /// Build a reply from a status code and raw body text.
    pub fn from_text(status: u16, text: &str) -> Self {
        Self {
            http_ok: (200..300).contains(&status),
            status,
            body: serde_json::from_str(text).ok(),
        }
    }

    /// Build a reply around an already-parsed body.
    pub fn from_json(status: u16, body: Value) -> Self {
        Self {
            http_ok: (200..300).contains(&status),
            status,
            body: Some(body),
        }
    }

    /// The top-level object, if the body is one.
    fn object(&self) -> Option<&Map<String, Value>> {
        self.body.as_ref()?.as_object()
    }

    /// The object, or the first element of an array body.
    fn head(&self) -> Option<&Map<String, Value>> {
        match self.body.as_ref()? {
            Value::Array(items) => items.first()?.as_object(),
            other => other.as_object(),
        }
    }

    /// `status` or `Status` equals `"Success"`.
    pub fn is_success(&self) -> bool {
        self.object()
            .and_then(|obj| first_text(obj, &["status", "Status"]))
            .is_some_and(|s| s == SUCCESS)
    }

    /// The `Error` / `error` text of the object or first array element.
    pub fn error_message(&self) -> Option<String> {
        self.head().and_then(|obj| first_text(obj, &["Error", "error"]))
    }

    /// The bare `"Error"` marker the chat webhook sends for unknown tenants.
    pub fn is_error_marker(&self) -> bool {
        self.error_message().is_some_and(|e| e == ERROR_MARKER)
    }

    /// First present, non-empty value among alternative top-level keys.
    /// Numbers are rendered as strings.
    pub fn field(&self, keys: &[&str]) -> Option<String> {
        self.object().and_then(|obj| first_text(obj, keys))
    }

    /// The assistant's answer: `output`, `reply`, `message`, or `text`.
    pub fn chat_text(&self) -> Option<String> {
        self.head()
            .and_then(|obj| first_text(obj, &["output", "reply", "message", "text"]))
    }
}

/// Render a JSON value the way it would be stored: strings as-is, numbers
/// in decimal. Empty strings, nulls, booleans, and containers count as absent.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| obj.get(*k).and_then(value_text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_either_casing() {
        assert!(WebhookReply::from_json(200, json!({"status": "Success"})).is_success());
        assert!(WebhookReply::from_json(200, json!({"Status": "Success"})).is_success());
        assert!(!WebhookReply::from_json(200, json!({"status": "success"})).is_success());
        assert!(!WebhookReply::from_json(200, json!([{"status": "Success"}])).is_success());
    }

    #[test]
    fn non_json_body_is_none() {
        let reply = WebhookReply::from_text(502, "<html>Bad gateway</html>");
        assert!(!reply.http_ok);
        assert!(reply.body.is_none());
        assert!(!reply.is_success());
        assert!(reply.error_message().is_none());
    }

    #[test]
    fn error_from_object_or_array_head() {
        let obj = WebhookReply::from_json(400, json!({"error": "Email taken"}));
        assert_eq!(obj.error_message().as_deref(), Some("Email taken"));

        let arr = WebhookReply::from_json(200, json!([{"Error": "Error"}, {"Error": "x"}]));
        assert!(arr.is_error_marker());
    }

    #[test]
    fn field_prefers_first_key_and_stringifies_numbers() {
        let reply = WebhookReply::from_json(
            200,
            json!({"UserId": "", "userId": 42, "unitid": "U-7", "flag": true}),
        );
        assert_eq!(reply.field(&["UserId", "userId"]).as_deref(), Some("42"));
        assert_eq!(reply.field(&["unitId", "unitid"]).as_deref(), Some("U-7"));
        assert_eq!(reply.field(&["flag"]), None);
        assert_eq!(reply.field(&["missing"]), None);
    }

    #[test]
    fn chat_text_fallback_order() {
        let reply = WebhookReply::from_json(200, json!({"reply": "b", "text": "d"}));
        assert_eq!(reply.chat_text().as_deref(), Some("b"));

        let reply = WebhookReply::from_json(200, json!([{"output": "from array"}]));
        assert_eq!(reply.chat_text().as_deref(), Some("from array"));

        let reply = WebhookReply::from_json(200, json!({"output": ""}));
        assert_eq!(reply.chat_text(), None);
    }
}
