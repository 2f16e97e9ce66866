//! Direct access to the hosted `tenant_reg` table over its PostgREST API.
//!
//! Replies are reshaped into what the registration and OTP webhooks would
//! have returned, so the auth flows read both backends the same way.

use reqwest::{Client, RequestBuilder};
use serde_json::{Map, Value, json};
use tenantchat_shared::{BackendConfig, Result, TenantChatError};
use tracing::{debug, instrument};
use url::Url;

use crate::reply::{WebhookReply, value_text};
use crate::requests::{LoginRequest, OtpRequest, RegistrationRequest};
use crate::webhook::build_client;

/// Client for `<table_url>/rest/v1/<table_name>`.
#[derive(Debug, Clone)]
pub struct TenantTable {
    client: Client,
    rows_url: Url,
    anon_key: String,
}

impl TenantTable {
    pub fn new(config: &BackendConfig, anon_key: String, timeout_secs: Option<u64>) -> Result<Self> {
        let raw = format!(
            "{}/rest/v1/{}",
            config.table_url.trim_end_matches('/'),
            config.table_name
        );
        let rows_url = Url::parse(&raw)
            .map_err(|e| TenantChatError::config(format!("invalid table URL '{raw}': {e}")))?;
        Ok(Self {
            client: build_client(timeout_secs)?,
            rows_url,
            anon_key,
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    /// Insert a new tenant row.
    #[instrument(skip_all, fields(email = %req.email))]
    pub async fn register(&self, req: &RegistrationRequest) -> Result<WebhookReply> {
        let (fname, lname) = split_name(&req.full_name);
        let row = json!({
            "fname": fname,
            "lname": lname,
            "email": req.email,
            "phone": req.phone_number,
        });

        let response = self
            .authorized(self.client.post(self.rows_url.clone()))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .map_err(|e| TenantChatError::Network(format!("{}: {e}", self.rows_url)))?;

        let status = response.status().as_u16();
        let body = read_json(response, &self.rows_url).await?;
        debug!(status, "table insert replied");

        if !(200..300).contains(&status) {
            return Ok(WebhookReply::from_json(status, postgrest_error(body)));
        }
        Ok(match first_row(body) {
            Some(row) => WebhookReply::from_json(status, success_from_row(row)),
            None => WebhookReply::from_json(status, json!({"Error": "Registration was not saved."})),
        })
    }

    /// Match the user's id and code.
    #[instrument(skip_all, fields(user_id = ?req.user_id))]
    pub async fn verify_otp(&self, req: &OtpRequest) -> Result<WebhookReply> {
        let Some(user_id) = req.user_id.as_deref() else {
            return Ok(WebhookReply::from_json(200, json!({"Error": "Missing user id."})));
        };
        self.find_one(
            &[("id", user_id), ("otp", req.otp.as_str())],
            "Invalid OTP.",
        )
        .await
    }

    /// Match an existing tenant by email and phone.
    #[instrument(skip_all, fields(email = %req.email))]
    pub async fn login(&self, req: &LoginRequest) -> Result<WebhookReply> {
        self.find_one(
            &[("email", req.email.as_str()), ("phone", req.phone_number.as_str())],
            "No tenant found with that email and phone number.",
        )
        .await
    }

    async fn find_one(&self, filters: &[(&str, &str)], missing: &str) -> Result<WebhookReply> {
        let mut url = self.rows_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("select", "*");
            for (column, value) in filters {
                query.append_pair(column, &format!("eq.{value}"));
            }
            query.append_pair("limit", "1");
        }

        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| TenantChatError::Network(format!("{}: {e}", self.rows_url)))?;

        let status = response.status().as_u16();
        let body = read_json(response, &self.rows_url).await?;
        debug!(status, "table lookup replied");

        if !(200..300).contains(&status) {
            return Ok(WebhookReply::from_json(status, postgrest_error(body)));
        }
        Ok(match first_row(body) {
            Some(row) => WebhookReply::from_json(status, success_from_row(row)),
            None => WebhookReply::from_json(status, json!({ "Error": missing })),
        })
    }
}

async fn read_json(response: reqwest::Response, url: &Url) -> Result<Option<Value>> {
    let text = response
        .text()
        .await
        .map_err(|e| TenantChatError::Network(format!("{url}: failed to read body: {e}")))?;
    Ok(serde_json::from_str(&text).ok())
}

/// First name is the first word; everything after it is the last name.
fn split_name(full_name: &str) -> (&str, &str) {
    let trimmed = full_name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim()),
        None => (trimmed, ""),
    }
}

fn first_row(body: Option<Value>) -> Option<Map<String, Value>> {
    match body? {
        Value::Array(rows) => rows.into_iter().next()?.as_object().cloned(),
        Value::Object(row) => Some(row),
        _ => None,
    }
}

/// Webhook-shaped success: the row plus `status`, `UserId`, `fullName`,
/// and `phoneNumber`.
fn success_from_row(mut row: Map<String, Value>) -> Value {
    let text = |key: &str| row.get(key).and_then(value_text).unwrap_or_default();
    let full_name = format!("{} {}", text("fname"), text("lname")).trim().to_string();
    let user_id = row.get("id").cloned().unwrap_or(Value::Null);
    let phone = row.get("phone").cloned().unwrap_or(Value::Null);

    row.insert("status".into(), Value::from("Success"));
    row.insert("UserId".into(), user_id);
    row.insert("fullName".into(), Value::from(full_name));
    row.insert("phoneNumber".into(), phone);
    Value::Object(row)
}

/// PostgREST error bodies carry `message` (and `details`); surface it as
/// the webhook `Error` field.
fn postgrest_error(body: Option<Value>) -> Value {
    let message = body
        .as_ref()
        .and_then(|b| b.get("message"))
        .and_then(value_text)
        .unwrap_or_else(|| "Request failed.".into());
    json!({ "Error": message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn table_for(server: &MockServer) -> TenantTable {
        let config = BackendConfig {
            table_url: server.uri(),
            ..BackendConfig::default()
        };
        TenantTable::new(&config, "anon-key".into(), None).unwrap()
    }

    #[test]
    fn split_name_variants() {
        assert_eq!(split_name("Ada"), ("Ada", ""));
        assert_eq!(split_name("  Ada  King Lovelace "), ("Ada", "King Lovelace"));
    }

    #[tokio::test]
    async fn login_found_row_becomes_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/tenant_reg"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .and(query_param("email", "eq.ada@example.com"))
            .and(query_param("phone", "eq.+15551234"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 9,
                "fname": "Ada",
                "lname": "Lovelace",
                "email": "ada@example.com",
                "phone": "+15551234",
                "tenantid": "T-3",
                "unitid": 41
            }])))
            .mount(&server)
            .await;

        let reply = table_for(&server)
            .login(&LoginRequest {
                email: "ada@example.com".into(),
                phone_number: "+15551234".into(),
            })
            .await
            .unwrap();

        assert!(reply.is_success());
        assert_eq!(reply.field(&["UserId"]).as_deref(), Some("9"));
        assert_eq!(reply.field(&["fullName"]).as_deref(), Some("Ada Lovelace"));
        assert_eq!(reply.field(&["phoneNumber"]).as_deref(), Some("+15551234"));
        assert_eq!(reply.field(&["unitId", "unitid"]).as_deref(), Some("41"));
    }

    #[tokio::test]
    async fn login_no_row_is_error_field() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/tenant_reg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let reply = table_for(&server)
            .login(&LoginRequest {
                email: "x@example.com".into(),
                phone_number: "+1".into(),
            })
            .await
            .unwrap();

        assert!(reply.http_ok);
        assert!(!reply.is_success());
        assert!(reply.error_message().is_some());
    }

    #[tokio::test]
    async fn register_conflict_keeps_duplicate_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/tenant_reg"))
            .and(header("prefer", "return=representation"))
            .and(body_json(json!({
                "fname": "Ada",
                "lname": "Lovelace",
                "email": "ada@example.com",
                "phone": "+15551234",
            })))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "23505",
                "message": "duplicate key value violates unique constraint \"tenant_reg_email_key\""
            })))
            .mount(&server)
            .await;

        let reply = table_for(&server)
            .register(&RegistrationRequest {
                full_name: "Ada Lovelace".into(),
                email: "ada@example.com".into(),
                phone_number: "+15551234".into(),
                country_code: "+1".into(),
                raw_phone: "5551234".into(),
            })
            .await
            .unwrap();

        assert!(!reply.http_ok);
        assert!(reply.error_message().unwrap().contains("duplicate key"));
    }

    #[tokio::test]
    async fn otp_without_user_id_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let reply = table_for(&server)
            .verify_otp(&OtpRequest {
                otp: "1234".into(),
                user_id: None,
            })
            .await
            .unwrap();
        assert!(!reply.is_success());
    }

    #[tokio::test]
    async fn otp_matches_id_and_code() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/tenant_reg"))
            .and(query_param("id", "eq.9"))
            .and(query_param("otp", "eq.4321"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 9, "fname": "Ada", "lname": "", "otp": "4321"
            }])))
            .mount(&server)
            .await;

        let reply = table_for(&server)
            .verify_otp(&OtpRequest {
                otp: "4321".into(),
                user_id: Some("9".into()),
            })
            .await
            .unwrap();
        assert!(reply.is_success());
        assert_eq!(reply.field(&["fullName"]).as_deref(), Some("Ada"));
    }
}
