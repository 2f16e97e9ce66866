//! Request payloads, serialized with the exact keys the webhooks expect.

use serde::Serialize;

/// Registration form submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub full_name: String,
    pub email: String,
    /// International number: country code followed by the raw digits.
    pub phone_number: String,
    pub country_code: String,
    pub raw_phone: String,
}

/// Login submission; posted to the registration endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub phone_number: String,
}

/// OTP verification. `UserId` is sent as `null` when unknown.
#[derive(Debug, Clone, Serialize)]
pub struct OtpRequest {
    pub otp: String,
    #[serde(rename = "UserId")]
    pub user_id: Option<String>,
}

/// One chat turn with the tenant's identity attached.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "UserId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupancy_id: Option<String>,
}

/// Speech-to-text result forwarded to the mic webhook.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptRequest<'a> {
    pub transcript: &'a str,
}
