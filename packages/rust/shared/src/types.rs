//! Core domain types for the tenant chat client.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    #[serde(rename = "ai")]
    Assistant,
}

/// A numbered choice detected in assistant text. `value` is always a
/// non-empty run of ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiOption {
    pub value: String,
    pub label: String,
}

/// A single entry in the chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub from: Sender,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<AiOption>,
}

impl Message {
    pub fn user(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            from: Sender::User,
            text: text.into(),
            options: Vec::new(),
        }
    }

    pub fn assistant(id: u64, text: impl Into<String>, options: Vec<AiOption>) -> Self {
        Self {
            id,
            from: Sender::Assistant,
            text: text.into(),
            options,
        }
    }

    pub fn is_user(&self) -> bool {
        self.from == Sender::User
    }
}

/// A downloadable document referenced by assistant text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLink {
    pub name: String,
    pub url: String,
}

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Conversation identifier sent with every chat request.
///
/// Format: `sess_<random>_<unix millis>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a fresh conversation identifier.
    pub fn new() -> Self {
        let raw = Uuid::now_v7().simple().to_string();
        // The tail of a v7 UUID is random; the head is a timestamp we
        // already append in readable form.
        Self(format!("sess_{}_{}", &raw[16..], Utc::now().timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Session keys
// ---------------------------------------------------------------------------

/// Every key the client persists between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    Name,
    Phone,
    Email,
    UserId,
    UnitId,
    TenantId,
    TenantTenantId,
    FirstName,
    LastName,
    Address,
    TenantType,
    PropertyId,
    OccupancyId,
    SessionId,
}

impl SessionKey {
    /// All keys, in the order they are listed by `whoami`.
    pub const ALL: [SessionKey; 14] = [
        Self::Name,
        Self::Phone,
        Self::Email,
        Self::UserId,
        Self::UnitId,
        Self::TenantId,
        Self::TenantTenantId,
        Self::FirstName,
        Self::LastName,
        Self::Address,
        Self::TenantType,
        Self::PropertyId,
        Self::OccupancyId,
        Self::SessionId,
    ];

    /// Storage name of the key.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "tenant_name",
            Self::Phone => "tenant_phone",
            Self::Email => "tenant_email",
            Self::UserId => "tenant_user_id",
            Self::UnitId => "tenant_unit_id",
            Self::TenantId => "tenant_id",
            Self::TenantTenantId => "tenant_tenant_id",
            Self::FirstName => "tenant_fname",
            Self::LastName => "tenant_lname",
            Self::Address => "tenant_address",
            Self::TenantType => "tenant_type",
            Self::PropertyId => "property_id",
            Self::OccupancyId => "occupancy_id",
            Self::SessionId => "tenant_session_id",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TenantSession
// ---------------------------------------------------------------------------

/// Snapshot of the persisted tenant identity. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupancy_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl TenantSession {
    /// Build a session from stored `(key, value)` pairs. Unknown keys are ignored.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut session = Self::default();
        for (key, value) in entries {
            if let Some(key) = SessionKey::parse(key.as_ref()) {
                *session.slot_mut(key) = Some(value.into());
            }
        }
        session
    }

    pub fn get(&self, key: SessionKey) -> Option<&str> {
        match key {
            SessionKey::Name => self.name.as_deref(),
            SessionKey::Phone => self.phone.as_deref(),
            SessionKey::Email => self.email.as_deref(),
            SessionKey::UserId => self.user_id.as_deref(),
            SessionKey::UnitId => self.unit_id.as_deref(),
            SessionKey::TenantId => self.tenant_id.as_deref(),
            SessionKey::TenantTenantId => self.tenant_tenant_id.as_deref(),
            SessionKey::FirstName => self.first_name.as_deref(),
            SessionKey::LastName => self.last_name.as_deref(),
            SessionKey::Address => self.address.as_deref(),
            SessionKey::TenantType => self.tenant_type.as_deref(),
            SessionKey::PropertyId => self.property_id.as_deref(),
            SessionKey::OccupancyId => self.occupancy_id.as_deref(),
            SessionKey::SessionId => self.session_id.as_deref(),
        }
    }

    fn slot_mut(&mut self, key: SessionKey) -> &mut Option<String> {
        match key {
            SessionKey::Name => &mut self.name,
            SessionKey::Phone => &mut self.phone,
            SessionKey::Email => &mut self.email,
            SessionKey::UserId => &mut self.user_id,
            SessionKey::UnitId => &mut self.unit_id,
            SessionKey::TenantId => &mut self.tenant_id,
            SessionKey::TenantTenantId => &mut self.tenant_tenant_id,
            SessionKey::FirstName => &mut self.first_name,
            SessionKey::LastName => &mut self.last_name,
            SessionKey::Address => &mut self.address,
            SessionKey::TenantType => &mut self.tenant_type,
            SessionKey::PropertyId => &mut self.property_id,
            SessionKey::OccupancyId => &mut self.occupancy_id,
            SessionKey::SessionId => &mut self.session_id,
        }
    }

    /// The chat view is only reachable with a stored phone number.
    pub fn is_signed_in(&self) -> bool {
        self.phone.is_some()
    }
}
