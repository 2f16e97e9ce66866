//! Typed access to the persisted tenant identity.

use tenantchat_shared::{Result, SessionConfig, SessionId, SessionKey, TenantSession};
use tenantchat_storage::Storage;
use tracing::{debug, info};

/// Session key-value store. Every read goes to the database so the caller
/// always sees what the last flow wrote.
pub struct SessionStore {
    storage: Storage,
}

impl SessionStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Open the database named in `[session]`.
    pub async fn open(config: &SessionConfig) -> Result<Self> {
        let path = config.resolved_db_path()?;
        debug!(path = %path.display(), "opening session store");
        Ok(Self::new(Storage::open(&path).await?))
    }

    /// Open for inspection only. A missing database reads as an empty
    /// session instead of being created.
    pub async fn open_readonly(config: &SessionConfig) -> Result<Option<Self>> {
        let path = config.resolved_db_path()?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(Self::new(Storage::open_readonly(&path).await?)))
    }

    /// Snapshot of every stored key.
    pub async fn load(&self) -> Result<TenantSession> {
        let entries = self.storage.entries().await?;
        Ok(TenantSession::from_entries(entries))
    }

    pub async fn get(&self, key: SessionKey) -> Result<Option<String>> {
        self.storage.get(key.as_str()).await
    }

    pub async fn set(&self, key: SessionKey, value: &str) -> Result<()> {
        self.storage.set(key.as_str(), value).await
    }

    /// Store `value` when present; an absent value leaves the key untouched.
    pub async fn set_opt(&self, key: SessionKey, value: Option<&str>) -> Result<()> {
        match value {
            Some(v) => self.set(key, v).await,
            None => Ok(()),
        }
    }

    /// Signed in means a phone number is on file.
    pub async fn is_signed_in(&self) -> Result<bool> {
        Ok(self.get(SessionKey::Phone).await?.is_some())
    }

    /// Remove every session key.
    pub async fn logout(&self) -> Result<()> {
        let keys: Vec<&str> = SessionKey::ALL.iter().map(|k| k.as_str()).collect();
        self.storage.remove_many(&keys).await?;
        info!("session cleared");
        Ok(())
    }

    /// Mint a chat session id and persist it.
    pub async fn new_session_id(&self) -> Result<SessionId> {
        let id = SessionId::new();
        self.set(SessionKey::SessionId, id.as_str()).await?;
        debug!(session_id = %id, "new chat session");
        Ok(id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use uuid::Uuid;

    pub(crate) async fn temp_store() -> SessionStore {
        let tmp = std::env::temp_dir().join(format!("tc_test_{}.db", Uuid::now_v7()));
        SessionStore::new(Storage::open(&tmp).await.expect("open test db"))
    }

    #[tokio::test]
    async fn readonly_open_of_missing_db_is_empty() {
        let tmp = std::env::temp_dir().join(format!("tc_missing_{}.db", Uuid::now_v7()));
        let config = SessionConfig {
            db_path: tmp.display().to_string(),
        };
        assert!(SessionStore::open_readonly(&config).await.unwrap().is_none());
        assert!(!tmp.exists());
    }

    #[tokio::test]
    async fn load_reflects_latest_writes() {
        let store = temp_store().await;
        store.set(SessionKey::Name, "Ada").await.unwrap();
        store.set_opt(SessionKey::Email, None).await.unwrap();
        store
            .set_opt(SessionKey::UnitId, Some("U-1"))
            .await
            .unwrap();

        let session = store.load().await.unwrap();
        assert_eq!(session.name.as_deref(), Some("Ada"));
        assert_eq!(session.unit_id.as_deref(), Some("U-1"));
        assert!(session.email.is_none());
    }

    #[tokio::test]
    async fn logout_clears_every_key() {
        let store = temp_store().await;
        for key in SessionKey::ALL {
            store.set(key, "x").await.unwrap();
        }
        assert!(store.is_signed_in().await.unwrap());

        store.logout().await.unwrap();
        assert_eq!(store.load().await.unwrap(), TenantSession::default());
        assert!(!store.is_signed_in().await.unwrap());
    }

    #[tokio::test]
    async fn new_session_id_is_persisted() {
        let store = temp_store().await;
        let id = store.new_session_id().await.unwrap();
        assert!(id.as_str().starts_with("sess_"));
        assert_eq!(
            store.get(SessionKey::SessionId).await.unwrap().as_deref(),
            Some(id.as_str())
        );
    }
}
