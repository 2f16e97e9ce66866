//! libSQL-backed session storage (local, offline).
//!
//! The [`Storage`] struct wraps a libSQL database holding the tenant's
//! identity as flat key-value pairs. There is no schema over the values:
//! any key may be absent, and values are opaque strings.
//!
//! **Access rules:**
//! - CLI / TUI: read-write via [`Storage::open`]
//! - `whoami`: read-only via [`Storage::open_readonly`]

mod migrations;

use std::path::Path;

use chrono::Utc;
use libsql::{Connection, Database, params};
use tenantchat_shared::{Result, TenantChatError};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TenantChatError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| TenantChatError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| TenantChatError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open a database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| TenantChatError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| TenantChatError::Storage(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        TenantChatError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(TenantChatError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Key-value operations
    // -----------------------------------------------------------------------

    /// Read one value.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM session_kv WHERE key = ?1", params![key])
            .await
            .map_err(|e| TenantChatError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(
                row.get::<String>(0)
                    .map_err(|e| TenantChatError::Storage(e.to_string()))?,
            )),
            Ok(None) => Ok(None),
            Err(e) => Err(TenantChatError::Storage(e.to_string())),
        }
    }

    /// Write one value, replacing any previous one.
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO session_kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at",
                params![key, value, now.as_str()],
            )
            .await
            .map_err(|e| TenantChatError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Delete one key. Deleting a missing key is not an error.
    pub async fn remove(&self, key: &str) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute("DELETE FROM session_kv WHERE key = ?1", params![key])
            .await
            .map_err(|e| TenantChatError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Delete several keys in one transaction.
    pub async fn remove_many(&self, keys: &[&str]) -> Result<()> {
        self.check_writable()?;
        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| TenantChatError::Storage(e.to_string()))?;
        for key in keys {
            tx.execute("DELETE FROM session_kv WHERE key = ?1", params![*key])
                .await
                .map_err(|e| TenantChatError::Storage(e.to_string()))?;
        }
        tx.commit()
            .await
            .map_err(|e| TenantChatError::Storage(e.to_string()))?;
        Ok(())
    }

    /// All stored pairs, ordered by key.
    pub async fn entries(&self) -> Result<Vec<(String, String)>> {
        let mut rows = self
            .conn
            .query("SELECT key, value FROM session_kv ORDER BY key", params![])
            .await
            .map_err(|e| TenantChatError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| TenantChatError::Storage(e.to_string()))?
        {
            results.push((
                row.get::<String>(0)
                    .map_err(|e| TenantChatError::Storage(e.to_string()))?,
                row.get::<String>(1)
                    .map_err(|e| TenantChatError::Storage(e.to_string()))?,
            ));
        }
        Ok(results)
    }
}
