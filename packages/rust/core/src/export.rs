//! Saving a diagnosis summary to disk, the terminal stand-in for "Copy".

use std::path::{Path, PathBuf};

use chrono::Local;
use tenantchat_shared::{Result, TenantChatError};
use tracing::info;

/// Write `text` to `dir/diagnosis-summary-<timestamp>.txt`, creating `dir`
/// if needed. Returns the file path.
pub fn export_summary(dir: &Path, text: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| TenantChatError::io(dir, e))?;
    let stamp = Local::now().format("%Y%m%d-%H%M%S%.3f");
    let path = dir.join(format!("diagnosis-summary-{stamp}.txt"));
    std::fs::write(&path, text).map_err(|e| TenantChatError::io(&path, e))?;
    info!(path = %path.display(), "diagnosis summary saved");
    Ok(path)
}
