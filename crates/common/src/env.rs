//! Environment/runtime helpers
//!
//! Sanity checks to ensure the data directory exists at startup.

/// Ensure the parent directory of the store file exists.
pub async fn ensure_store_dir(store_path: &str) -> anyhow::Result<()> {
    if let Some(parent) = std::path::Path::new(store_path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
