//! `handoff sessions purge` - Delete expired sessions.

use chrono::Utc;
use handoff_core::{HandoffConfig, StoreBackend};
use handoff_session::{SessionManager, open_stores};

/// Purge expired sessions from the configured store.
pub async fn purge(config: &HandoffConfig) -> anyhow::Result<u64> {
    if config.store.backend == StoreBackend::Memory {
        println!("Store backend is memory; there is nothing persisted to purge.");
        return Ok(0);
    }

    let stores = open_stores(&config.store).await?;
    let manager = SessionManager::from_config(&stores, &config.session);
    let purged = manager.purge_expired(Utc::now()).await?;

    println!("✔ Purged {} expired session(s) from {}", purged, config.store.sqlite_path);
    Ok(purged)
}
