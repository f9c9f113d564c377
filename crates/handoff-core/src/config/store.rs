//! Session and identity store configuration.

use serde::{Deserialize, Serialize};

/// Storage backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Storage backend type.
    #[serde(default)]
    pub backend: StoreBackend,

    /// SQLite database file (for the sqlite backend).
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            sqlite_path: default_sqlite_path(),
        }
    }
}

/// Storage backend type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local maps; sessions vanish on restart.
    #[default]
    Memory,
    /// SQLite file via sqlx.
    Sqlite,
}

fn default_sqlite_path() -> String {
    "data/handoff.sqlite".to_string()
}
