// Session storage backends

use super::types::SessionRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Companion entry holding the last-activity timestamp. Not namespaced by
/// storage key.
pub const LAST_ACTIVITY_KEY: &str = "lastActivity";

/// Trait for session-scoped key/value persistence of the gate session.
///
/// Implementations hold exactly two string entries per gate: the
/// authenticated flag under the configured storage key ("true" or absent)
/// and the last-activity timestamp under [`LAST_ACTIVITY_KEY`] (epoch
/// millis as a string, or absent). No operation can fail; an absent or
/// unparseable entry reads as "not authenticated, no prior activity".
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read the session pair; absent values read as `false` / `0`
    async fn read(&self, key: &str) -> SessionRecord;

    /// Write an authenticated session with the given activity timestamp.
    /// Both entries are set together.
    async fn write(&self, key: &str, last_activity_ms: i64);

    /// Remove both entries
    async fn clear(&self, key: &str);
}

/// In-memory session store
///
/// Stores the same raw string layout a browser-backed implementation
/// would hold in session storage.
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Raw entry lookup, for tests and debugging
    pub async fn raw(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().await;
        entries.get(key).cloned()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn read(&self, key: &str) -> SessionRecord {
        let entries = self.entries.read().await;

        let authenticated = entries.get(key).map(String::as_str) == Some("true");
        let last_activity_ms = entries
            .get(LAST_ACTIVITY_KEY)
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0);

        SessionRecord {
            authenticated,
            last_activity_ms,
        }
    }

    async fn write(&self, key: &str, last_activity_ms: i64) {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), "true".to_string());
        entries.insert(LAST_ACTIVITY_KEY.to_string(), last_activity_ms.to_string());
        debug!("Wrote session under '{}' at {}", key, last_activity_ms);
    }

    async fn clear(&self, key: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        entries.remove(LAST_ACTIVITY_KEY);
        debug!("Cleared session under '{}'", key);
    }
}
