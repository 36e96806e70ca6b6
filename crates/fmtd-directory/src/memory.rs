use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use fmtd_common::protocol::error::Result;

use crate::{Directory, DirectoryEntry};

/// In-process directory with real lease expiry.
///
/// Leases are enforced lazily: an entry whose deadline has passed is simply
/// invisible to `get` and `list`, which makes an expired entry
/// indistinguishable from a deleted one, matching the observable behavior of
/// the external store.
#[derive(Default)]
pub struct MemoryDirectory {
    entries: RwLock<HashMap<String, LeasedValue>>,
}

struct LeasedValue {
    value: String,
    expires_at: Instant,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently stored, lapsed ones included until the
    /// next `put` sweeps them.
    pub async fn stored_len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        // Writes are the only time the map can grow, so sweep lapsed leases
        // here; otherwise entries from long-gone workers pile up forever.
        entries.retain(|_, e| e.expires_at > now);
        entries.insert(
            key.to_string(),
            LeasedValue {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.value.clone()))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<DirectoryEntry>> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|(key, leased)| {
                leased.expires_at > now && is_direct_child(key, prefix)
            })
            .map(|(key, leased)| DirectoryEntry {
                key: key.clone(),
                value: leased.value.clone(),
            })
            .collect())
    }
}

/// Non-recursive folder semantics: `key` must extend `prefix` without
/// introducing another path segment.
fn is_direct_child(key: &str, prefix: &str) -> bool {
    match key.strip_prefix(prefix) {
        Some(rest) => !rest.is_empty() && !rest.contains('/'),
        None => false,
    }
}
