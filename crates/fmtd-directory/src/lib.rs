//! Directory client for fmtd service discovery.
//!
//! The directory is an external namespaced key/value store with per-key TTL
//! (an etcd-style lease store). Workers create and refresh their own entry;
//! dispatchers only ever read. Entries whose lease expires disappear on their
//! own, which is how a crashed or partitioned worker stops being discovered.
//!
//! Two backends implement the [`Directory`] trait:
//!
//! - [`EtcdDirectory`]: talks to a real etcd server over its v2 HTTP API.
//! - [`MemoryDirectory`]: in-process store with real lease expiry, used by
//!   tests and single-process setups.

pub mod etcd;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use fmtd_common::protocol::error::Result;

pub use etcd::EtcdDirectory;
pub use memory::MemoryDirectory;

/// Default namespace prefix under which workers register.
pub const DEFAULT_NAMESPACE: &str = "/workers/";

/// One live registration visible in a directory snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Full key, namespace prefix included.
    pub key: String,
    /// The worker's `host:port` address.
    pub value: String,
}

/// The lease-store operations fmtd needs.
///
/// `put` creates or refreshes a key with a TTL; `get` resolves one exact key;
/// `list` returns a point-in-time snapshot of the direct children of a
/// namespace prefix (non-recursive: the namespace itself is a folder, not a
/// value). No delete: removal happens only through lease expiry.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn list(&self, prefix: &str) -> Result<Vec<DirectoryEntry>>;
}
