use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use fmtd_common::protocol::error::{FmtdError, Result};
use fmtd_directory::Directory;

/// Collision-avoidance bound for name generation. A collision between two
/// 64-bit random names is the astronomically rare case; hitting this bound
/// means the directory is returning pathological data, and startup should
/// fail rather than spin.
const MAX_NAME_ATTEMPTS: u32 = 32;

/// Configuration for one worker's registration.
#[derive(Debug, Clone)]
pub struct RegistrationConfig {
    /// Namespace prefix the entry lives under, e.g. `/workers/`.
    pub namespace: String,
    /// Externally reachable `host:port` of this worker.
    pub address: String,
    /// How often the entry is republished.
    pub period: Duration,
    /// Entry TTL. Defaults to the announcement period; operators can raise
    /// it so one missed refresh does not make the worker undiscoverable.
    pub lease: Duration,
}

impl RegistrationConfig {
    pub fn new(namespace: impl Into<String>, address: impl Into<String>, period: Duration) -> Self {
        Self {
            namespace: namespace.into(),
            address: address.into(),
            period,
            lease: period,
        }
    }

    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }
}

/// Publishes and refreshes this worker's directory entry.
///
/// The agent owns its entry's whole lifecycle: it creates the entry at
/// startup and refreshes it (same name, same address, lease reset) on every
/// tick. It never deletes the entry; expiry after a crash is the directory's
/// job. The refresh loop runs for the lifetime of the process and is never
/// cancelled.
pub struct RegistrationAgent {
    directory: Arc<dyn Directory>,
    config: RegistrationConfig,
    name: String,
}

impl RegistrationAgent {
    /// Picks a name unique under the namespace and returns an agent ready to
    /// spawn.
    ///
    /// Nothing is published yet; the first tick of the refresh loop does
    /// that, so a directory outage at startup only delays discoverability.
    pub async fn new(directory: Arc<dyn Directory>, config: RegistrationConfig) -> Result<Self> {
        let name = pick_name(directory.as_ref(), &config.namespace).await?;
        info!(%name, address = %config.address, "registering worker");

        Ok(Self {
            directory,
            config,
            name,
        })
    }

    /// The full directory key this worker registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Starts the refresh loop as a background task.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Announce loop. The first tick fires immediately, so the worker is
    /// discoverable as soon as the directory accepts the publish.
    async fn run(self) {
        let mut interval = tokio::time::interval(self.config.period);

        loop {
            interval.tick().await;
            self.announce_once().await;
        }
    }

    /// One publish. A failure is logged and swallowed: a missed refresh only
    /// risks the entry expiring until the next successful tick.
    pub async fn announce_once(&self) {
        if let Err(e) = self
            .directory
            .put(&self.name, &self.config.address, self.config.lease)
            .await
        {
            warn!(name = %self.name, error = %e, "failed to announce to directory");
        }
    }
}

/// Generates `namespace/<random u64>` names until one is not already present.
///
/// A directory error during the existence check is treated as "absent": the
/// check exists for the extremely-rare random collision, and refusing to
/// start because the directory is briefly unreachable would be worse than
/// skipping it.
async fn pick_name(directory: &dyn Directory, namespace: &str) -> Result<String> {
    for _ in 0..MAX_NAME_ATTEMPTS {
        let candidate = format!("{}{}", namespace, rand::thread_rng().gen::<u64>());

        let taken = matches!(directory.get(&candidate).await, Ok(Some(_)));
        if !taken {
            return Ok(candidate);
        }

        warn!(name = %candidate, "worker name already taken (unlikely)");
    }

    Err(FmtdError::NameExhausted)
}
