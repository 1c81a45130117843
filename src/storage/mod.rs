//! Persistence
//!
//! Records flow through three layers: an optional passphrase encryption
//! step, a local JSON store that is always written first, and an optional
//! remote key-value store fed through a durable write queue. Reads prefer
//! the remote copy and fall back to the local one when the network is out.

mod keys;
mod local;
mod lock;
mod queue;
mod remote;

pub use keys::StoreKey;
pub use local::{write_json_atomic, LocalStore};
pub use lock::{KeyLocks, LoadTracker};
pub use queue::WriteQueue;
pub use remote::{HttpRemoteStore, MemoryRemoteStore, RemoteStore};

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::crypto::EncryptedPackage;
use crate::error::{LedgerError, LedgerResult};
use crate::session::SessionContext;

/// Result of loading a record
///
/// Only genuinely unexpected conditions are errors; a missing record and a
/// locked session are ordinary states the caller branches on.
#[derive(Debug)]
pub enum LoadOutcome<T> {
    /// The record was found and decoded
    Loaded(T),
    /// The record is encrypted and no passphrase is configured
    Locked,
    /// No record exists under this key
    Absent,
    /// A later-started load already completed; discard this result
    Superseded,
}

impl<T> LoadOutcome<T> {
    /// The loaded value, if any
    pub fn into_loaded(self) -> Option<T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

/// Coordinated access to the local and remote stores
///
/// All reads and writes go through here: per-key locks serialize
/// read-modify-write cycles, the session supplies encryption and auth
/// state, and the write queue absorbs remote outages.
pub struct PersistenceAdapter {
    local: LocalStore,
    remote: Option<Arc<dyn RemoteStore>>,
    queue: Option<Arc<WriteQueue>>,
    session: Arc<SessionContext>,
    locks: KeyLocks,
    loads: LoadTracker,
}

impl PersistenceAdapter {
    /// An adapter that only touches the local store
    pub fn local_only(local: LocalStore, session: Arc<SessionContext>) -> Self {
        Self {
            local,
            remote: None,
            queue: None,
            session,
            locks: KeyLocks::new(),
            loads: LoadTracker::new(),
        }
    }

    /// An adapter backed by both stores
    ///
    /// The queue must wrap the same remote store; the adapter never calls
    /// `put` on the remote directly.
    pub fn with_remote(
        local: LocalStore,
        remote: Arc<dyn RemoteStore>,
        queue: Arc<WriteQueue>,
        session: Arc<SessionContext>,
    ) -> Self {
        Self {
            local,
            remote: Some(remote),
            queue: Some(queue),
            session,
            locks: KeyLocks::new(),
            loads: LoadTracker::new(),
        }
    }

    /// Save a record under a key
    ///
    /// The record is encrypted when the session holds a passphrase, written
    /// to the local store, and journaled for the remote store. Returns once
    /// the local write is durable; the remote push happens in the
    /// background.
    pub async fn save<T: Serialize>(&self, key: StoreKey, value: &T) -> LedgerResult<()> {
        let name = key.name();
        let _guard = self.locks.acquire(&name).await;

        let plaintext = serde_json::to_string(value)?;
        let record: Value = match self.session.encrypt_value(&plaintext)? {
            Some(package) => serde_json::to_value(&package)?,
            None => serde_json::from_str(&plaintext)?,
        };

        self.local.write(&name, &record)?;
        if let Some(queue) = &self.queue {
            queue.enqueue(&name, &record)?;
        }
        debug!(key = %name, "saved record");
        Ok(())
    }

    /// Load a record under a key
    ///
    /// Prefers the remote copy; a dead network degrades to the local copy
    /// with a warning. A wrong passphrase or corrupted ciphertext is an
    /// error, never [`LoadOutcome::Absent`].
    pub async fn load<T: DeserializeOwned>(&self, key: StoreKey) -> LedgerResult<LoadOutcome<T>> {
        let name = key.name();
        let seq = self.loads.begin(&name);

        let raw = self.fetch_raw(&name).await?;

        if !self.loads.complete(&name, seq) {
            debug!(key = %name, "discarding stale load");
            return Ok(LoadOutcome::Superseded);
        }

        let value = match raw {
            Some(value) => value,
            None => return Ok(LoadOutcome::Absent),
        };

        if EncryptedPackage::is_package(&value) {
            if !self.session.is_unlocked() {
                return Ok(LoadOutcome::Locked);
            }
            let package: EncryptedPackage =
                serde_json::from_value(value).map_err(|_| LedgerError::DecryptionFailed)?;
            let plaintext = self.session.decrypt_value(&package)?;
            let decoded = serde_json::from_str(&plaintext)?;
            Ok(LoadOutcome::Loaded(decoded))
        } else {
            let decoded = serde_json::from_value(value)?;
            Ok(LoadOutcome::Loaded(decoded))
        }
    }

    /// Fetch the raw record, remote-first
    async fn fetch_raw(&self, name: &str) -> LedgerResult<Option<Value>> {
        let remote = match &self.remote {
            Some(remote) => remote,
            None => return self.local.read(name),
        };

        match self.remote_get(remote, name).await {
            Ok(found) => {
                if let Some(value) = &found {
                    self.mirror_to_local(name, value).await?;
                }
                Ok(found)
            }
            Err(err) => {
                warn!(key = %name, %err, "remote read failed, using local copy");
                self.local.read(name)
            }
        }
    }

    /// Mirror a remote read into the local store so the offline fallback
    /// stays current
    ///
    /// Skipped while a journaled write for the key awaits acknowledgement:
    /// the local copy is then ahead of the remote one and mirroring would
    /// roll it back to the stale remote value. The per-key lock keeps the
    /// pending check and the write atomic against a concurrent save.
    async fn mirror_to_local(&self, name: &str, value: &Value) -> LedgerResult<()> {
        let _guard = self.locks.acquire(name).await;
        if self.queue.as_ref().map_or(false, |q| q.has_pending(name)) {
            debug!(key = %name, "skipping mirror, local copy is ahead of remote");
            return Ok(());
        }
        self.local.write(name, value)
    }

    /// Remote get with a single token refresh on auth expiry
    async fn remote_get(
        &self,
        remote: &Arc<dyn RemoteStore>,
        name: &str,
    ) -> LedgerResult<Option<Value>> {
        match remote.get(name).await {
            Err(LedgerError::AuthExpired) => {
                debug!(key = %name, "access token expired, refreshing");
                self.session
                    .refresh_access_token()
                    .await
                    .map_err(|e| LedgerError::RemoteUnavailable(e.to_string()))?;
                remote.get(name).await
            }
            other => other,
        }
    }
}
