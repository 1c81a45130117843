//! Durable remote write queue
//!
//! Every remote write is journaled to a pending file on disk before any
//! network I/O, then a background drain pushes the records oldest-first and
//! deletes each file only after the remote store has acknowledged it. A
//! crash or an offline stretch therefore loses nothing: whatever is still
//! in the pending directory is retried on the next drain.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::session::SessionContext;
use crate::storage::local::write_json_atomic;
use crate::storage::remote::RemoteStore;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// One journaled remote write
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PendingWrite {
    key: String,
    value: Value,
    queued_at: DateTime<Utc>,
}

/// Journal of remote writes awaiting acknowledgement
pub struct WriteQueue {
    dir: PathBuf,
    remote: Arc<dyn RemoteStore>,
    session: Arc<SessionContext>,
    next_seq: AtomicU64,
    notify: Notify,
    /// Count of journaled-but-unacknowledged records per key
    pending_keys: StdMutex<HashMap<String, usize>>,
}

impl WriteQueue {
    /// Open the queue rooted at a pending directory
    ///
    /// Records left behind by a previous run are picked up; new records are
    /// numbered after them so drain order stays oldest-first across
    /// restarts.
    pub fn new(
        dir: impl Into<PathBuf>,
        remote: Arc<dyn RemoteStore>,
        session: Arc<SessionContext>,
    ) -> LedgerResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            LedgerError::Storage(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        // Pick up records left by a previous run: continue the numbering and
        // rebuild the per-key pending counts. Unparseable leftovers are
        // ignored here; the drain quarantines them.
        let mut highest = 0;
        let mut pending_keys: HashMap<String, usize> = HashMap::new();
        for path in pending_paths(&dir)? {
            if let Some(seq) = sequence_of(&path) {
                highest = highest.max(seq);
            }
            if let Ok(record) = read_record(&path) {
                *pending_keys.entry(record.key).or_default() += 1;
            }
        }

        Ok(Self {
            dir,
            remote,
            session,
            next_seq: AtomicU64::new(highest + 1),
            notify: Notify::new(),
            pending_keys: StdMutex::new(pending_keys),
        })
    }

    /// Journal a write and wake the drain
    pub fn enqueue(&self, key: &str, value: &Value) -> LedgerResult<()> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let record = PendingWrite {
            key: key.to_string(),
            value: value.clone(),
            queued_at: Utc::now(),
        };
        write_json_atomic(&self.dir.join(format!("{:020}.json", seq)), &record)?;
        self.adjust_pending(key, 1);
        debug!(key, seq, "queued remote write");
        self.notify.notify_one();
        Ok(())
    }

    /// Whether a journaled write for this key has not yet been acknowledged
    ///
    /// While this is true the local copy of the key is ahead of the remote
    /// one, so remote reads must not be mirrored over it.
    pub fn has_pending(&self, key: &str) -> bool {
        self.pending_keys
            .lock()
            .map(|keys| keys.get(key).copied().unwrap_or(0) > 0)
            .unwrap_or(true)
    }

    fn adjust_pending(&self, key: &str, delta: i64) {
        if let Ok(mut keys) = self.pending_keys.lock() {
            let entry = keys.entry(key.to_string()).or_default();
            *entry = (*entry as i64 + delta).max(0) as usize;
            if *entry == 0 {
                keys.remove(key);
            }
        }
    }

    /// Number of journaled writes not yet acknowledged
    pub fn pending_count(&self) -> LedgerResult<usize> {
        Ok(pending_paths(&self.dir)?.len())
    }

    /// Push journaled writes oldest-first until the journal is empty or a
    /// push fails
    ///
    /// Returns the number of records flushed. An expired token is refreshed
    /// once before the record is declared unpushable for this pass. A record
    /// that cannot be read or parsed is quarantined (renamed aside) rather
    /// than wedging every later record behind it.
    pub async fn drain_once(&self) -> LedgerResult<usize> {
        let mut flushed = 0;
        for path in pending_paths(&self.dir)? {
            let record = match read_record(&path) {
                Ok(record) => record,
                Err(err) => {
                    warn!(path = %path.display(), %err, "quarantining bad pending record");
                    self.quarantine(&path)?;
                    continue;
                }
            };

            self.push(&record).await?;

            std::fs::remove_file(&path).map_err(|e| {
                LedgerError::Storage(format!("Failed to remove {}: {}", path.display(), e))
            })?;
            self.adjust_pending(&record.key, -1);
            flushed += 1;
        }
        Ok(flushed)
    }

    fn quarantine(&self, path: &Path) -> LedgerResult<()> {
        let aside = path.with_extension("corrupt");
        std::fs::rename(path, &aside).map_err(|e| {
            LedgerError::Storage(format!("Failed to quarantine {}: {}", path.display(), e))
        })
    }

    async fn push(&self, record: &PendingWrite) -> LedgerResult<()> {
        match self.remote.put(&record.key, &record.value).await {
            Err(LedgerError::AuthExpired) => {
                debug!(key = %record.key, "access token expired, refreshing");
                self.session.refresh_access_token().await?;
                self.remote.put(&record.key, &record.value).await
            }
            other => other,
        }
    }

    /// Drain forever, backing off exponentially while the remote is down
    ///
    /// Intended to be spawned once per queue; wakes on [`enqueue`] and on a
    /// periodic timer so records queued while offline still go out.
    ///
    /// [`enqueue`]: WriteQueue::enqueue
    pub async fn run(self: Arc<Self>) {
        let mut backoff = INITIAL_BACKOFF;
        loop {
            match self.drain_once().await {
                Ok(flushed) => {
                    if flushed > 0 {
                        debug!(flushed, "drained remote write queue");
                    }
                    backoff = INITIAL_BACKOFF;
                    tokio::select! {
                        _ = self.notify.notified() => {}
                        _ = tokio::time::sleep(MAX_BACKOFF) => {}
                    }
                }
                Err(err) => {
                    warn!(%err, retry_in = ?backoff, "remote write failed, will retry");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }
    }
}

/// Journal files in drain order (oldest first)
fn pending_paths(dir: &std::path::Path) -> LedgerResult<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| LedgerError::Storage(format!("Failed to list {}: {}", dir.display(), e)))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map_or(false, |ext| ext == "json"))
        .collect();
    paths.sort();
    Ok(paths)
}

fn sequence_of(path: &std::path::Path) -> Option<u64> {
    path.file_stem()?.to_str()?.parse().ok()
}

fn read_record(path: &Path) -> LedgerResult<PendingWrite> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| LedgerError::Storage(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&contents).map_err(|e| {
        LedgerError::Storage(format!("Corrupt pending record {}: {}", path.display(), e))
    })
}
