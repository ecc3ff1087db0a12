//! Post cache with time-to-live expiry.
//!
//! Posts are stored in a [`CacheStore`] namespace as versioned JSON
//! envelopes:
//!
//! ```json
//! {"version": 2, "post": {...}, "cachedAt": 1714557600000}
//! ```
//!
//! The cache itself never filters by age on read. Callers decide whether an
//! entry is still live with [`ContentCache::is_expired`], and
//! [`ContentCache::sweep_expired`] evicts in bulk.

mod store;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::post::Post;

pub use store::{CacheStore, FileStore, MemoryStore, StoreError};

/// Envelope version written by this crate.
pub const ENVELOPE_VERSION: u32 = 2;

/// Default time-to-live: three days.
pub const DEFAULT_TTL: Duration = Duration::from_millis(259_200_000);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("malformed cache envelope: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("cache envelope has no version tag")]
    Untagged,
    #[error("unsupported cache envelope version {0}")]
    UnsupportedVersion(u32),
    #[error("failed to encode cache envelope: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A cached post and the time it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub post: Post,
    /// Epoch milliseconds.
    pub cached_at: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeRef<'a> {
    version: u32,
    post: &'a Post,
    cached_at: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    post: Post,
    cached_at: u64,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: Option<u32>,
}

/// Serialize an entry into its stored form.
///
/// # Errors
/// Returns [`CacheError::Encode`] if serialization fails.
pub fn encode(entry: &CacheEntry) -> Result<String, CacheError> {
    serde_json::to_string(&EnvelopeRef {
        version: ENVELOPE_VERSION,
        post: &entry.post,
        cached_at: entry.cached_at,
    })
    .map_err(CacheError::Encode)
}

/// Parse a stored envelope.
///
/// # Errors
/// Returns [`CacheError::Malformed`] for anything that is not a well-formed
/// envelope, [`CacheError::Untagged`] for objects without a version (such as
/// first-generation entries that stored the bare post), and
/// [`CacheError::UnsupportedVersion`] for other versions.
pub fn decode(raw: &str) -> Result<CacheEntry, CacheError> {
    let probe: VersionProbe = serde_json::from_str(raw).map_err(CacheError::Malformed)?;
    match probe.version {
        Some(ENVELOPE_VERSION) => {
            let envelope: Envelope = serde_json::from_str(raw).map_err(CacheError::Malformed)?;
            Ok(CacheEntry {
                post: envelope.post,
                cached_at: envelope.cached_at,
            })
        }
        Some(other) => Err(CacheError::UnsupportedVersion(other)),
        None => Err(CacheError::Untagged),
    }
}

/// Source of the current time in epoch milliseconds.
pub trait Clock: fmt::Debug {
    fn now_millis(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, duration_millis)
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(now_millis: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now_millis)),
        }
    }

    pub fn set(&self, now_millis: u64) {
        self.now.store(now_millis, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(duration_millis(by), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Outcome of [`ContentCache::sweep_expired`].
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Keys evicted because their entry had expired.
    pub removed: Vec<String>,
    /// Number of live entries left in place.
    pub kept: usize,
    /// Keys left untouched because their value is not an envelope.
    pub skipped: Vec<(String, CacheError)>,
}

/// Post cache over a key-value namespace.
#[derive(Debug)]
pub struct ContentCache<S> {
    store: S,
    clock: Box<dyn Clock>,
}

impl<S: CacheStore> ContentCache<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }

    pub fn with_clock(store: S, clock: impl Clock + 'static) -> Self {
        Self {
            store,
            clock: Box::new(clock),
        }
    }

    /// Current time in epoch milliseconds, as the cache sees it.
    pub fn now(&self) -> u64 {
        self.clock.now_millis()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Look up `key` without any expiry check.
    ///
    /// Values that do not decode are logged and reported as absent.
    pub fn read(&self, key: &str) -> Option<CacheEntry> {
        let raw = self.store.get(key)?;
        match decode(&raw) {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(key, error = %err, "ignoring unreadable cache entry");
                None
            }
        }
    }

    /// Store `entry` under `key`, replacing whatever was there.
    ///
    /// # Errors
    /// Returns an error if the entry cannot be encoded or persisted.
    pub fn write(&mut self, key: &str, entry: &CacheEntry) -> Result<(), CacheError> {
        let raw = encode(entry)?;
        self.store.set(key, raw)?;
        Ok(())
    }

    /// Remove `key` if present.
    ///
    /// # Errors
    /// Returns an error if the namespace cannot be persisted.
    pub fn delete(&mut self, key: &str) -> Result<(), CacheError> {
        self.store.remove(key)?;
        Ok(())
    }

    /// Whether `entry` has reached `ttl` at the current time.
    ///
    /// An entry is expired once its age is at least `ttl`, so a zero TTL
    /// expires everything immediately.
    pub fn is_expired(&self, entry: &CacheEntry, ttl: Duration) -> bool {
        self.now().saturating_sub(entry.cached_at) >= duration_millis(ttl)
    }

    /// Evict every entry older than `ttl`.
    ///
    /// Values that fail to decode are left in place and listed in the
    /// report, since the namespace may be shared with other data.
    ///
    /// # Errors
    /// Returns an error if an eviction cannot be persisted.
    pub fn sweep_expired(&mut self, ttl: Duration) -> Result<SweepReport, CacheError> {
        let mut report = SweepReport::default();
        for key in self.store.keys() {
            let Some(raw) = self.store.get(&key) else {
                continue;
            };
            match decode(&raw) {
                Ok(entry) if self.is_expired(&entry, ttl) => {
                    self.store.remove(&key)?;
                    report.removed.push(key);
                }
                Ok(_) => report.kept += 1,
                Err(err) => {
                    tracing::debug!(key = %key, error = %err, "sweep skipped foreign entry");
                    report.skipped.push((key, err));
                }
            }
        }
        tracing::info!(
            removed = report.removed.len(),
            kept = report.kept,
            skipped = report.skipped.len(),
            "swept post cache"
        );
        Ok(report)
    }

    /// Remove every key in the namespace, including keys this cache did
    /// not write.
    ///
    /// # Errors
    /// Returns an error if the namespace cannot be persisted.
    pub fn clear_all(&mut self) -> Result<(), CacheError> {
        self.store.clear()?;
        Ok(())
    }
}
