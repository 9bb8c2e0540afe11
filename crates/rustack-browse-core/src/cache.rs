//! Time-to-live cache of listing pages.
//!
//! [`ListingCache`] maps a (bucket, prefix) [`CacheKey`] to the raw
//! [`ListingPage`] fetched for it and the moment that page expires. The cache
//! does not judge freshness on read: [`ListingCache::get`] returns stale
//! entries too, so the caller can tell a fresh hit from an expired one and
//! report it. Expired entries leave the map only through
//! [`ListingCache::sweep`], an explicit [`ListingCache::invalidate`], or an
//! overwrite.
//!
//! All access goes through one `parking_lot::Mutex`. No method makes a remote
//! call or awaits while holding it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::model::ListingPage;
use crate::utils::normalize_prefix;

/// Identifies one listing scope: `bucket + "/" + normalized prefix`.
///
/// # Examples
///
/// ```
/// use rustack_browse_core::cache::CacheKey;
///
/// assert_eq!(CacheKey::new("photos", "2024").as_str(), "photos/2024/");
/// assert_eq!(CacheKey::new("photos", "2024/"), CacheKey::new("photos", "2024"));
/// assert_eq!(CacheKey::new("photos", "").as_str(), "photos/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build the key for `bucket` and `prefix`, normalizing the prefix first.
    #[must_use]
    pub fn new(bucket: &str, prefix: &str) -> Self {
        Self(format!("{bucket}/{}", normalize_prefix(prefix)))
    }

    /// The key as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A cached listing page and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The scope this entry answers for.
    pub key: CacheKey,
    /// The raw page as fetched from the store, shared with readers.
    pub payload: Arc<ListingPage>,
    /// The instant after which the entry must not be served.
    pub expiry: DateTime<Utc>,
}

impl CacheEntry {
    /// Whether the entry may still be served at `now`.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expiry > now
    }
}

/// In-memory listing cache with per-entry expiry.
pub struct ListingCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for ListingCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListingCache")
            .field("entry_count", &self.entries.lock().len())
            .field("clock", &self.clock)
            .finish()
    }
}

impl Default for ListingCache {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl ListingCache {
    /// Create an empty cache reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// The current time according to this cache's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Return the entry for `key`, fresh or not.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.lock().get(key).cloned()
    }

    /// Store `payload` under `key`, replacing any existing entry, expiring `ttl` from now.
    ///
    /// Returns the stored entry.
    pub fn put(&self, key: CacheKey, payload: Arc<ListingPage>, ttl: Duration) -> CacheEntry {
        let expiry = expiry_after(self.clock.now(), ttl);
        let entry = CacheEntry {
            key: key.clone(),
            payload,
            expiry,
        };
        self.entries.lock().insert(key, entry.clone());
        entry
    }

    /// Drop the entry for `key`, if any.
    pub fn invalidate(&self, key: &CacheKey) {
        if self.entries.lock().remove(key).is_some() {
            debug!(key = %key, "invalidated listing cache entry");
        }
    }

    /// Remove every entry that expired strictly before `now`.
    ///
    /// Returns how many entries were removed.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.expiry >= now);
        before - entries.len()
    }

    /// Number of entries, fresh or stale.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// `now + ttl`, saturating at the largest representable instant.
fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
