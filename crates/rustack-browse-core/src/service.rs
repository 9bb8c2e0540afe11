//! The browsing service.
//!
//! [`BrowseService`] answers the two questions the UI asks (which buckets
//! exist, and what lives under a prefix) by combining the [`ListingCache`]
//! with a [`StorageGateway`]. It owns no state of its own beyond the sweep
//! throttle; the cache and gateway are injected.
//!
//! Listing a prefix also schedules a sweep of expired cache entries on the
//! tokio runtime. Sweeps are throttled to one per `sweep_interval` so a burst
//! of requests cannot pile up sweep tasks.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::cache::{CacheKey, ListingCache};
use crate::clock::SystemClock;
use crate::config::{BrowseConfig, DEFAULT_SWEEP_INTERVAL};
use crate::error::{BrowseError, BrowseResult};
use crate::gateway::{DELIMITER, StorageGateway};
use crate::model::{BucketRecord, CacheStatus, ObjectBody, ObjectListing};
use crate::utils::normalize_prefix;

/// Coordinates the listing cache and the storage gateway.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use rustack_browse_core::{BrowseService, CacheStatus, InMemoryGateway, ListingCache};
///
/// # tokio_test::block_on(async {
/// let gateway = Arc::new(InMemoryGateway::new());
/// gateway.put_object("photos", "2024/img1.jpg", "jpeg");
///
/// let service = BrowseService::new(
///     gateway,
///     Arc::new(ListingCache::default()),
///     Duration::from_secs(60),
/// );
///
/// let first = service.list_objects("photos", "", false).await.unwrap();
/// let second = service.list_objects("photos", "", false).await.unwrap();
/// assert_eq!(first.cache_status, CacheStatus::Miss);
/// assert_eq!(second.cache_status, CacheStatus::Hit);
/// # });
/// ```
#[derive(Debug)]
pub struct BrowseService {
    gateway: Arc<dyn StorageGateway>,
    cache: Arc<ListingCache>,
    ttl: Duration,
    sweep_interval: Duration,
    /// Millisecond timestamp of the last scheduled sweep.
    last_sweep_millis: AtomicI64,
}

impl BrowseService {
    /// Create a service caching listings for `ttl`.
    #[must_use]
    pub fn new(gateway: Arc<dyn StorageGateway>, cache: Arc<ListingCache>, ttl: Duration) -> Self {
        Self {
            gateway,
            cache,
            ttl,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            last_sweep_millis: AtomicI64::new(i64::MIN),
        }
    }

    /// Create a service on the system clock with TTL and sweep interval from `config`.
    #[must_use]
    pub fn from_config(gateway: Arc<dyn StorageGateway>, config: &BrowseConfig) -> Self {
        let cache = Arc::new(ListingCache::new(Arc::new(SystemClock)));
        Self::new(gateway, cache, config.cache_duration).with_sweep_interval(config.sweep_interval)
    }

    /// Set the minimum gap between two background sweeps.
    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// The listing time-to-live.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The listing cache.
    #[must_use]
    pub fn cache(&self) -> &ListingCache {
        &self.cache
    }

    /// List every bucket. Bucket lists are never cached.
    pub async fn list_buckets(&self) -> BrowseResult<Vec<BucketRecord>> {
        let buckets = self.gateway.list_buckets().await.map_err(|source| {
            warn!(error = %source, "failed to list buckets");
            BrowseError::ListBuckets { source }
        })?;
        debug!(count = buckets.len(), "listed buckets");
        Ok(buckets)
    }

    /// List the entries directly under `prefix` in `bucket`.
    ///
    /// The prefix is normalized to end with `/`. An unexpired cache entry
    /// answers without a remote call unless `force_refresh` is set, in which
    /// case the entry is dropped first. Failed remote calls are not cached.
    pub async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        force_refresh: bool,
    ) -> BrowseResult<ObjectListing> {
        let prefix = normalize_prefix(prefix);
        let key = CacheKey::new(bucket, &prefix);
        let now = self.cache.now();

        self.schedule_sweep(now);

        if force_refresh {
            self.cache.invalidate(&key);
        }

        if let Some(entry) = self.cache.get(&key).filter(|entry| entry.is_fresh(now)) {
            debug!(bucket, prefix = %prefix, expiry = %entry.expiry, "listing cache hit");
            return Ok(ObjectListing {
                objects: entry.payload.to_storage_objects(&prefix),
                cache_status: CacheStatus::Hit,
                cache_expiry: Some(entry.expiry),
            });
        }

        let page = self
            .gateway
            .list_objects(bucket, &prefix, DELIMITER)
            .await
            .map_err(|source| {
                warn!(bucket, prefix = %prefix, error = %source, "failed to list objects");
                BrowseError::ListObjects {
                    bucket: bucket.to_owned(),
                    prefix: prefix.clone(),
                    source,
                }
            })?;

        let entry = self.cache.put(key, Arc::new(page), self.ttl);
        debug!(
            bucket,
            prefix = %prefix,
            common_prefixes = entry.payload.common_prefixes.len(),
            contents = entry.payload.contents.len(),
            "listing cache miss, fetched from storage"
        );

        Ok(ObjectListing {
            objects: entry.payload.to_storage_objects(&prefix),
            cache_status: CacheStatus::Miss,
            cache_expiry: None,
        })
    }

    /// Fetch the body of `key` in `bucket`.
    pub async fn get_object(&self, bucket: &str, key: &str) -> BrowseResult<ObjectBody> {
        self.gateway.get_object(bucket, key).await.map_err(|source| {
            warn!(bucket, key, error = %source, "failed to get object");
            BrowseError::GetObject {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
                source,
            }
        })
    }

    /// Remove expired cache entries right away, returning how many were removed.
    pub fn sweep_expired(&self) -> usize {
        sweep(&self.cache, self.cache.now())
    }

    /// Sweep expired entries off the request path, at most once per interval.
    fn schedule_sweep(&self, now: DateTime<Utc>) {
        if !self.claim_sweep(now) {
            return;
        }

        let cache = Arc::clone(&self.cache);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    sweep(&cache, now);
                });
            }
            Err(_) => {
                sweep(&cache, now);
            }
        }
    }

    /// Whether a sweep may start at `now`; records `now` as the last sweep if so.
    fn claim_sweep(&self, now: DateTime<Utc>) -> bool {
        let now_millis = now.timestamp_millis();
        let interval_millis = i64::try_from(self.sweep_interval.as_millis()).unwrap_or(i64::MAX);
        let last = self.last_sweep_millis.load(Ordering::Acquire);

        if now_millis.saturating_sub(last) < interval_millis {
            return false;
        }

        self.last_sweep_millis
            .compare_exchange(last, now_millis, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

fn sweep(cache: &ListingCache, now: DateTime<Utc>) -> usize {
    let removed = cache.sweep(now);
    if removed > 0 {
        debug!(removed, remaining = cache.len(), "swept expired listing cache entries");
    }
    removed
}
