//! In-memory [`StorageGateway`].
//!
//! [`InMemoryGateway`] keeps buckets and objects in sorted maps and answers
//! delimiter listings the way S3 does. It counts calls per operation and can
//! be told to fail, which makes it the gateway of choice for tests and local
//! demos.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::error::GatewayError;
use crate::gateway::StorageGateway;
use crate::model::{BucketRecord, ListingPage, ObjectBody, ObjectSummary};

#[derive(Debug)]
struct StoredObject {
    data: Bytes,
    last_modified: DateTime<Utc>,
}

#[derive(Debug)]
struct StoredBucket {
    creation_date: DateTime<Utc>,
    objects: BTreeMap<String, StoredObject>,
}

/// An object store held entirely in memory.
///
/// # Examples
///
/// ```
/// use rustack_browse_core::memory::InMemoryGateway;
///
/// let gateway = InMemoryGateway::new();
/// gateway.create_bucket("photos");
/// gateway.put_object("photos", "2024/jan/img1.jpg", "jpeg bytes");
/// assert_eq!(gateway.object_count("photos"), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    buckets: RwLock<BTreeMap<String, StoredBucket>>,
    failure: RwLock<Option<GatewayError>>,
    list_buckets_calls: AtomicUsize,
    list_objects_calls: AtomicUsize,
    get_object_calls: AtomicUsize,
}

impl InMemoryGateway {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bucket. Creating an existing bucket is a no-op.
    pub fn create_bucket(&self, name: &str) {
        self.buckets
            .write()
            .entry(name.to_owned())
            .or_insert_with(|| StoredBucket {
                creation_date: Utc::now(),
                objects: BTreeMap::new(),
            });
    }

    /// Store an object, creating the bucket if needed.
    pub fn put_object(&self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        self.create_bucket(bucket);
        let mut buckets = self.buckets.write();
        if let Some(stored) = buckets.get_mut(bucket) {
            stored.objects.insert(
                key.to_owned(),
                StoredObject {
                    data: data.into(),
                    last_modified: Utc::now(),
                },
            );
        }
    }

    /// Number of objects in `bucket` (zero if it does not exist).
    #[must_use]
    pub fn object_count(&self, bucket: &str) -> usize {
        self.buckets
            .read()
            .get(bucket)
            .map_or(0, |b| b.objects.len())
    }

    /// Make every following call fail with `failure`, or succeed again with `None`.
    pub fn set_failure(&self, failure: Option<GatewayError>) {
        *self.failure.write() = failure;
    }

    /// How many times `list_buckets` was called.
    #[must_use]
    pub fn list_buckets_calls(&self) -> usize {
        self.list_buckets_calls.load(Ordering::Relaxed)
    }

    /// How many times `list_objects` was called.
    #[must_use]
    pub fn list_objects_calls(&self) -> usize {
        self.list_objects_calls.load(Ordering::Relaxed)
    }

    /// How many times `get_object` was called.
    #[must_use]
    pub fn get_object_calls(&self) -> usize {
        self.get_object_calls.load(Ordering::Relaxed)
    }

    fn injected_failure(&self) -> Result<(), GatewayError> {
        match self.failure.read().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StorageGateway for InMemoryGateway {
    async fn list_buckets(&self) -> Result<Vec<BucketRecord>, GatewayError> {
        self.list_buckets_calls.fetch_add(1, Ordering::Relaxed);
        self.injected_failure()?;

        Ok(self
            .buckets
            .read()
            .iter()
            .map(|(name, bucket)| BucketRecord {
                name: name.clone(),
                creation_date: bucket.creation_date,
            })
            .collect())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
    ) -> Result<ListingPage, GatewayError> {
        self.list_objects_calls.fetch_add(1, Ordering::Relaxed);
        self.injected_failure()?;

        let buckets = self.buckets.read();
        let stored = buckets.get(bucket).ok_or_else(|| GatewayError::NoSuchBucket {
            bucket: bucket.to_owned(),
        })?;

        let mut page = ListingPage::default();
        for (key, object) in stored.objects.range(prefix.to_owned()..) {
            let Some(rest) = key.strip_prefix(prefix) else {
                break;
            };

            if !delimiter.is_empty() {
                if let Some(pos) = rest.find(delimiter) {
                    let common = format!("{prefix}{}", &rest[..pos + delimiter.len()]);
                    if page.common_prefixes.last() != Some(&common) {
                        page.common_prefixes.push(common);
                    }
                    continue;
                }
            }

            page.contents.push(ObjectSummary {
                key: key.clone(),
                size: i64::try_from(object.data.len()).unwrap_or(i64::MAX),
                last_modified: Some(object.last_modified),
            });
        }

        Ok(page)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, GatewayError> {
        self.get_object_calls.fetch_add(1, Ordering::Relaxed);
        self.injected_failure()?;

        let buckets = self.buckets.read();
        let stored = buckets.get(bucket).ok_or_else(|| GatewayError::NoSuchBucket {
            bucket: bucket.to_owned(),
        })?;
        let object = stored
            .objects
            .get(key)
            .ok_or_else(|| GatewayError::NoSuchKey {
                key: key.to_owned(),
            })?;

        Ok(ObjectBody::from_bytes(object.data.clone()))
    }
}
