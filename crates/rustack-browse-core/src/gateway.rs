//! The remote storage capability consumed by the browsing service.
//!
//! # Object safety
//!
//! The service holds the gateway as `Arc<dyn StorageGateway>` so the
//! production AWS adapter and the in-memory store are interchangeable. The
//! trait therefore uses `#[async_trait]`.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::model::{BucketRecord, ListingPage, ObjectBody};

/// Delimiter used for every listing: one directory level at a time.
pub const DELIMITER: &str = "/";

/// Remote object storage, reduced to the calls needed for browsing.
#[async_trait]
pub trait StorageGateway: Send + Sync + std::fmt::Debug + 'static {
    /// List every bucket visible to the configured credentials.
    async fn list_buckets(&self) -> Result<Vec<BucketRecord>, GatewayError>;

    /// List one page of `bucket` under `prefix`, grouping deeper keys into
    /// common prefixes at `delimiter`.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
    ) -> Result<ListingPage, GatewayError>;

    /// Fetch the body of `key` in `bucket`.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, GatewayError>;
}
