//! Error types for browsing.
//!
//! [`GatewayError`] describes why a remote storage call failed.
//! [`BrowseError`] wraps it with the bucket, prefix, or key the caller asked
//! for, so the message shown to the user always names what failed.
//!
//! # Usage
//!
//! ```
//! use rustack_browse_core::error::{BrowseError, GatewayError};
//!
//! let err = BrowseError::ListObjects {
//!     bucket: "photos".to_owned(),
//!     prefix: "2024/".to_owned(),
//!     source: GatewayError::AccessDenied,
//! };
//! assert!(err.to_string().contains("\"photos\""));
//! ```

/// Failure reported by a [`StorageGateway`](crate::gateway::StorageGateway).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The bucket does not exist.
    #[error("the specified bucket does not exist: {bucket}")]
    NoSuchBucket {
        /// The missing bucket.
        bucket: String,
    },

    /// The key does not exist.
    #[error("the specified key does not exist: {key}")]
    NoSuchKey {
        /// The missing key.
        key: String,
    },

    /// The credentials in use may not perform the call.
    #[error("access denied")]
    AccessDenied,

    /// The store answered with an error code.
    #[error("{code}: {message}")]
    Service {
        /// Error code reported by the store.
        code: String,
        /// Error message reported by the store.
        message: String,
    },

    /// The call never got an answer (connection, timeout, credentials loading).
    #[error("transport error: {0}")]
    Transport(String),
}

impl GatewayError {
    /// Whether the failure means the requested resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoSuchBucket { .. } | Self::NoSuchKey { .. })
    }
}

/// Browsing error with the identifiers of the failed call attached.
#[derive(Debug, thiserror::Error)]
pub enum BrowseError {
    /// Enumerating buckets failed.
    #[error("ListBuckets operation failed: {source}")]
    ListBuckets {
        /// Underlying cause.
        source: GatewayError,
    },

    /// Listing a prefix failed.
    #[error("ListObjectsV2 operation failed for bucket {bucket:?} prefix {prefix:?}: {source}")]
    ListObjects {
        /// The bucket being listed.
        bucket: String,
        /// The normalized prefix being listed.
        prefix: String,
        /// Underlying cause.
        source: GatewayError,
    },

    /// Fetching an object failed.
    #[error("GetObject failed for bucket {bucket:?} key {key:?}: {source}")]
    GetObject {
        /// The bucket holding the object.
        bucket: String,
        /// The object key.
        key: String,
        /// Underlying cause.
        source: GatewayError,
    },
}

impl BrowseError {
    /// The gateway failure behind this error.
    #[must_use]
    pub fn gateway_error(&self) -> &GatewayError {
        match self {
            Self::ListBuckets { source }
            | Self::ListObjects { source, .. }
            | Self::GetObject { source, .. } => source,
        }
    }
}

/// Convenience result type for browsing operations.
pub type BrowseResult<T> = Result<T, BrowseError>;
