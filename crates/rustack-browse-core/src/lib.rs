//! Core of Rustack Browse: a file-tree view over object-storage buckets.
//!
//! This crate holds everything that is not HTTP plumbing:
//!
//! - **Path resolution** ([`path`]): turns a URL path into a bucket, parent
//!   prefix, and prefix.
//! - **Listing cache** ([`cache`]): a per-(bucket, prefix) TTL cache in front of
//!   the remote listing call, with explicit invalidation and sweeping.
//! - **Storage gateway** ([`gateway`]): the three remote operations the core
//!   needs, plus an in-memory implementation ([`memory`]).
//! - **Browsing service** ([`service`]): coordinates the above and reports
//!   cache hits and expiry to the presentation layer.
//!
//! # Architecture
//!
//! ```text
//! URL path
//!   -> resolve_path (bucket, parent prefix, prefix)
//!   -> BrowseService::list_objects
//!        -> ListingCache (hit: serve cached page)
//!        -> StorageGateway::list_objects (miss: fetch, then cache)
//!   <- ObjectListing (entries, cache status, expiry)
//! ```

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod model;
pub mod path;
pub mod service;
pub mod utils;

pub use cache::{CacheEntry, CacheKey, ListingCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BrowseConfig, RejectedSetting};
pub use error::{BrowseError, BrowseResult, GatewayError};
pub use gateway::StorageGateway;
pub use memory::InMemoryGateway;
pub use model::{BucketRecord, CacheStatus, ListingPage, ObjectBody, ObjectListing, StorageObject};
pub use path::{ResolvedPath, resolve_path};
pub use service::BrowseService;
pub use utils::format_size;
