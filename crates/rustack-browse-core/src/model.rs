//! Data handed between the gateway, the cache, and the presentation layer.
//!
//! [`ListingPage`] is the raw single-page listing as returned by the remote
//! store and is what the cache keeps. [`StorageObject`] is the derived,
//! display-ready entry built from a page on every request.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use serde::Serialize;

use crate::utils::format_size;

/// A bucket as reported by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketRecord {
    /// Bucket name.
    pub name: String,
    /// When the bucket was created.
    pub creation_date: DateTime<Utc>,
}

/// One object entry of a raw listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSummary {
    /// Full object key.
    pub key: String,
    /// Object size in bytes.
    pub size: i64,
    /// Last modification time, if the store reported one.
    pub last_modified: Option<DateTime<Utc>>,
}

/// A single page of a delimiter listing, exactly as the remote store returned it.
///
/// Common prefixes are expected to come before contents; nothing here
/// re-sorts either list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
    /// Pseudo-directories one level below the queried prefix.
    pub common_prefixes: Vec<String>,
    /// Objects directly under the queried prefix.
    pub contents: Vec<ObjectSummary>,
}

impl ListingPage {
    /// Convert this page into display entries relative to `prefix`.
    ///
    /// Directories come first, then files, in the order the store returned
    /// them. A content entry whose key equals `prefix` is the directory
    /// marker object and is skipped.
    #[must_use]
    pub fn to_storage_objects(&self, prefix: &str) -> Vec<StorageObject> {
        let directories = self.common_prefixes.iter().map(|name| StorageObject {
            name: name.clone(),
            short_name: strip_prefix(name, prefix),
            is_directory: true,
            size: None,
            last_modified: None,
        });

        let files = self
            .contents
            .iter()
            .filter(|obj| obj.key != prefix)
            .map(|obj| StorageObject {
                name: obj.key.clone(),
                short_name: strip_prefix(&obj.key, prefix),
                is_directory: false,
                size: Some(format_size(obj.size)),
                last_modified: obj.last_modified,
            });

        directories.chain(files).collect()
    }
}

fn strip_prefix(name: &str, prefix: &str) -> String {
    name.strip_prefix(prefix).unwrap_or(name).to_owned()
}

/// A display-ready listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageObject {
    /// Full key (files) or prefix (directories).
    pub name: String,
    /// `name` with the queried prefix removed.
    pub short_name: String,
    /// Whether this entry is a common prefix rather than an object.
    pub is_directory: bool,
    /// Human-readable size; `None` for directories.
    pub size: Option<String>,
    /// Last modification time; `None` for directories.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Whether a listing was answered from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Served from an unexpired cache entry.
    Hit,
    /// Fetched from the remote store.
    Miss,
}

impl CacheStatus {
    /// Whether this is a cache hit.
    #[must_use]
    pub fn is_hit(self) -> bool {
        self == Self::Hit
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hit => f.write_str("hit"),
            Self::Miss => f.write_str("miss"),
        }
    }
}

/// The result of listing one prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectListing {
    /// Entries, directories first.
    pub objects: Vec<StorageObject>,
    /// Whether the cache answered.
    pub cache_status: CacheStatus,
    /// Expiry of the cache entry that answered; `None` on a miss.
    pub cache_expiry: Option<DateTime<Utc>>,
}

/// A streaming object body fetched from the remote store.
pub struct ObjectBody {
    /// Body length in bytes, if known.
    pub content_length: Option<i64>,
    /// The body chunks.
    pub stream: BoxStream<'static, std::io::Result<Bytes>>,
}

impl ObjectBody {
    /// Wrap an in-memory buffer as a single-chunk body.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let content_length = i64::try_from(data.len()).ok();
        Self {
            content_length,
            stream: stream::once(async move { Ok(data) }).boxed(),
        }
    }
}

impl fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBody")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(key: &str, size: i64) -> ObjectSummary {
        ObjectSummary {
            key: key.to_owned(),
            size,
            last_modified: None,
        }
    }

    #[test]
    fn test_should_convert_page_to_directories_then_files() {
        let page = ListingPage {
            common_prefixes: vec!["a/b/dir1/".to_owned(), "a/b/dir2/".to_owned()],
            contents: vec![summary("a/b/file1.txt", 1024)],
        };

        let objects = page.to_storage_objects("a/b/");

        assert_eq!(objects.len(), 3);
        assert_eq!(objects[0].short_name, "dir1/");
        assert!(objects[0].is_directory);
        assert_eq!(objects[0].size, None);
        assert_eq!(objects[1].short_name, "dir2/");
        assert!(objects[1].is_directory);
        assert_eq!(objects[2].name, "a/b/file1.txt");
        assert_eq!(objects[2].short_name, "file1.txt");
        assert!(!objects[2].is_directory);
        assert_eq!(objects[2].size.as_deref(), Some("1.0 KB"));
    }

    #[test]
    fn test_should_skip_directory_marker_object() {
        let page = ListingPage {
            common_prefixes: vec![],
            contents: vec![summary("docs/", 0), summary("docs/readme.md", 10)],
        };

        let objects = page.to_storage_objects("docs/");

        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].short_name, "readme.md");
    }

    #[test]
    fn test_should_keep_store_order_without_sorting() {
        let page = ListingPage {
            common_prefixes: vec!["z/".to_owned(), "a/".to_owned()],
            contents: vec![summary("b.txt", 1), summary("a.txt", 2)],
        };

        let names: Vec<_> = page
            .to_storage_objects("")
            .into_iter()
            .map(|o| o.short_name)
            .collect();

        assert_eq!(names, ["z/", "a/", "b.txt", "a.txt"]);
    }

    #[test]
    fn test_should_display_cache_status() {
        assert_eq!(CacheStatus::Hit.to_string(), "hit");
        assert_eq!(CacheStatus::Miss.to_string(), "miss");
        assert!(CacheStatus::Hit.is_hit());
        assert!(!CacheStatus::Miss.is_hit());
    }

    #[tokio::test]
    async fn test_should_stream_in_memory_body() {
        let body = ObjectBody::from_bytes("hello");
        assert_eq!(body.content_length, Some(5));

        let chunks: Vec<_> = body.stream.collect().await;
        assert_eq!(chunks.len(), 1);
        assert_eq!(
            chunks[0].as_ref().ok().map(|b| b.to_vec()),
            Some(b"hello".to_vec())
        );
    }
}
