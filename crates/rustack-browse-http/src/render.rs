//! HTML rendering for the bucket list, object, and error pages.
//!
//! Pages are assembled from plain strings. Every piece of user or store
//! supplied text goes through [`escape_html`], and every link path through
//! [`encode_path`].

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rustack_browse_core::utils::normalize_prefix;
use rustack_browse_core::{BucketRecord, CacheStatus, ObjectListing, ResolvedPath, StorageObject};

use crate::router::DOWNLOAD_PREFIX;

/// Characters left as-is in link paths: unreserved characters and `/`.
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Characters left as-is in a single path segment: unreserved characters.
const SEGMENT_ENCODE_SET: &AsciiSet = &PATH_ENCODE_SET.add(b'/');

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

const STYLE: &str = "body{font-family:sans-serif;margin:2em}\
table{border-collapse:collapse}\
td,th{padding:.25em 1em;text-align:left}\
tr:nth-child(even){background:#f4f4f4}\
.meta{color:#666}";

/// Everything the object page shows.
#[derive(Debug, Clone, Copy)]
pub struct ObjectPage<'a> {
    /// Title shown on every page.
    pub site_name: &'a str,
    /// The resolved URL path.
    pub path: &'a ResolvedPath,
    /// The listing to show.
    pub listing: &'a ObjectListing,
    /// The listing time-to-live, used to tell when a cached listing was fetched.
    pub ttl: Duration,
}

/// Escape text for use in HTML content and attribute values.
///
/// # Examples
///
/// ```
/// use rustack_browse_http::render::escape_html;
///
/// assert_eq!(escape_html("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
/// ```
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Percent-encode a path, keeping `/` separators.
///
/// # Examples
///
/// ```
/// use rustack_browse_http::render::encode_path;
///
/// assert_eq!(encode_path("2024/my file#1.txt"), "2024/my%20file%231.txt");
/// ```
#[must_use]
pub fn encode_path(s: &str) -> String {
    utf8_percent_encode(s, PATH_ENCODE_SET).to_string()
}

/// Percent-encode a single path segment, `/` included.
#[must_use]
pub fn encode_segment(s: &str) -> String {
    utf8_percent_encode(s, SEGMENT_ENCODE_SET).to_string()
}

/// Render the bucket list page.
#[must_use]
pub fn render_buckets(site_name: &str, buckets: &[BucketRecord]) -> String {
    let rows: String = buckets
        .iter()
        .map(|bucket| {
            format!(
                "<tr><td><a href=\"/{href}/\">{name}</a></td><td>{created}</td></tr>\n",
                href = encode_segment(&bucket.name),
                name = escape_html(&bucket.name),
                created = bucket.creation_date.format(TIME_FORMAT),
            )
        })
        .collect();

    let body = format!(
        "<h2>Buckets</h2>\n\
         <table>\n<tr><th>Name</th><th>Created</th></tr>\n{rows}</table>\n\
         <p class=\"meta\">{count} bucket(s)</p>\n",
        count = buckets.len(),
    );
    layout(site_name, "Buckets", &body)
}

/// Render the object page for one bucket and prefix.
#[must_use]
pub fn render_objects(page: &ObjectPage<'_>) -> String {
    let bucket = &page.path.bucket;
    let prefix = normalize_prefix(&page.path.prefix);
    let current = format!("/{}/{}", encode_segment(bucket), encode_path(&prefix));

    let rows: String = page
        .listing
        .objects
        .iter()
        .map(|object| object_row(bucket, object))
        .collect();

    let body = format!(
        "<h2>{title}</h2>\n\
         <p><a href=\"{parent}\">&larr; Parent</a> | <a href=\"{current}?refresh=true\">Refresh</a></p>\n\
         <p class=\"meta\">{status}</p>\n\
         <table>\n<tr><th>Name</th><th>Size</th><th>Last modified</th></tr>\n{rows}</table>\n",
        title = escape_html(&format!("{bucket}/{prefix}")),
        parent = escape_html(&parent_href(page.path)),
        current = escape_html(&current),
        status = escape_html(&cache_status_line(page.listing, page.ttl)),
    );
    layout(page.site_name, &format!("{bucket}/{prefix}"), &body)
}

/// Render an error page. `path` adds a link back to the failed location's parent.
#[must_use]
pub fn render_error(site_name: &str, message: &str, path: Option<&ResolvedPath>) -> String {
    let back = path.map_or_else(|| "/".to_owned(), parent_href);
    let body = format!(
        "<h2>Error</h2>\n<pre>{message}</pre>\n<p><a href=\"{back}\">&larr; Back</a></p>\n",
        message = escape_html(message),
        back = escape_html(&back),
    );
    layout(site_name, "Error", &body)
}

fn layout(site_name: &str, title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title} - {site}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <h1><a href=\"/\">{site}</a></h1>\n{body}</body>\n</html>\n",
        title = escape_html(title),
        site = escape_html(site_name),
    )
}

fn object_row(bucket: &str, object: &StorageObject) -> String {
    let href = if object.is_directory {
        format!("/{}/{}", encode_segment(bucket), encode_path(&object.name))
    } else {
        format!(
            "{DOWNLOAD_PREFIX}{}/{}",
            encode_segment(bucket),
            encode_path(&object.name)
        )
    };
    let modified = object
        .last_modified
        .map(|t| t.format(TIME_FORMAT).to_string())
        .unwrap_or_default();

    format!(
        "<tr><td><a href=\"{href}\">{name}</a></td><td>{size}</td><td>{modified}</td></tr>\n",
        href = escape_html(&href),
        name = escape_html(&object.short_name),
        size = escape_html(object.size.as_deref().unwrap_or("-")),
    )
}

/// Link to the parent location: the bucket list when at a bucket's root.
fn parent_href(path: &ResolvedPath) -> String {
    if path.prefix.is_empty() {
        "/".to_owned()
    } else {
        format!(
            "/{}/{}",
            encode_segment(&path.bucket),
            encode_path(&normalize_prefix(&path.parent_prefix))
        )
    }
}

fn cache_status_line(listing: &ObjectListing, ttl: Duration) -> String {
    match (listing.cache_status, listing.cache_expiry) {
        (CacheStatus::Hit, Some(expiry)) => match cached_at(expiry, ttl) {
            Some(at) => format!(
                "Served from cache, cached at {} (expires {})",
                at.format(TIME_FORMAT),
                expiry.format(TIME_FORMAT)
            ),
            None => format!("Served from cache (expires {})", expiry.format(TIME_FORMAT)),
        },
        (CacheStatus::Hit, None) => "Served from cache".to_owned(),
        (CacheStatus::Miss, _) => "Fetched from storage".to_owned(),
    }
}

/// When a listing expiring at `expiry` was stored: `expiry - ttl`.
fn cached_at(expiry: DateTime<Utc>, ttl: Duration) -> Option<DateTime<Utc>> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|delta| expiry.checked_sub_signed(delta))
}
