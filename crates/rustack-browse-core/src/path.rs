//! URL path to storage address resolution.
//!
//! A browse URL looks like `/{bucket}/{dir}/{dir}`. [`resolve_path`] splits it
//! into the bucket, the prefix being viewed, and the prefix one level up (used
//! for the "parent directory" link).

use serde::Serialize;

/// A URL path resolved into a storage address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPath {
    /// The bucket name (first path segment).
    pub bucket: String,
    /// Every segment except the first and the last, joined with `/`.
    pub parent_prefix: String,
    /// Every segment except the first, joined with `/`.
    pub prefix: String,
}

/// Resolve a slash-delimited URL path into bucket, parent prefix, and prefix.
///
/// This never fails. Empty segments produced by doubled slashes are kept as-is
/// in the joined prefixes.
///
/// # Examples
///
/// ```
/// use rustack_browse_core::path::resolve_path;
///
/// let resolved = resolve_path("/my-bucket/dir1/dir2");
/// assert_eq!(resolved.bucket, "my-bucket");
/// assert_eq!(resolved.parent_prefix, "dir1");
/// assert_eq!(resolved.prefix, "dir1/dir2");
/// ```
#[must_use]
pub fn resolve_path(path: &str) -> ResolvedPath {
    let path = path.strip_prefix('/').unwrap_or(path);
    let parts: Vec<&str> = path.trim_matches('/').split('/').collect();

    let Some((bucket, rest)) = parts.split_first() else {
        return ResolvedPath::default();
    };

    let parent_prefix = match rest.split_last() {
        Some((_, parents)) => join_path(parents),
        None => String::new(),
    };

    ResolvedPath {
        bucket: (*bucket).to_owned(),
        parent_prefix,
        prefix: join_path(rest),
    }
}

/// Join path segments with `/`.
fn join_path(parts: &[&str]) -> String {
    parts.join("/")
}
