//! Request routing.
//!
//! [`route`] maps a method and URI to a [`Route`]:
//!
//! | Path | Route |
//! |------|-------|
//! | `/_health`, `/health` | [`Route::Health`] |
//! | `/favicon.ico` | [`Route::Favicon`] |
//! | `/` | [`Route::ListBuckets`] |
//! | `/download/{bucket}/{key...}` | [`Route::Download`] |
//! | anything else | [`Route::ListObjects`] |
//!
//! Only `GET` is served. Paths are percent-decoded before they are handed on.

use http::{Method, StatusCode, Uri};
use percent_encoding::percent_decode_str;

/// Prefix of the object download route.
pub const DOWNLOAD_PREFIX: &str = "/download/";

/// A routed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Liveness probe.
    Health,
    /// Browser favicon probe; always answered with 404.
    Favicon,
    /// The bucket list page.
    ListBuckets,
    /// Stream one object.
    Download {
        /// Bucket holding the object.
        bucket: String,
        /// Decoded object key.
        key: String,
    },
    /// The object page for a bucket and prefix.
    ListObjects {
        /// Decoded URL path, resolved later into bucket and prefix.
        path: String,
        /// Whether `?refresh=true` asked to bypass the cache.
        refresh: bool,
    },
}

impl Route {
    /// Short name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Favicon => "favicon",
            Self::ListBuckets => "list_buckets",
            Self::Download { .. } => "download",
            Self::ListObjects { .. } => "list_objects",
        }
    }
}

/// Why a request could not be routed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// Anything but `GET`.
    #[error("method {0} is not allowed")]
    MethodNotAllowed(Method),

    /// The path is malformed.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl RouteError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Map `method` and `uri` to a route.
///
/// # Errors
///
/// Returns [`RouteError::MethodNotAllowed`] for non-`GET` requests and
/// [`RouteError::BadRequest`] for a download path without a bucket and key
/// or with a path that is not valid UTF-8 once decoded.
///
/// # Examples
///
/// ```
/// use http::{Method, Uri};
/// use rustack_browse_http::router::{Route, route};
///
/// let uri: Uri = "/photos/2024%20trip/?refresh=true".parse().unwrap();
/// assert_eq!(
///     route(&Method::GET, &uri),
///     Ok(Route::ListObjects {
///         path: "/photos/2024 trip/".to_owned(),
///         refresh: true,
///     })
/// );
/// ```
pub fn route(method: &Method, uri: &Uri) -> Result<Route, RouteError> {
    if *method != Method::GET {
        return Err(RouteError::MethodNotAllowed(method.clone()));
    }

    let path = uri.path();
    match path {
        "/_health" | "/health" => return Ok(Route::Health),
        "/favicon.ico" => return Ok(Route::Favicon),
        "/" | "" => return Ok(Route::ListBuckets),
        _ => {}
    }

    if let Some(rest) = path.strip_prefix(DOWNLOAD_PREFIX) {
        let (bucket, key) = rest
            .split_once('/')
            .filter(|(bucket, key)| !bucket.is_empty() && !key.is_empty())
            .ok_or_else(|| {
                RouteError::BadRequest(format!(
                    "download path must look like {DOWNLOAD_PREFIX}{{bucket}}/{{key}}, got {path:?}"
                ))
            })?;
        return Ok(Route::Download {
            bucket: decode_uri_component(bucket)?,
            key: decode_uri_component(key)?,
        });
    }

    Ok(Route::ListObjects {
        path: decode_uri_component(path)?,
        refresh: wants_refresh(uri.query()),
    })
}

/// Whether the first `refresh` query parameter is `true`.
fn wants_refresh(query: Option<&str>) -> bool {
    query
        .and_then(|q| form_urlencoded::parse(q.as_bytes()).find(|(name, _)| name == "refresh"))
        .is_some_and(|(_, value)| value == "true")
}

/// Percent-decode a path component.
fn decode_uri_component(s: &str) -> Result<String, RouteError> {
    percent_decode_str(s)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .map_err(|_| RouteError::BadRequest(format!("path is not valid UTF-8: {s:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(uri: &str) -> Result<Route, RouteError> {
        let uri: Uri = uri.parse().expect("valid uri");
        route(&Method::GET, &uri)
    }

    #[test]
    fn test_should_route_fixed_paths() {
        assert_eq!(get("/"), Ok(Route::ListBuckets));
        assert_eq!(get("/_health"), Ok(Route::Health));
        assert_eq!(get("/health"), Ok(Route::Health));
        assert_eq!(get("/favicon.ico"), Ok(Route::Favicon));
    }

    #[test]
    fn test_should_route_download_with_nested_key() {
        assert_eq!(
            get("/download/photos/2024/jan/img%201.jpg"),
            Ok(Route::Download {
                bucket: "photos".to_owned(),
                key: "2024/jan/img 1.jpg".to_owned(),
            })
        );
    }

    #[test]
    fn test_should_keep_plus_sign_in_download_key() {
        assert_eq!(
            get("/download/b/a+b.txt"),
            Ok(Route::Download {
                bucket: "b".to_owned(),
                key: "a+b.txt".to_owned(),
            })
        );
    }

    #[test]
    fn test_should_reject_download_without_key() {
        assert!(matches!(
            get("/download/photos/"),
            Err(RouteError::BadRequest(_))
        ));
        assert!(matches!(
            get("/download/photos"),
            Err(RouteError::BadRequest(_))
        ));
    }

    #[test]
    fn test_should_route_object_listing() {
        assert_eq!(
            get("/photos/2024/"),
            Ok(Route::ListObjects {
                path: "/photos/2024/".to_owned(),
                refresh: false,
            })
        );
    }

    #[test]
    fn test_should_detect_refresh_flag() {
        let refresh = |uri| match get(uri) {
            Ok(Route::ListObjects { refresh, .. }) => refresh,
            other => panic!("unexpected route: {other:?}"),
        };
        assert!(refresh("/b/dir/?refresh=true"));
        assert!(refresh("/b/dir/?x=1&refresh=true"));
        assert!(!refresh("/b/dir/?refresh=false"));
        assert!(!refresh("/b/dir/?refresh"));
        assert!(!refresh("/b/dir/"));
    }

    #[test]
    fn test_should_read_only_first_refresh_value() {
        let refresh = |uri| match get(uri) {
            Ok(Route::ListObjects { refresh, .. }) => refresh,
            other => panic!("unexpected route: {other:?}"),
        };
        assert!(!refresh("/b/dir/?refresh=false&refresh=true"));
        assert!(refresh("/b/dir/?refresh=true&refresh=false"));
    }

    #[test]
    fn test_should_reject_non_get_methods() {
        let uri: Uri = "/photos/".parse().expect("valid uri");
        let err = route(&Method::POST, &uri).unwrap_err();
        assert_eq!(err, RouteError::MethodNotAllowed(Method::POST));
        assert_eq!(err.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_should_reject_invalid_utf8() {
        let err = get("/bucket/%FF").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_should_name_routes() {
        assert_eq!(Route::Health.name(), "health");
        assert_eq!(
            Route::ListObjects {
                path: "/".to_owned(),
                refresh: false
            }
            .name(),
            "list_objects"
        );
    }
}
