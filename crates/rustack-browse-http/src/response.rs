//! Response construction and error-to-status mapping.
//!
//! Status mapping for browsing failures:
//!
//! | Cause | Status |
//! |-------|--------|
//! | no such bucket / key | `404` |
//! | access denied | `403` |
//! | other remote failure | `502` |
//!
//! Routing failures use [`RouteError::status_code`].

use http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use http::{Response, StatusCode};
use mime::Mime;
use rustack_browse_core::{BrowseError, GatewayError, ObjectBody, ResolvedPath};

use crate::body::BrowseResponseBody;
use crate::render::{encode_segment, render_error};
use crate::router::RouteError;

/// Header value for a MIME type.
fn content_type(mime: &Mime) -> HeaderValue {
    HeaderValue::from_str(mime.as_ref())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
}

/// HTTP status for a browsing failure.
#[must_use]
pub fn status_for(err: &BrowseError) -> StatusCode {
    match err.gateway_error() {
        source if source.is_not_found() => StatusCode::NOT_FOUND,
        GatewayError::AccessDenied => StatusCode::FORBIDDEN,
        _ => StatusCode::BAD_GATEWAY,
    }
}

/// An HTML page response.
#[must_use]
pub fn html_response(status: StatusCode, html: String) -> Response<BrowseResponseBody> {
    let mut response = Response::new(BrowseResponseBody::from_string(html));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, content_type(&mime::TEXT_HTML_UTF_8));
    response
}

/// Render a browsing failure as an error page.
#[must_use]
pub fn error_to_response(
    err: &BrowseError,
    site_name: &str,
    path: Option<&ResolvedPath>,
) -> Response<BrowseResponseBody> {
    html_response(
        status_for(err),
        render_error(site_name, &err.to_string(), path),
    )
}

/// Render a routing failure as an error page.
#[must_use]
pub fn route_error_to_response(err: &RouteError, site_name: &str) -> Response<BrowseResponseBody> {
    let mut response = html_response(err.status_code(), render_error(site_name, &err.to_string(), None));
    if matches!(err, RouteError::MethodNotAllowed(_)) {
        response
            .headers_mut()
            .insert(http::header::ALLOW, HeaderValue::from_static("GET"));
    }
    response
}

/// Produce a health check response.
#[must_use]
pub fn health_check_response() -> Response<BrowseResponseBody> {
    let mut response = Response::new(BrowseResponseBody::from_string(
        r#"{"status":"running","service":"browse"}"#,
    ));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, content_type(&mime::APPLICATION_JSON));
    response
}

/// The favicon probe: `404` with no body.
#[must_use]
pub fn favicon_response() -> Response<BrowseResponseBody> {
    let mut response = Response::new(BrowseResponseBody::empty());
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

/// Stream an object body as an attachment named after the key's last segment.
#[must_use]
pub fn download_response(key: &str, body: ObjectBody) -> Response<BrowseResponseBody> {
    let content_length = body.content_length.and_then(|len| u64::try_from(len).ok());
    let mut response = Response::new(BrowseResponseBody::from_object(body));
    let headers = response.headers_mut();

    headers.insert(CONTENT_TYPE, content_type(&mime::APPLICATION_OCTET_STREAM));
    if let Some(len) = content_length {
        headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
    }
    let file_name = key.rsplit('/').next().unwrap_or(key);
    let disposition = format!("attachment; filename*=UTF-8''{}", encode_segment(file_name));
    if let Ok(hv) = HeaderValue::from_str(&disposition) {
        headers.insert(CONTENT_DISPOSITION, hv);
    }

    response
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use rustack_browse_core::resolve_path;

    use super::*;

    fn list_error(source: GatewayError) -> BrowseError {
        BrowseError::ListObjects {
            bucket: "b".to_owned(),
            prefix: "p/".to_owned(),
            source,
        }
    }

    #[test]
    fn test_should_map_errors_to_status_codes() {
        assert_eq!(
            status_for(&list_error(GatewayError::NoSuchBucket {
                bucket: "b".to_owned()
            })),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&list_error(GatewayError::AccessDenied)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(&list_error(GatewayError::Transport("timeout".to_owned()))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&BrowseError::GetObject {
                bucket: "b".to_owned(),
                key: "k".to_owned(),
                source: GatewayError::NoSuchKey {
                    key: "k".to_owned()
                },
            }),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_should_render_error_page_with_message() {
        let path = resolve_path("/b/p");
        let resp = error_to_response(&list_error(GatewayError::AccessDenied), "site", Some(&path));
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            resp.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("text/html; charset=utf-8")
        );

        let body = resp.into_body().collect().await.expect("collect").to_bytes();
        let html = String::from_utf8(body.to_vec()).expect("utf-8");
        assert!(html.contains("ListObjectsV2 operation failed for bucket &quot;b&quot;"));
    }

    #[test]
    fn test_should_set_allow_header_on_405() {
        let resp = route_error_to_response(&RouteError::MethodNotAllowed(http::Method::PUT), "site");
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            resp.headers().get(http::header::ALLOW).and_then(|v| v.to_str().ok()),
            Some("GET")
        );
    }

    #[test]
    fn test_should_produce_health_check_response() {
        let resp = health_check_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("application/json"),
        );
    }

    #[test]
    fn test_should_answer_favicon_with_empty_404() {
        use http_body::Body;

        let resp = favicon_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(resp.body().is_end_stream());
    }

    #[tokio::test]
    async fn test_should_stream_download_as_attachment() {
        let resp = download_response("2024/jan/my photo.jpg", ObjectBody::from_bytes("jpeg"));
        assert_eq!(resp.status(), StatusCode::OK);
        let header = |name: http::header::HeaderName| {
            resp.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        assert_eq!(
            header(CONTENT_TYPE).as_deref(),
            Some("application/octet-stream")
        );
        assert_eq!(header(CONTENT_LENGTH).as_deref(), Some("4"));
        assert_eq!(
            header(CONTENT_DISPOSITION).as_deref(),
            Some("attachment; filename*=UTF-8''my%20photo.jpg")
        );

        let body = resp.into_body().collect().await.expect("collect").to_bytes();
        assert_eq!(body.as_ref(), b"jpeg");
    }
}
