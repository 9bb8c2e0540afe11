//! The browse HTTP service implementing hyper's `Service` trait.
//!
//! [`BrowseHttpService`] ties routing, the browsing service, and HTML
//! rendering into a single hyper-compatible service. For each request it:
//!
//! 1. Routes the method and path via [`route`]
//! 2. Answers health and favicon probes directly
//! 3. Calls the [`BrowseService`] for buckets, listings, or object bodies
//! 4. Renders the page or error page
//! 5. Adds common response headers (`x-request-id`, `Server`)
//! 6. Emits one `access log` event

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use http::StatusCode;
use http::header::HeaderValue;
use hyper::body::Incoming;
use hyper::service::Service;
use rustack_browse_core::{BrowseConfig, BrowseService, CacheStatus, resolve_path};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::body::BrowseResponseBody;
use crate::render::{ObjectPage, render_buckets, render_objects};
use crate::response::{
    download_response, error_to_response, favicon_response, health_check_response, html_response,
    route_error_to_response,
};
use crate::router::{Route, route};

/// Server header value.
pub const SERVER_NAME: &str = "RustackBrowse";

/// Configuration for the browse HTTP service.
#[derive(Debug, Clone)]
pub struct BrowseHttpConfig {
    /// Title shown on every page.
    pub site_name: String,
}

impl Default for BrowseHttpConfig {
    fn default() -> Self {
        Self {
            site_name: "rustack-browse".to_owned(),
        }
    }
}

impl From<&BrowseConfig> for BrowseHttpConfig {
    fn from(config: &BrowseConfig) -> Self {
        Self {
            site_name: config.site_name.clone(),
        }
    }
}

/// Cache outcome of a listing request, reported in the access log.
#[derive(Debug, Clone, Copy)]
struct CacheReport {
    status: CacheStatus,
    expiry: Option<DateTime<Utc>>,
}

/// The browse HTTP service that implements hyper's `Service` trait.
#[derive(Debug, Clone)]
pub struct BrowseHttpService {
    service: Arc<BrowseService>,
    config: Arc<BrowseHttpConfig>,
}

impl BrowseHttpService {
    /// Create a new HTTP service over `service`.
    #[must_use]
    pub fn new(service: Arc<BrowseService>, config: BrowseHttpConfig) -> Self {
        Self {
            service,
            config: Arc::new(config),
        }
    }

    /// Handle one request, identified by its head.
    ///
    /// Requests are `GET` only, so the body is never read.
    pub async fn handle(&self, parts: &http::request::Parts) -> http::Response<BrowseResponseBody> {
        let started = Instant::now();
        let request_id = Uuid::new_v4().to_string();

        let (response, cache) = self.process_request(parts, &request_id).await;
        let response = add_common_headers(response, &request_id);

        let expiry = cache.and_then(|c| c.expiry).map(|e| e.to_rfc3339());
        info!(
            method = %parts.method,
            uri = %parts.uri,
            status = response.status().as_u16(),
            latency = ?started.elapsed(),
            request_id = %request_id,
            hit_cache = cache.map(|c| c.status.is_hit()),
            cache_expire = expiry.as_deref(),
            "access log"
        );

        response
    }

    async fn process_request(
        &self,
        parts: &http::request::Parts,
        request_id: &str,
    ) -> (http::Response<BrowseResponseBody>, Option<CacheReport>) {
        let site_name = &self.config.site_name;

        let route = match route(&parts.method, &parts.uri) {
            Ok(route) => route,
            Err(err) => {
                warn!(method = %parts.method, uri = %parts.uri, error = %err, request_id, "failed to route request");
                return (route_error_to_response(&err, site_name), None);
            }
        };
        debug!(route = route.name(), request_id, "routed request");

        match route {
            Route::Health => (health_check_response(), None),
            Route::Favicon => (favicon_response(), None),
            Route::ListBuckets => {
                let response = match self.service.list_buckets().await {
                    Ok(buckets) => html_response(StatusCode::OK, render_buckets(site_name, &buckets)),
                    Err(err) => error_to_response(&err, site_name, None),
                };
                (response, None)
            }
            Route::Download { bucket, key } => {
                let response = match self.service.get_object(&bucket, &key).await {
                    Ok(body) => download_response(&key, body),
                    Err(err) => error_to_response(&err, site_name, None),
                };
                (response, None)
            }
            Route::ListObjects { path, refresh } => {
                let resolved = resolve_path(&path);
                match self
                    .service
                    .list_objects(&resolved.bucket, &resolved.prefix, refresh)
                    .await
                {
                    Ok(listing) => {
                        let report = CacheReport {
                            status: listing.cache_status,
                            expiry: listing.cache_expiry,
                        };
                        let html = render_objects(&ObjectPage {
                            site_name,
                            path: &resolved,
                            listing: &listing,
                            ttl: self.service.ttl(),
                        });
                        (html_response(StatusCode::OK, html), Some(report))
                    }
                    Err(err) => {
                        let report = CacheReport {
                            status: CacheStatus::Miss,
                            expiry: None,
                        };
                        (error_to_response(&err, site_name, Some(&resolved)), Some(report))
                    }
                }
            }
        }
    }
}

impl Service<http::Request<Incoming>> for BrowseHttpService {
    type Response = http::Response<BrowseResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            drop(body);
            Ok(service.handle(&parts).await)
        })
    }
}

/// Add common response headers to every response.
fn add_common_headers(
    mut response: http::Response<BrowseResponseBody>,
    request_id: &str,
) -> http::Response<BrowseResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = HeaderValue::from_str(request_id) {
        headers.insert("x-request-id", hv);
    }
    headers.insert(http::header::SERVER, HeaderValue::from_static(SERVER_NAME));

    response
}
