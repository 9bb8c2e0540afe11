//! HTTP layer for Rustack Browse: routing, HTML rendering, and hyper service.
//!
//! - **Routing** ([`router`]): maps a `GET` request to the bucket list, an
//!   object listing, a download, or a probe.
//! - **Rendering** ([`render`]): builds the HTML pages, escaping every piece
//!   of store-supplied text.
//! - **Responses** ([`response`]): status mapping for browsing failures and
//!   the response builders for each route.
//! - **Service** ([`service`]): the [`BrowseHttpService`](service::BrowseHttpService)
//!   implementing hyper's `Service` trait.
//! - **Body** ([`body`]): the [`BrowseResponseBody`](body::BrowseResponseBody)
//!   type supporting buffered, streaming, and empty responses.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> BrowseHttpService (hyper Service)
//!     -> route (health / favicon / buckets / download / listing)
//!     -> BrowseService (listing cache + storage gateway)
//!     -> render (HTML page or error page)
//!     -> Common response headers (x-request-id, Server)
//!   <- HTTP Response
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use rustack_browse_core::{BrowseConfig, BrowseService, InMemoryGateway};
//! use rustack_browse_http::service::{BrowseHttpConfig, BrowseHttpService};
//!
//! let config = BrowseConfig::default();
//! let service = BrowseService::from_config(Arc::new(InMemoryGateway::new()), &config);
//! let http = BrowseHttpService::new(Arc::new(service), BrowseHttpConfig::from(&config));
//! // Use `http` with a hyper server.
//! ```

pub mod body;
pub mod render;
pub mod response;
pub mod router;
pub mod service;

pub use body::BrowseResponseBody;
pub use router::{Route, RouteError};
pub use service::{BrowseHttpConfig, BrowseHttpService};
