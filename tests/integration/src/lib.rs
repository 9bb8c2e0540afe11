//! Integration tests for the Rustack Browse server.
//!
//! These tests need two running services: an S3-compatible store at
//! `S3_ENDPOINT_URL` (default `http://localhost:4566`) and a browse server
//! pointed at it at `BROWSE_ENDPOINT_URL` (default `http://localhost:1323`).
//! They are marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p rustack-browse-integration -- --ignored
//! ```

use std::sync::Once;

use aws_credential_types::Credentials;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use aws_sdk_s3::primitives::ByteStream;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL of the storage the browse server reads from.
fn s3_endpoint_url() -> String {
    std::env::var("S3_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:4566".to_owned())
}

/// Base URL of the browse server.
#[must_use]
pub fn browse_url(path: &str) -> String {
    let base =
        std::env::var("BROWSE_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:1323".to_owned());
    format!("{}{path}", base.trim_end_matches('/'))
}

/// Create a configured S3 client pointing at the storage endpoint.
#[must_use]
pub fn s3_client() -> aws_sdk_s3::Client {
    init_tracing();

    let creds = Credentials::new("test", "test", None, None, "integration-test");

    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(creds)
        .endpoint_url(s3_endpoint_url())
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(config)
}

/// Generate a unique bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Create a bucket holding `keys` (each with its key as content) and return its name.
pub async fn create_seeded_bucket(client: &aws_sdk_s3::Client, prefix: &str, keys: &[&str]) -> String {
    let name = test_bucket_name(prefix);
    client
        .create_bucket()
        .bucket(&name)
        .send()
        .await
        .unwrap_or_else(|e| panic!("failed to create bucket {name}: {e}"));
    for key in keys {
        put_object(client, &name, key, key.as_bytes()).await;
    }
    name
}

/// Upload one object.
pub async fn put_object(client: &aws_sdk_s3::Client, bucket: &str, key: &str, body: &[u8]) {
    client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(body.to_vec()))
        .send()
        .await
        .unwrap_or_else(|e| panic!("put {key}: {e}"));
}

/// Delete all objects in a bucket, then delete the bucket.
pub async fn cleanup_bucket(client: &aws_sdk_s3::Client, bucket: &str) {
    let Ok(resp) = client.list_objects_v2().bucket(bucket).send().await else {
        return;
    };
    for obj in resp.contents() {
        if let Some(key) = obj.key() {
            let _ = client.delete_object().bucket(bucket).key(key).send().await;
        }
    }
    let _ = client.delete_bucket().bucket(bucket).send().await;
}

/// A fetched page: status code and body text.
#[derive(Debug)]
pub struct Page {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
    /// Response headers.
    pub headers: reqwest::header::HeaderMap,
}

/// GET `path` from the browse server.
pub async fn fetch(path: &str) -> anyhow::Result<Page> {
    let resp = reqwest::get(browse_url(path)).await?;
    let status = resp.status().as_u16();
    let headers = resp.headers().clone();
    let body = resp.text().await?;
    Ok(Page {
        status,
        body,
        headers,
    })
}

mod test_browse;
mod test_download;
