//! [`StorageGateway`] backed by the AWS SDK.
//!
//! Works against AWS S3 and any S3-compatible store reachable through an
//! endpoint override (MinIO, LocalStack, `RustStack`). With an override the
//! client switches to path-style addressing.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use rustack_browse_core::{
    BrowseConfig, BucketRecord, GatewayError, ListingPage, ObjectBody, StorageGateway,
    model::ObjectSummary,
};
use tracing::debug;

/// Region used when neither the configuration nor the SDK provider chain supplies one.
const DEFAULT_REGION: &str = "us-east-1";

/// Storage gateway talking to S3 through `aws-sdk-s3`.
#[derive(Debug, Clone)]
pub struct AwsS3Gateway {
    client: Client,
}

impl AwsS3Gateway {
    /// Wrap an existing client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the region, profile, and endpoint in `config`.
    pub async fn from_config(config: &BrowseConfig) -> Self {
        let region = RegionProviderChain::first_try(config.aws_region.clone().map(Region::new))
            .or_default_provider()
            .or_else(Region::new(DEFAULT_REGION));

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);
        if let Some(profile) = &config.aws_profile {
            loader = loader.profile_name(profile);
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = config.endpoint_url() {
            debug!(endpoint = %endpoint, "using storage endpoint override with path-style addressing");
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self::new(Client::from_conf(builder.build()))
    }
}

#[async_trait]
impl StorageGateway for AwsS3Gateway {
    async fn list_buckets(&self) -> Result<Vec<BucketRecord>, GatewayError> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| map_sdk_error(e, "", ""))?;

        Ok(output
            .buckets()
            .iter()
            .map(|bucket| BucketRecord {
                name: bucket.name().unwrap_or_default().to_owned(),
                creation_date: bucket
                    .creation_date()
                    .and_then(to_chrono)
                    .unwrap_or(DateTime::UNIX_EPOCH),
            })
            .collect())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
    ) -> Result<ListingPage, GatewayError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_prefix((!prefix.is_empty()).then(|| prefix.to_owned()))
            .delimiter(delimiter)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, bucket, ""))?;

        Ok(ListingPage {
            common_prefixes: output
                .common_prefixes()
                .iter()
                .filter_map(|p| p.prefix().map(str::to_owned))
                .collect(),
            contents: output
                .contents()
                .iter()
                .filter_map(|object| {
                    Some(ObjectSummary {
                        key: object.key()?.to_owned(),
                        size: object.size().unwrap_or_default(),
                        last_modified: object.last_modified().and_then(to_chrono),
                    })
                })
                .collect(),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, GatewayError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, bucket, key))?;

        Ok(ObjectBody {
            content_length: output.content_length(),
            stream: byte_stream_chunks(output.body),
        })
    }
}

/// Adapt an SDK body into a stream of chunks, read as the client consumes them.
fn byte_stream_chunks(body: ByteStream) -> BoxStream<'static, std::io::Result<Bytes>> {
    stream::unfold(body, |mut body| async move {
        let chunk = body.next().await?;
        Some((chunk.map_err(std::io::Error::other), body))
    })
    .boxed()
}

fn to_chrono(dt: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

/// Turn an SDK failure into a [`GatewayError`], naming `bucket` and `key` when known.
fn map_sdk_error<E, R>(err: SdkError<E, R>, bucket: &str, key: &str) -> GatewayError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    match err.as_service_error() {
        Some(service_err) => classify_service_error(
            service_err.code().unwrap_or("Unknown"),
            service_err.message().unwrap_or_default(),
            bucket,
            key,
        ),
        None => GatewayError::Transport(DisplayErrorContext(&err).to_string()),
    }
}

fn classify_service_error(code: &str, message: &str, bucket: &str, key: &str) -> GatewayError {
    match code {
        "NoSuchBucket" => GatewayError::NoSuchBucket {
            bucket: bucket.to_owned(),
        },
        "NoSuchKey" => GatewayError::NoSuchKey {
            key: key.to_owned(),
        },
        "AccessDenied" | "AllAccessDisabled" => GatewayError::AccessDenied,
        _ => GatewayError::Service {
            code: code.to_owned(),
            message: message.to_owned(),
        },
    }
}
