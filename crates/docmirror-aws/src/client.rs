//! SDK configuration loading and adapter construction
//!
//! Credentials come from the standard AWS provider chain. Region and retry
//! behaviour come from [`AwsConfig`]; an endpoint override applies to S3 only,
//! which is how S3-compatible destinations are reached. Both SDK clients
//! share one HTTP client whose idle pool holds `max_pool_connections`
//! connections per host.

use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::config::SharedHttpClient;
use aws_smithy_runtime::client::http::hyper_014::HyperClientBuilder;
use tracing::info;

use docmirror_core::config::{AwsConfig, Config};

use crate::fetch::HttpContentFetcher;
use crate::s3::S3ObjectStore;
use crate::workdocs::WorkDocsSource;
use crate::AwsError;

/// HTTP client for the SDK clients, keeping up to `max_pool_connections`
/// idle connections per host
pub fn sdk_http_client(max_pool_connections: usize) -> SharedHttpClient {
    let connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();

    let mut pool = hyper::Client::builder();
    pool.pool_max_idle_per_host(max_pool_connections.max(1));

    HyperClientBuilder::new().hyper_builder(pool).build(connector)
}

/// Load the shared SDK configuration
pub async fn load_sdk_config(aws: &AwsConfig, max_pool_connections: usize) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(aws.region.clone()))
        .http_client(sdk_http_client(max_pool_connections))
        .retry_config(RetryConfig::adaptive().with_max_attempts(aws.max_attempts.max(1)))
        .load()
        .await
}

/// Build an S3 client, honouring an endpoint override
pub fn s3_client(sdk: &SdkConfig, endpoint_url: Option<&str>) -> aws_sdk_s3::Client {
    let mut builder = aws_sdk_s3::config::Builder::from(sdk);
    if let Some(endpoint) = endpoint_url {
        builder = builder.endpoint_url(endpoint).force_path_style(true);
    }
    aws_sdk_s3::Client::from_conf(builder.build())
}

pub fn workdocs_client(sdk: &SdkConfig) -> aws_sdk_workdocs::Client {
    aws_sdk_workdocs::Client::new(sdk)
}

/// Construct the source and destination adapters for a run
///
/// # Errors
/// Returns [`AwsError::MissingConfig`] when no bucket is configured, or a
/// network error if the HTTP client cannot be built.
pub async fn connect(config: &Config) -> Result<(WorkDocsSource, S3ObjectStore), AwsError> {
    let bucket = config
        .destination
        .bucket
        .as_deref()
        .filter(|b| !b.trim().is_empty())
        .ok_or(AwsError::MissingConfig("destination.bucket"))?;

    let sdk = load_sdk_config(&config.aws, config.transfer.max_pool_connections).await;
    let fetcher = HttpContentFetcher::new(config.transfer.max_pool_connections)?;

    let source = WorkDocsSource::new(workdocs_client(&sdk), fetcher);
    let destination = S3ObjectStore::new(
        s3_client(&sdk, config.aws.endpoint_url.as_deref()),
        bucket,
        config.destination.version_metadata_key.clone(),
        config.part_size_bytes(),
    );

    info!(
        region = %config.aws.region,
        bucket = destination.bucket(),
        max_pool_connections = config.transfer.max_pool_connections,
        endpoint = config.aws.endpoint_url.as_deref().unwrap_or("default"),
        "AWS clients ready"
    );

    Ok((source, destination))
}
