//! HTTP content fetcher
//!
//! Opens pre-signed download URLs as byte streams. The response body is
//! never buffered as a whole; chunks are handed on as they arrive.

use std::time::Duration;

use anyhow::Context;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::Client;
use tracing::debug;
use url::Url;

use docmirror_core::ports::source_store::ContentStream;

use crate::AwsError;

/// Connection establishment timeout for content requests
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Streams content from pre-signed URLs
#[derive(Debug, Clone)]
pub struct HttpContentFetcher {
    client: Client,
}

impl HttpContentFetcher {
    /// Create a fetcher keeping up to `max_pool_connections` idle connections per host
    pub fn new(max_pool_connections: usize) -> Result<Self, AwsError> {
        let client = Client::builder()
            .pool_max_idle_per_host(max_pool_connections)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// GET `url` and return its body as a stream
    ///
    /// # Errors
    /// Fails if the request cannot be sent or the status is not 2xx
    pub async fn open(&self, url: &Url) -> anyhow::Result<ContentStream> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .context("Failed to send content request")?;

        let status = response.status();
        if !status.is_success() {
            return Err(AwsError::HttpStatus {
                status: status.as_u16(),
            }
            .into());
        }

        let content_length = response.content_length();
        debug!(host = url.host_str().unwrap_or_default(), ?content_length, "Opened content stream");

        let stream = response
            .bytes_stream()
            .map_err(|e| anyhow::Error::new(AwsError::NetworkError(e)))
            .boxed();

        Ok(ContentStream {
            content_length,
            stream,
        })
    }
}
