//! Amazon S3 destination adapter
//!
//! Objects smaller than one part are written with a single `PutObject`.
//! Larger streams use a multipart upload whose user metadata is set at
//! creation, so content and version token become visible together when
//! the upload completes. A failed multipart upload is aborted.
//!
//! At most one part is buffered per upload.

use std::collections::HashMap;

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use tracing::{debug, warn};

use docmirror_core::domain::newtypes::{DestinationKey, VersionToken};
use docmirror_core::ports::object_store::{IObjectStore, ObjectBody, ObjectMetadata, ObjectPage};
use docmirror_core::ports::source_store::ContentStream;

use crate::AwsError;

// ============================================================================
// PartBuffer
// ============================================================================

/// Accumulates stream chunks into fixed-size upload parts
#[derive(Debug)]
pub(crate) struct PartBuffer {
    part_size: usize,
    buffer: BytesMut,
}

impl PartBuffer {
    pub(crate) fn new(part_size: usize) -> Self {
        Self {
            part_size: part_size.max(1),
            buffer: BytesMut::new(),
        }
    }

    /// Append a chunk, returning every part that became full
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        self.buffer.extend_from_slice(chunk);
        let mut parts = Vec::new();
        while self.buffer.len() >= self.part_size {
            parts.push(self.buffer.split_to(self.part_size).freeze());
        }
        parts
    }

    /// Take whatever is left (possibly empty)
    pub(crate) fn finish(self) -> Bytes {
        self.buffer.freeze()
    }
}

// ============================================================================
// S3ObjectStore
// ============================================================================

/// S3 implementation of [`IObjectStore`]
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    version_metadata_key: String,
    part_size: usize,
}

impl S3ObjectStore {
    /// Create a store for `bucket`
    ///
    /// # Arguments
    /// * `version_metadata_key` - User-metadata key holding the version token
    /// * `part_size` - Multipart part size in bytes
    pub fn new(
        client: Client,
        bucket: impl Into<String>,
        version_metadata_key: impl Into<String>,
        part_size: usize,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            version_metadata_key: version_metadata_key.into(),
            part_size,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn user_metadata(&self, metadata: &ObjectMetadata) -> Option<HashMap<String, String>> {
        metadata.version_token.as_ref().map(|token| {
            HashMap::from([(self.version_metadata_key.clone(), token.as_str().to_string())])
        })
    }

    fn version_from(&self, user_metadata: Option<&HashMap<String, String>>) -> Option<VersionToken> {
        user_metadata?
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&self.version_metadata_key))
            .and_then(|(_, value)| VersionToken::new(value.clone()).ok())
    }

    async fn put_single(
        &self,
        key: &DestinationKey,
        body: Bytes,
        user_metadata: Option<HashMap<String, String>>,
    ) -> Result<(), AwsError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .body(ByteStream::from(body))
            .set_metadata(user_metadata)
            .send()
            .await
            .map_err(|e| AwsError::service("PutObject", e))?;
        Ok(())
    }

    async fn put_stream(
        &self,
        key: &DestinationKey,
        mut content: ContentStream,
        user_metadata: Option<HashMap<String, String>>,
    ) -> anyhow::Result<()> {
        let mut buffer = PartBuffer::new(self.part_size);

        // Read until one full part exists; smaller objects need no multipart upload.
        let first_parts = loop {
            match content.stream.next().await {
                Some(chunk) => {
                    let parts = buffer.push(&chunk?);
                    if !parts.is_empty() {
                        break parts;
                    }
                }
                None => {
                    self.put_single(key, buffer.finish(), user_metadata).await?;
                    return Ok(());
                }
            }
        };

        let created = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key.as_str())
            .set_metadata(user_metadata)
            .send()
            .await
            .map_err(|e| AwsError::service("CreateMultipartUpload", e))?;
        let upload_id = created
            .upload_id()
            .ok_or_else(|| AwsError::InvalidResponse("CreateMultipartUpload without UploadId".into()))?
            .to_string();

        debug!(key = %key, upload_id = %upload_id, "Started multipart upload");

        let uploaded = self
            .upload_parts(key, &upload_id, first_parts, buffer, content)
            .await;

        let parts = match uploaded {
            Ok(parts) => parts,
            Err(err) => {
                self.abort(key, &upload_id).await;
                return Err(err);
            }
        };

        let completed = self
            .client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key.as_str())
            .upload_id(&upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await;

        if let Err(e) = completed {
            self.abort(key, &upload_id).await;
            return Err(AwsError::service("CompleteMultipartUpload", e).into());
        }
        Ok(())
    }

    async fn upload_parts(
        &self,
        key: &DestinationKey,
        upload_id: &str,
        first_parts: Vec<Bytes>,
        mut buffer: PartBuffer,
        mut content: ContentStream,
    ) -> anyhow::Result<Vec<CompletedPart>> {
        let mut completed = Vec::new();

        for part in first_parts {
            completed.push(self.upload_part(key, upload_id, completed.len() as i32 + 1, part).await?);
        }

        while let Some(chunk) = content.stream.next().await {
            for part in buffer.push(&chunk?) {
                completed.push(self.upload_part(key, upload_id, completed.len() as i32 + 1, part).await?);
            }
        }

        let last = buffer.finish();
        if !last.is_empty() {
            completed.push(self.upload_part(key, upload_id, completed.len() as i32 + 1, last).await?);
        }

        Ok(completed)
    }

    async fn upload_part(
        &self,
        key: &DestinationKey,
        upload_id: &str,
        part_number: i32,
        body: Bytes,
    ) -> Result<CompletedPart, AwsError> {
        let output = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key.as_str())
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| AwsError::service("UploadPart", e))?;

        Ok(CompletedPart::builder()
            .set_e_tag(output.e_tag().map(String::from))
            .part_number(part_number)
            .build())
    }

    async fn abort(&self, key: &DestinationKey, upload_id: &str) {
        if let Err(e) = self
            .client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key.as_str())
            .upload_id(upload_id)
            .send()
            .await
        {
            let err = AwsError::service("AbortMultipartUpload", e);
            warn!(key = %key, upload_id, error = %err, "Failed to abort multipart upload");
        }
    }
}

#[async_trait::async_trait]
impl IObjectStore for S3ObjectStore {
    async fn head_object(&self, key: &DestinationKey) -> anyhow::Result<Option<ObjectMetadata>> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
        {
            Ok(output) => Ok(Some(ObjectMetadata {
                version_token: self.version_from(output.metadata()),
            })),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(None)
                } else {
                    Err(AwsError::service("HeadObject", service_error).into())
                }
            }
        }
    }

    async fn put_object(
        &self,
        key: &DestinationKey,
        body: ObjectBody,
        metadata: ObjectMetadata,
    ) -> anyhow::Result<()> {
        let user_metadata = self.user_metadata(&metadata);
        match body {
            ObjectBody::Empty => Ok(self.put_single(key, Bytes::new(), user_metadata).await?),
            ObjectBody::Stream(content) => self.put_stream(key, content, user_metadata).await,
        }
    }

    async fn list_objects(
        &self,
        prefix: &str,
        continuation: Option<&str>,
    ) -> anyhow::Result<ObjectPage> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .set_continuation_token(continuation.map(String::from))
            .send()
            .await
            .map_err(|e| AwsError::service("ListObjectsV2", e))?;

        let keys = output
            .contents()
            .iter()
            .filter_map(|object| object.key())
            .map(DestinationKey::from)
            .collect();

        Ok(ObjectPage {
            keys,
            next_token: output.next_continuation_token().map(String::from),
        })
    }

    async fn delete_object(&self, key: &DestinationKey) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
            .map_err(|e| AwsError::service("DeleteObject", e))?;
        Ok(())
    }
}
