//! Amazon WorkDocs source adapter
//!
//! Lists folders with `DescribeFolderContents` (paginated by `Marker`) and
//! resolves document versions to their `ORIGINAL` source URL with
//! `GetDocumentVersion`. A document's name and version come from its
//! latest version metadata.
//!
//! An entry missing any of those fields fails the whole page instead of
//! being skipped.

use aws_sdk_workdocs::types::DocumentSourceType;
use aws_sdk_workdocs::Client;
use tracing::debug;
use url::Url;

use docmirror_core::domain::newtypes::{FileId, FolderId, VersionToken};
use docmirror_core::ports::source_store::{
    ChildrenPage, ContentStream, FetchHandle, FileRef, FolderRef, ISourceStore,
};

use crate::fetch::HttpContentFetcher;
use crate::AwsError;

/// WorkDocs implementation of [`ISourceStore`]
#[derive(Debug, Clone)]
pub struct WorkDocsSource {
    client: Client,
    fetcher: HttpContentFetcher,
}

impl WorkDocsSource {
    pub fn new(client: Client, fetcher: HttpContentFetcher) -> Self {
        Self { client, fetcher }
    }
}

#[async_trait::async_trait]
impl ISourceStore for WorkDocsSource {
    async fn list_children(
        &self,
        folder_id: &FolderId,
        continuation: Option<&str>,
    ) -> anyhow::Result<ChildrenPage> {
        let output = self
            .client
            .describe_folder_contents()
            .folder_id(folder_id.as_str())
            .set_marker(continuation.map(String::from))
            .send()
            .await
            .map_err(|e| AwsError::service("DescribeFolderContents", e))?;

        let mut page = ChildrenPage::default();

        for folder in output.folders() {
            let (Some(id), Some(name)) = (folder.id(), folder.name()) else {
                return Err(AwsError::InvalidResponse(format!(
                    "folder {} under {folder_id} has no id or name",
                    folder.id().unwrap_or("<unknown>")
                ))
                .into());
            };
            page.folders.push(FolderRef {
                id: FolderId::new(id)?,
                name: name.to_string(),
            });
        }

        for document in output.documents() {
            let latest = document.latest_version_metadata();
            let (Some(id), Some(name), Some(version)) = (
                document.id(),
                latest.and_then(|v| v.name()),
                latest.and_then(|v| v.id()),
            ) else {
                return Err(AwsError::InvalidResponse(format!(
                    "document {} under {folder_id} has no id or latest version metadata",
                    document.id().unwrap_or("<unknown>")
                ))
                .into());
            };
            page.files.push(FileRef {
                id: FileId::new(id)?,
                name: name.to_string(),
                version: VersionToken::new(version)?,
            });
        }

        page.next_token = output
            .marker()
            .filter(|marker| !marker.is_empty())
            .map(String::from);

        debug!(
            folder_id = %folder_id,
            folders = page.folders.len(),
            files = page.files.len(),
            "DescribeFolderContents"
        );
        Ok(page)
    }

    async fn resolve_fetch_handle(
        &self,
        file_id: &FileId,
        version: &VersionToken,
    ) -> anyhow::Result<FetchHandle> {
        let output = self
            .client
            .get_document_version()
            .document_id(file_id.as_str())
            .version_id(version.as_str())
            .fields("SOURCE")
            .send()
            .await
            .map_err(|e| AwsError::service("GetDocumentVersion", e))?;

        let source_url = output
            .metadata()
            .and_then(|metadata| metadata.source())
            .and_then(|sources| sources.get(&DocumentSourceType::Original))
            .ok_or_else(|| {
                AwsError::InvalidResponse(format!(
                    "no ORIGINAL source for document {file_id} version {version}"
                ))
            })?;

        let url = Url::parse(source_url).map_err(|e| {
            AwsError::InvalidResponse(format!("malformed source URL for {file_id}: {e}"))
        })?;

        Ok(FetchHandle {
            file_id: file_id.clone(),
            version: version.clone(),
            url,
        })
    }

    async fn open_content(&self, handle: &FetchHandle) -> anyhow::Result<ContentStream> {
        self.fetcher.open(&handle.url).await
    }
}
