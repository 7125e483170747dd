//! WorkDocsSource against a wiremock WorkDocs REST endpoint

use bytes::Bytes;
use futures_util::TryStreamExt;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use docmirror_aws::AwsError;
use docmirror_core::domain::newtypes::{FileId, FolderId, VersionToken};
use docmirror_core::ports::source_store::ISourceStore;

use crate::common;

#[tokio::test]
async fn test_list_children_maps_folders_and_documents() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/folders/root-1/contents"))
        .and(query_param_is_missing("marker"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Folders": [
                { "Id": "folder-a", "Name": "Reports" }
            ],
            "Documents": [
                {
                    "Id": "doc-1",
                    "LatestVersionMetadata": { "Id": "ver-1", "Name": "summary.pdf" }
                }
            ],
            "Marker": "page-2"
        })))
        .mount(&server)
        .await;

    let source = common::workdocs_source(&server);
    let page = source
        .list_children(&FolderId::new("root-1").unwrap(), None)
        .await
        .unwrap();

    assert_eq!(page.folders.len(), 1);
    assert_eq!(page.folders[0].id.as_str(), "folder-a");
    assert_eq!(page.folders[0].name, "Reports");

    assert_eq!(page.files.len(), 1);
    assert_eq!(page.files[0].id.as_str(), "doc-1");
    assert_eq!(page.files[0].name, "summary.pdf");
    assert_eq!(page.files[0].version.as_str(), "ver-1");

    assert_eq!(page.next_token.as_deref(), Some("page-2"));
}

#[tokio::test]
async fn test_list_children_rejects_document_without_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/folders/root-1/contents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Folders": [],
            "Documents": [
                {
                    "Id": "doc-1",
                    "LatestVersionMetadata": { "Id": "ver-1", "Name": "summary.pdf" }
                },
                { "Id": "doc-without-version" }
            ]
        })))
        .mount(&server)
        .await;

    let source = common::workdocs_source(&server);
    let err = source
        .list_children(&FolderId::new("root-1").unwrap(), None)
        .await
        .unwrap_err();

    match err.downcast_ref::<AwsError>() {
        Some(AwsError::InvalidResponse(message)) => {
            assert!(message.contains("doc-without-version"), "{message}")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_list_children_rejects_folder_without_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/folders/root-1/contents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Folders": [ { "Id": "folder-a" } ],
            "Documents": []
        })))
        .mount(&server)
        .await;

    let source = common::workdocs_source(&server);
    let err = source
        .list_children(&FolderId::new("root-1").unwrap(), None)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AwsError>(),
        Some(AwsError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn test_list_children_passes_marker() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/folders/root-1/contents"))
        .and(query_param("marker", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Folders": [],
            "Documents": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = common::workdocs_source(&server);
    let page = source
        .list_children(&FolderId::new("root-1").unwrap(), Some("page-2"))
        .await
        .unwrap();

    assert!(page.folders.is_empty());
    assert!(page.files.is_empty());
    assert!(page.next_token.is_none());
}

#[tokio::test]
async fn test_list_children_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/folders/gone/contents"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "Message": "folder not found"
        })))
        .mount(&server)
        .await;

    let source = common::workdocs_source(&server);
    let err = source
        .list_children(&FolderId::new("gone").unwrap(), None)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("DescribeFolderContents failed"));
}

#[tokio::test]
async fn test_resolve_and_open_original_source() {
    let server = MockServer::start().await;
    let content_url = format!("{}/download/doc-1", server.uri());

    Mock::given(method("GET"))
        .and(path("/api/v1/documents/doc-1/versions/ver-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Metadata": {
                "Id": "ver-1",
                "Source": { "ORIGINAL": content_url }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/download/doc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pdf bytes".to_vec()))
        .mount(&server)
        .await;

    let source = common::workdocs_source(&server);
    let handle = source
        .resolve_fetch_handle(
            &FileId::new("doc-1").unwrap(),
            &VersionToken::new("ver-1").unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(handle.url.as_str(), content_url);

    let content = source.open_content(&handle).await.unwrap();
    let chunks: Vec<Bytes> = content.stream.try_collect().await.unwrap();
    assert_eq!(chunks.concat(), b"pdf bytes".to_vec());
}

#[tokio::test]
async fn test_resolve_without_original_source_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/documents/doc-2/versions/ver-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Metadata": { "Id": "ver-1" }
        })))
        .mount(&server)
        .await;

    let source = common::workdocs_source(&server);
    let err = source
        .resolve_fetch_handle(
            &FileId::new("doc-2").unwrap(),
            &VersionToken::new("ver-1").unwrap(),
        )
        .await
        .unwrap_err();

    assert!(err.to_string().contains("no ORIGINAL source"));
}
