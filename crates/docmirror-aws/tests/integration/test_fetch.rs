//! HttpContentFetcher against a wiremock content server

use bytes::Bytes;
use futures_util::TryStreamExt;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use docmirror_aws::fetch::HttpContentFetcher;
use docmirror_aws::AwsError;

fn content_url(server: &MockServer, suffix: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), suffix)).unwrap()
}

#[tokio::test]
async fn test_open_streams_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/content/doc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello world".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpContentFetcher::new(4).unwrap();
    let content = fetcher
        .open(&content_url(&server, "/content/doc-1"))
        .await
        .unwrap();

    assert_eq!(content.content_length, Some(11));
    let chunks: Vec<Bytes> = content.stream.try_collect().await.unwrap();
    assert_eq!(chunks.concat(), b"hello world".to_vec());
}

#[tokio::test]
async fn test_open_fails_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/content/expired"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let fetcher = HttpContentFetcher::with_client(reqwest::Client::new());
    let err = fetcher
        .open(&content_url(&server, "/content/expired"))
        .await
        .unwrap_err();

    match err.downcast_ref::<AwsError>() {
        Some(AwsError::HttpStatus { status }) => assert_eq!(*status, 403),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_open_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/content/empty"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let fetcher = HttpContentFetcher::with_client(reqwest::Client::new());
    let content = fetcher
        .open(&content_url(&server, "/content/empty"))
        .await
        .unwrap();
    let chunks: Vec<Bytes> = content.stream.try_collect().await.unwrap();
    assert!(chunks.concat().is_empty());
}
