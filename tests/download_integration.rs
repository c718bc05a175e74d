//! Integration tests for the HTTP transport.
//!
//! These tests verify transport-level behavior with mock HTTP servers.

use std::time::Duration;

use image_downloader::{HttpClient, ImageError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create a mock server with a file endpoint.
async fn setup_mock_file(path_str: &str, content: &[u8]) -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(path_str))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(&mock_server)
        .await;

    mock_server
}

#[tokio::test]
async fn test_get_returns_body_bytes() {
    let content = b"pretend these are image bytes";
    let mock_server = setup_mock_file("/photos/cat.png", content).await;

    let client = HttpClient::new();
    let url = format!("{}/photos/cat.png", mock_server.uri());
    let response = client.get(&url).await.expect("request should succeed");

    let bytes = response.bytes().await.expect("body should be readable");
    assert_eq!(bytes.as_ref(), content);
}

#[tokio::test]
async fn test_get_rejects_404() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new();
    let url = format!("{}/missing.png", mock_server.uri());
    let result = client.get(&url).await;

    let error = result.expect_err("404 should fail");
    assert!(matches!(error, ImageError::General { .. }));
    assert!(error.to_string().contains("404"), "got: {error}");
}

#[tokio::test]
async fn test_get_rejects_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken.png"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new();
    let url = format!("{}/broken.png", mock_server.uri());
    let error = client.get(&url).await.expect_err("500 should fail");
    assert!(error.to_string().contains("500"), "got: {error}");
}

#[tokio::test]
async fn test_get_rejects_invalid_url() {
    let client = HttpClient::new();
    let error = client
        .get("not a url at all")
        .await
        .expect_err("malformed URL should fail");
    assert!(matches!(error, ImageError::General { .. }));
    assert!(error.to_string().contains("invalid URL"), "got: {error}");
}

#[tokio::test]
async fn test_get_rejects_unreachable_host() {
    // Reserved TEST-NET address; connection should fail fast.
    let client = HttpClient::new_with_timeouts(1, 2);
    let error = client
        .get("http://192.0.2.1:9/image.png")
        .await
        .expect_err("unreachable host should fail");
    assert!(matches!(error, ImageError::General { .. }));
}

#[tokio::test]
async fn test_get_times_out_on_slow_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"late".to_vec())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let client = HttpClient::new_with_timeouts(5, 1);
    let url = format!("{}/slow.png", mock_server.uri());
    let error = client.get(&url).await.expect_err("should time out");
    assert!(error.to_string().contains("timeout"), "got: {error}");
}
