//! Integration tests for `HttpClient` retry and error mapping.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no real
//! network traffic is made.

use std::time::Duration;

use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tvrank_scraper::{HttpClient, HttpRequest, Transport, TransportError};

/// 5-second timeout, no back-off delay so retry tests stay fast.
fn test_client(max_retries: u32) -> HttpClient {
    HttpClient::new(5, "tvrank-test/0.1", max_retries, 0).expect("failed to build test client")
}

#[tokio::test]
async fn get_returns_body_on_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page.html"))
        .and(header("user-agent", "tvrank-test/0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let response = test_client(5)
        .execute(HttpRequest::get(format!("{}/page.html", server.uri())))
        .await
        .expect("request should succeed");

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "<html>ok</html>");
}

#[tokio::test]
async fn retries_503_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .expect(1)
        .mount(&server)
        .await;

    let response = test_client(5)
        .execute(HttpRequest::get(format!("{}/flaky", server.uri())))
        .await
        .expect("should succeed after retries");

    assert_eq!(response.body, "recovered");
}

#[tokio::test]
async fn exhausted_retries_surface_last_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        // 1 initial attempt + 3 retries
        .expect(4)
        .mount(&server)
        .await;

    let err = test_client(3)
        .execute(HttpRequest::get(format!("{}/down", server.uri())))
        .await
        .unwrap_err();

    match err {
        TransportError::Status { status, body, .. } => {
            assert_eq!(status, 502);
            assert_eq!(body, "bad gateway");
        }
        other => panic!("expected Status error, got: {other:?}"),
    }
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(5)
        .execute(HttpRequest::get(format!("{}/missing", server.uri())))
        .await
        .unwrap_err();

    assert!(err.is_not_found(), "expected 404, got: {err:?}");
}

#[tokio::test]
async fn not_implemented_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nope"))
        .respond_with(ResponseTemplate::new(501))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(5)
        .execute(HttpRequest::get(format!("{}/nope", server.uri())))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(501));
}

#[tokio::test]
async fn slow_response_is_a_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let err = test_client(0)
        .execute(
            HttpRequest::get(format!("{}/slow", server.uri())).timeout(Duration::from_millis(200)),
        )
        .await
        .unwrap_err();

    assert!(
        matches!(err, TransportError::Timeout { .. }),
        "expected Timeout, got: {err:?}"
    );
}

#[tokio::test]
async fn post_sends_headers_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/records"))
        .and(header("authorization", "Bearer secret"))
        .and(header("content-type", "application/json"))
        .and(body_string(r#"{"records":[]}"#))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let request = HttpRequest::new(reqwest::Method::POST, format!("{}/records", server.uri()))
        .bearer("secret")
        .json(&serde_json::json!({"records": []}));

    let response = test_client(0).execute(request).await.expect("post should succeed");
    assert_eq!(response.status, 200);
}
