//! End-to-end scrape of a fixture page through the real `HttpClient`.

use reqwest::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tvrank_core::{SourceDescriptor, TableVariant};
use tvrank_scraper::{scrape_source, ExtractionGap, HttpClient};

const MTV_PAGE: &str = include_str!("fixtures/mtv_online14.html");

fn test_client() -> HttpClient {
    HttpClient::new(5, "tvrank-test/0.1", 0, 0).expect("failed to build test client")
}

fn descriptor(server: &MockServer, page: &str) -> SourceDescriptor {
    SourceDescriptor {
        service: "MTV Katsomo".to_string(),
        endpoint: Url::parse(&format!("{}{page}", server.uri())).unwrap(),
    }
}

#[tokio::test]
async fn scrapes_fixture_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tulokset/totaltv/mtv/online14/3plus.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(MTV_PAGE),
        )
        .mount(&server)
        .await;

    let source = descriptor(&server, "/tulokset/totaltv/mtv/online14/3plus.html");
    let result = scrape_source(&test_client(), &source, TableVariant::Detailed).await;

    assert!(result.gap.is_none(), "unexpected gap: {:?}", result.gap);
    // Header skipped, the three-column row dropped.
    assert_eq!(result.fragments.len(), 4);

    let first = &result.fragments[0];
    assert_eq!(first.source_rank, Some(1));
    assert_eq!(first.program, "Salatut elämät");
    assert_eq!(first.episode, "Jakso 4512");
    assert_eq!(first.duration, "0:25");
    assert_eq!(first.viewers, Some(512_300));

    assert_eq!(result.fragments[1].viewers, Some(431_020));

    let movie = &result.fragments[2];
    assert_eq!(movie.episode, "", "five-column rows carry no episode");
    assert_eq!(movie.duration, "3:00");
    assert_eq!(movie.viewers, Some(200_000));

    assert_eq!(result.fragments[3].viewers, None, "'-' is not a count");
}

#[tokio::test]
async fn server_error_is_reported_as_gap() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let source = descriptor(&server, "/x.html");
    let result = scrape_source(&test_client(), &source, TableVariant::Detailed).await;

    assert!(result.fragments.is_empty());
    assert!(matches!(result.gap, Some(ExtractionGap::Fetch(_))));
}
