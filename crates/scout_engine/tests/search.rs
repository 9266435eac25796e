mod common;

use common::init_logging;
use pretty_assertions::assert_eq;
use scout_engine::{
    FetchFailure, NaverBlogSearch, SearchConfig, SearchCredentials, SearchError, SearchProvider,
};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, page_size: usize) -> NaverBlogSearch {
    let config = SearchConfig {
        endpoint: format!("{}/v1/search/blog", server.uri()),
        page_size,
        page_delay_ms: 0,
        ..SearchConfig::default()
    };
    let credentials = SearchCredentials {
        client_id: "id".to_string(),
        client_secret: "secret".to_string(),
    };
    NaverBlogSearch::new(config, credentials).unwrap()
}

fn page(links: &[&str]) -> ResponseTemplate {
    let items: Vec<_> = links.iter().map(|link| json!({ "link": link })).collect();
    ResponseTemplate::new(200).set_body_json(json!({ "items": items }))
}

#[tokio::test]
async fn pages_are_followed_filtered_and_deduplicated() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search/blog"))
        .and(query_param("query", "seoul noodles"))
        .and(query_param("start", "1"))
        .and(header("X-Naver-Client-Id", "id"))
        .and(header("X-Naver-Client-Secret", "secret"))
        .respond_with(page(&[
            "https://blog.naver.com/a/1",
            "https://example.com/elsewhere",
        ]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/search/blog"))
        .and(query_param("start", "3"))
        .respond_with(page(&["https://blog.naver.com/a/1/", "https://blog.naver.com/b/2"]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/search/blog"))
        .and(query_param("start", "5"))
        .respond_with(page(&["https://blog.naver.com/c/3"]))
        .mount(&server)
        .await;

    let urls = client(&server, 2).search("seoul noodles", 10).await.unwrap();

    assert_eq!(
        urls,
        vec![
            "https://blog.naver.com/a/1",
            "https://blog.naver.com/b/2",
            "https://blog.naver.com/c/3",
        ]
    );
}

#[tokio::test]
async fn result_count_is_capped() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search/blog"))
        .respond_with(page(&[
            "https://blog.naver.com/a/1",
            "https://blog.naver.com/a/2",
            "https://blog.naver.com/a/3",
        ]))
        .expect(1)
        .mount(&server)
        .await;

    let urls = client(&server, 3).search("q", 2).await.unwrap();
    assert_eq!(urls.len(), 2);
}

#[tokio::test]
async fn http_error_is_reported() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server, 10).search("q", 10).await.unwrap_err();
    assert!(
        matches!(&err, SearchError::Fetch(fetch) if fetch.failure == FetchFailure::HttpStatus(500)),
        "{err}"
    );
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&server)
        .await;

    let err = client(&server, 10).search("q", 10).await.unwrap_err();
    assert!(matches!(err, SearchError::Decode(_)), "{err}");
}
