mod helpers;

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    response::Response,
};
use serde_json::json;
use tower::ServiceExt;

use feedproxy::config::{Config, FeedSource};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

const RSS_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Example Feed</title>
    <description>Latest stories</description>
    <link>https://example.com</link>
    <item>
      <guid>https://example.com/posts/1</guid>
      <title>First Post</title>
      <link>https://example.com/posts/1</link>
      <description>Intro one</description>
      <pubDate>Mon, 10 Mar 2025 12:00:00 GMT</pubDate>
      <dc:creator>Jane Doe</dc:creator>
      <category>tech</category>
      <category>rust</category>
      <media:thumbnail url="https://example.com/thumb1.jpg"/>
    </item>
    <item>
      <guid>https://example.com/posts/2</guid>
      <title>Second Post</title>
      <link>https://example.com/posts/2</link>
      <description>Intro two</description>
      <pubDate>Tue, 11 Mar 2025 12:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

const ATOM_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Example</title>
  <subtitle>An atom subtitle</subtitle>
  <link href="https://example.org/"/>
  <entry>
    <id>urn:uuid:entry-1</id>
    <title>Entry One</title>
    <link rel="alternate" href="https://example.org/entries/1"/>
    <summary>Summary one</summary>
    <updated>2025-03-10T12:00:00Z</updated>
    <author><name>Ada</name></author>
  </entry>
</feed>"#;

// Missing </rss> close; the XML tier rejects this and the regex tier
// recovers whatever complete items it can.
const BROKEN_BODY: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
<title>Partially Broken</title>
<item><title>Recovered</title><link>https://example.com/rec</link></item>
</channel>"#;

fn rss_response() -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_bytes(RSS_BODY.as_bytes())
        .insert_header("Content-Type", "application/rss+xml; charset=utf-8")
}

async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .header("origin", "https://reader.example")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_proxy_normalizes_rss_feed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(rss_response())
        .mount(&mock_server)
        .await;

    let feed_url = format!("{}/feed.xml", mock_server.uri());
    let config = Config::default()
        .with_rate_limit(0, 60)
        .with_sources(vec![FeedSource {
            id: "mock".to_string(),
            name: "Mock News".to_string(),
            url: feed_url.clone(),
        }]);

    let response = get(
        helpers::test_app_with(config),
        &format!("/api/rss?url={feed_url}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = helpers::body_json(response).await;
    assert_eq!(body["title"], "Example Feed");
    assert_eq!(body["description"], "Latest stories");
    assert_eq!(body["link"], "https://example.com");
    assert_eq!(body["source"], "mock");

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], "https://example.com/posts/1");
    assert_eq!(items[0]["title"], "First Post");
    assert_eq!(items[0]["content"], "Intro one");
    assert_eq!(items[0]["pubDate"], "Mon, 10 Mar 2025 12:00:00 GMT");
    assert_eq!(items[0]["author"], "Jane Doe");
    assert_eq!(items[0]["categories"], json!(["tech", "rust"]));
    assert_eq!(items[0]["thumbnail"], "https://example.com/thumb1.jpg");
    assert_eq!(items[0]["source"], "mock");
    // camelCase on the wire, and absent fields are null rather than missing
    assert!(items[0].get("pub_date").is_none());
    assert!(items[1]["thumbnail"].is_null());
}

#[tokio::test]
async fn test_proxy_normalizes_atom_feed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/atom.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(ATOM_BODY.as_bytes())
                .insert_header("Content-Type", "application/atom+xml"),
        )
        .mount(&mock_server)
        .await;

    let response = get(
        helpers::test_app(),
        &format!("/api/rss?url={}/atom.xml", mock_server.uri()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = helpers::body_json(response).await;
    assert_eq!(body["title"], "Atom Example");
    assert_eq!(body["description"], "An atom subtitle");
    assert_eq!(body["link"], "https://example.org/");

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "urn:uuid:entry-1");
    assert_eq!(items[0]["content"], "Summary one");
    assert_eq!(items[0]["author"], "Ada");
    assert_eq!(items[0]["pubDate"], "2025-03-10T12:00:00.000Z");
}

#[tokio::test]
async fn test_missing_url_parameter_returns_400() {
    let response = get(helpers::test_app(), "/api/rss").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        helpers::body_json(response).await,
        json!({"error": "URL parameter is required"})
    );
}

#[tokio::test]
async fn test_upstream_failure_returns_500_with_url() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let feed_url = format!("{}/feed.xml", mock_server.uri());
    let response = get(helpers::test_app(), &format!("/api/rss?url={feed_url}")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = helpers::body_json(response).await;
    assert_eq!(body["error"], "Failed to fetch RSS feed");
    assert_eq!(body["url"], feed_url);
    assert!(body["message"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn test_malformed_xml_recovers_through_fallback() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(BROKEN_BODY.as_bytes())
                .insert_header("Content-Type", "application/xml"),
        )
        .mount(&mock_server)
        .await;

    let feed_url = format!("{}/broken.xml", mock_server.uri());
    let response = get(helpers::test_app(), &format!("/api/rss?url={feed_url}")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = helpers::body_json(response).await;
    assert_eq!(body["title"], "Partially Broken");
    assert_eq!(body["description"], format!("Feed from {feed_url}"));

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Recovered");
    assert_eq!(items[0]["link"], "https://example.com/rec");
    assert_eq!(items[0]["id"], "https://example.com/rec");
}

#[tokio::test]
async fn test_cors_headers_on_success_and_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(rss_response())
        .mount(&mock_server)
        .await;

    let app = helpers::test_app();

    let ok = get(
        app.clone(),
        &format!("/api/rss?url={}/feed.xml", mock_server.uri()),
    )
    .await;
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(
        ok.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );

    // A 400 must be readable cross-origin too.
    let bad = get(app, "/api/rss").await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        bad.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_preflight_allows_get() {
    let app = helpers::test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/rss")
                .header("origin", "https://reader.example")
                .header("access-control-request-method", "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let allowed = response
        .headers()
        .get("access-control-allow-methods")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(allowed.contains("GET"));
}

#[tokio::test]
async fn test_repeat_request_is_served_from_cache() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(rss_response())
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = helpers::test_app();
    let uri = format!("/api/rss?url={}/feed.xml", mock_server.uri());

    let first = get(app.clone(), &uri).await;
    assert_eq!(first.status(), StatusCode::OK);
    let second = get(app, &uri).await;
    assert_eq!(second.status(), StatusCode::OK);

    // Identical payloads, synthesized fields included.
    assert_eq!(
        helpers::body_json(first).await,
        helpers::body_json(second).await
    );
}

#[tokio::test]
async fn test_zero_ttl_disables_caching() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(rss_response())
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = Config::default().with_rate_limit(0, 60).with_cache_ttl_secs(0);
    let app = helpers::test_app_with(config);
    let uri = format!("/api/rss?url={}/feed.xml", mock_server.uri());

    assert_eq!(get(app.clone(), &uri).await.status(), StatusCode::OK);
    assert_eq!(get(app, &uri).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_concurrent_requests_fetch_upstream_once() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(rss_response().set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = helpers::test_app();
    let uri = format!("/api/rss?url={}/feed.xml", mock_server.uri());

    let (a, b, c) = tokio::join!(
        get(app.clone(), &uri),
        get(app.clone(), &uri),
        get(app, &uri)
    );

    assert_eq!(a.status(), StatusCode::OK);
    assert_eq!(b.status(), StatusCode::OK);
    assert_eq!(c.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_percent_encoded_url_parameter() {
    use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .and(query_param("page", "1"))
        .respond_with(rss_response())
        .mount(&mock_server)
        .await;

    let feed_url = format!("{}/feed.xml?page=1", mock_server.uri());
    let encoded = utf8_percent_encode(&feed_url, NON_ALPHANUMERIC).to_string();

    let response = get(helpers::test_app(), &format!("/api/rss?url={encoded}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(helpers::body_json(response).await["title"], "Example Feed");
}

#[tokio::test]
async fn test_rate_limit_returns_429_with_retry_after() {
    let config = Config::default().with_rate_limit(2, 60);
    let app = helpers::test_app_with(config);

    // `oneshot` skips the connect layer, so the peer address rides in as
    // an extension the way the real listener would provide it.
    let request = |uri: &str| {
        let mut request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 9000))));
        request
    };

    for _ in 0..2 {
        let response = app.clone().oneshot(request("/healthz")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(request("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response
        .headers()
        .get("retry-after")
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after >= 1);
    assert_eq!(
        helpers::body_json(response).await,
        json!({"error": "Rate limit exceeded"})
    );
}

#[tokio::test]
async fn test_healthz_reports_cache_population() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(rss_response())
        .mount(&mock_server)
        .await;

    let app = helpers::test_app();

    let before = get(app.clone(), "/healthz").await;
    assert_eq!(before.status(), StatusCode::OK);
    assert_eq!(
        helpers::body_json(before).await,
        json!({"status": "OK", "sources": 3, "cached_feeds": 0})
    );

    let fetched = get(
        app.clone(),
        &format!("/api/rss?url={}/feed.xml", mock_server.uri()),
    )
    .await;
    assert_eq!(fetched.status(), StatusCode::OK);

    let after = helpers::body_json(get(app, "/healthz").await).await;
    assert_eq!(after["cached_feeds"], 1);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let response = get(helpers::test_app(), "/api-docs/openapi.json").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = helpers::body_json(response).await;
    assert_eq!(body["info"]["title"], "feedproxy API");
    assert!(body["paths"]["/api/rss"].is_object());
    assert!(body["paths"]["/healthz"].is_object());
}
