// Integration tests for the HTTP relay source.
//
// Each test stands up a local wiremock server; no real network traffic.
// Covers the happy path, status mapping (404, 403, 429 with and without
// Retry-After, 5xx), malformed bodies and bearer auth.

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cinder::source::http::HttpSource;
use cinder::source::{ChannelKind, ChannelSource, FetchError};

/// No pacing in tests.
fn source(server: &MockServer) -> HttpSource {
    HttpSource::new(&server.uri(), None, 0.0).unwrap()
}

fn channel_json() -> serde_json::Value {
    json!({
        "id": 1006503122,
        "username": "durov",
        "title": "Durov's Channel",
        "subscriber_count": 900000,
        "verified": true,
        "photo_present": true,
        "kind": "broadcast"
    })
}

#[tokio::test]
async fn resolves_and_fetches_history() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels/durov"))
        .respond_with(ResponseTemplate::new(200).set_body_json(channel_json()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/channels/durov/messages"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [
                {"id": 2, "date": "2024-01-02T00:00:00Z", "message": "b"},
                {"id": 1, "date": "2024-01-01T00:00:00Z", "message": "a"}
            ]
        })))
        .mount(&server)
        .await;

    let source = source(&server);
    let info = source.resolve("durov").await.unwrap();
    assert_eq!(info.id, 1006503122);
    assert_eq!(info.kind, ChannelKind::Broadcast);
    assert!(info.verified);

    let messages = source.fetch_history(&info, 50).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["id"], 2);
}

#[tokio::test]
async fn base_url_with_path_prefix_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/relay/v1/health"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let base = format!("{}/relay/v1/", server.uri());
    let source = HttpSource::new(&base, None, 0.0).unwrap();
    assert!(source.health_check().await.is_ok());
}

#[tokio::test]
async fn not_found_and_forbidden_map_to_typed_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels/missing_chan"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/channels/secret_chan"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let source = source(&server);
    assert_eq!(
        source.resolve("missing_chan").await.unwrap_err(),
        FetchError::NotFound("missing_chan".into())
    );
    assert_eq!(source.resolve("secret_chan").await.unwrap_err(), FetchError::Private);
}

#[tokio::test]
async fn rate_limit_keeps_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels/busy_chan"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .expect(1)
        .mount(&server)
        .await;

    let err = source(&server).resolve("busy_chan").await.unwrap_err();
    assert_eq!(
        err,
        FetchError::RateLimited {
            retry_after: Some(std::time::Duration::from_secs(30))
        }
    );
}

#[tokio::test]
async fn rate_limit_with_date_header_has_no_delay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels/busy_chan"))
        .respond_with(
            ResponseTemplate::new(429).insert_header("Retry-After", "Wed, 21 Oct 2026 07:28:00 GMT"),
        )
        .mount(&server)
        .await;

    let err = source(&server).resolve("busy_chan").await.unwrap_err();
    assert_eq!(err, FetchError::RateLimited { retry_after: None });
}

#[tokio::test]
async fn server_errors_and_bad_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels/broken_chan"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/channels/garbled_chan"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let source = source(&server);
    assert!(matches!(
        source.resolve("broken_chan").await.unwrap_err(),
        FetchError::Unavailable(_)
    ));
    assert!(matches!(
        source.resolve("garbled_chan").await.unwrap_err(),
        FetchError::Malformed(_)
    ));
}

#[tokio::test]
async fn unhealthy_relay_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = source(&server).health_check().await.unwrap_err();
    assert!(matches!(err, FetchError::Unavailable(_)));
}

#[tokio::test]
async fn bearer_token_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels/durov"))
        .and(header("authorization", "Bearer relay-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(channel_json()))
        .mount(&server)
        .await;

    let source = HttpSource::new(&server.uri(), Some("relay-secret".into()), 0.0).unwrap();
    assert_eq!(source.resolve("durov").await.unwrap().id, 1006503122);
}

#[tokio::test]
async fn rate_limit_pauses_later_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels/busy_chan"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/channels/durov"))
        .respond_with(ResponseTemplate::new(200).set_body_json(channel_json()))
        .mount(&server)
        .await;

    let source = source(&server);
    let started = std::time::Instant::now();
    assert!(matches!(
        source.resolve("busy_chan").await.unwrap_err(),
        FetchError::RateLimited { .. }
    ));
    // the 429 itself comes back without waiting
    assert!(started.elapsed() < std::time::Duration::from_millis(900));

    let info = source.resolve("durov").await.unwrap();
    assert_eq!(info.id, 1006503122);
    assert!(started.elapsed() >= std::time::Duration::from_millis(900));
}
