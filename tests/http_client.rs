//! HTTP client tests using wiremock mock server.
//!
//! These tests verify:
//! - Request shape for `GET /photos/random` (headers, optional query)
//! - Response decoding into `FetchedImage`
//! - Error classification (API, decode, transport)
//! - Exactly one attempt per call

use std::sync::{Arc, Mutex};
use std::time::Duration;

use randompic::{
    Client, Config, Error, HeaderList, HttpRequestMetrics, MetricsCallbacks, RandomPhotoRequest,
    TransportErrorKind,
};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn photo_body() -> serde_json::Value {
    json!({
        "id": "Dwu85P9SOIk",
        "urls": {
            "raw": "https://images.unsplash.com/raw",
            "full": "https://images.unsplash.com/full.jpg"
        },
        "user": {
            "username": "jdoe",
            "name": "Jane Doe",
            "links": { "html": "https://unsplash.com/@jdoe" }
        }
    })
}

/// Helper to create a client pointing at the mock server.
fn client_for_server(server: &MockServer) -> Client {
    Client::new(Config {
        access_key: Some("test_access_key".into()),
        base_url: Some(server.uri()),
        ..Default::default()
    })
    .expect("client creation should succeed")
}

#[tokio::test]
async fn random_sends_auth_and_version_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/photos/random"))
        .and(header("Authorization", "Client-ID test_access_key"))
        .and(header(randompic::ACCEPT_VERSION_HEADER, randompic::API_VERSION))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(photo_body()))
        .expect(1)
        .mount(&server)
        .await;

    let image = client_for_server(&server)
        .photos()
        .random(RandomPhotoRequest::new())
        .await
        .expect("request should succeed");

    assert_eq!(image.url, "https://images.unsplash.com/full.jpg");
    assert_eq!(image.author_name, "jdoe");
    assert_eq!(image.author_profile_url, "https://unsplash.com/@jdoe");
    assert_eq!(
        image.markdown(),
        "![Photo by jdoe(https://unsplash.com/@jdoe)](https://images.unsplash.com/full.jpg)"
    );
}

#[tokio::test]
async fn random_includes_query_when_set() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/photos/random"))
        .and(query_param("query", "snowy mountains"))
        .respond_with(ResponseTemplate::new(200).set_body_json(photo_body()))
        .expect(1)
        .mount(&server)
        .await;

    client_for_server(&server)
        .photos()
        .random(RandomPhotoRequest::new().with_query("snowy mountains"))
        .await
        .expect("request should succeed");
}

#[tokio::test]
async fn random_omits_empty_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/photos/random"))
        .respond_with(ResponseTemplate::new(200).set_body_json(photo_body()))
        .expect(2)
        .mount(&server)
        .await;

    let photos = client_for_server(&server).photos();
    photos
        .random(RandomPhotoRequest::new())
        .await
        .expect("no query");
    photos
        .random(RandomPhotoRequest::new().with_query(""))
        .await
        .expect("empty query");

    let requests = server
        .received_requests()
        .await
        .expect("should be able to read received requests");
    assert_eq!(requests.len(), 2);
    for req in requests {
        assert!(
            !req.url.query_pairs().any(|(k, _)| k == "query"),
            "query parameter should be omitted: {}",
            req.url
        );
    }
}

#[tokio::test]
async fn request_access_key_overrides_config() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/photos/random"))
        .and(header("Authorization", "Client-ID per-call-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(photo_body()))
        .expect(1)
        .mount(&server)
        .await;

    client_for_server(&server)
        .photos()
        .random(RandomPhotoRequest::new().with_access_key("per-call-key"))
        .await
        .expect("request should succeed");
}

#[tokio::test]
async fn default_headers_are_applied() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/photos/random"))
        .and(header("X-Trace", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(photo_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(Config {
        access_key: Some("k".into()),
        base_url: Some(server.uri()),
        default_headers: Some(HeaderList::new().with("X-Trace", "abc")),
        ..Default::default()
    })
    .expect("client");

    client
        .photos()
        .random(RandomPhotoRequest::new())
        .await
        .expect("request should succeed");
}

#[tokio::test]
async fn unauthorized_surfaces_api_error_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/photos/random"))
        .respond_with(
            ResponseTemplate::new(401)
                .insert_header("X-Request-Id", "req_401")
                .set_body_json(json!({ "errors": ["OAuth error: The access token is invalid"] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for_server(&server)
        .photos()
        .random(RandomPhotoRequest::new())
        .await
        .expect_err("401 should fail");

    match err {
        Error::Api(api_err) => {
            assert_eq!(api_err.status, 401);
            assert_eq!(api_err.message, "OAuth error: The access token is invalid");
            assert_eq!(api_err.request_id.as_deref(), Some("req_401"));
        }
        other => panic!("expected api error, got {:?}", other),
    }
}

#[tokio::test]
async fn server_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/photos/random"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for_server(&server)
        .photos()
        .random(RandomPhotoRequest::new())
        .await
        .expect_err("500 should fail");
    assert!(matches!(err, Error::Api(ref api) if api.status == 500));
}

#[tokio::test]
async fn malformed_json_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/photos/random"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for_server(&server)
        .photos()
        .random(RandomPhotoRequest::new())
        .await
        .expect_err("html should not decode");
    match err {
        Error::Decode(de) => assert_eq!(de.raw_body.as_deref(), Some("<html>oops</html>")),
        other => panic!("expected decode error, got {:?}", other),
    }
}

#[tokio::test]
async fn missing_fields_are_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/photos/random"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "urls": { "full": "u" }, "user": { "username": "n" } })),
        )
        .mount(&server)
        .await;

    let err = client_for_server(&server)
        .photos()
        .random(RandomPhotoRequest::new())
        .await
        .expect_err("missing links should fail");
    assert!(matches!(err, Error::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn slow_response_times_out_when_configured() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/photos/random"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(photo_body())
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = Client::new(Config {
        access_key: Some("k".into()),
        base_url: Some(server.uri()),
        timeout: Some(Duration::from_millis(50)),
        ..Default::default()
    })
    .expect("client");

    let err = client
        .photos()
        .random(RandomPhotoRequest::new())
        .await
        .expect_err("should time out");
    match err {
        Error::Transport(te) => assert_eq!(te.kind, TransportErrorKind::Timeout),
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn connection_refused_is_a_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr")
    };

    let client = Client::new(Config {
        access_key: Some("k".into()),
        base_url: Some(format!("http://{addr}")),
        ..Default::default()
    })
    .expect("client");

    let err = client
        .photos()
        .random(RandomPhotoRequest::new())
        .await
        .expect_err("nothing is listening");
    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn metrics_callback_sees_status_and_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/photos/random"))
        .respond_with(ResponseTemplate::new(200).set_body_json(photo_body()))
        .mount(&server)
        .await;

    let calls = Arc::new(Mutex::new(Vec::new()));
    let client = Client::new(Config {
        access_key: Some("k".into()),
        base_url: Some(server.uri()),
        metrics: Some(MetricsCallbacks {
            http_request: Some({
                let calls = calls.clone();
                Arc::new(move |metrics: HttpRequestMetrics| calls.lock().unwrap().push(metrics))
            }),
        }),
        ..Default::default()
    })
    .expect("client");

    client
        .photos()
        .random(RandomPhotoRequest::new().with_query("dogs"))
        .await
        .expect("request should succeed");

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].status, Some(200));
    assert_eq!(calls[0].context.path, "/photos/random");
    assert_eq!(calls[0].context.query.as_deref(), Some("dogs"));
}
