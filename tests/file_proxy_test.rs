//! Integration tests for the /proxy/file route.

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use bitable_catalog::catalog::proxy_url;
use bitable_catalog::config::Config;
use bitable_catalog::proxy::etag_for;
use bitable_catalog::web::{create_app, AppState};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{header as header_matcher, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_PATH: &str = "/auth/v3/tenant_access_token/internal";

fn app_for(config: &Config) -> Router {
    create_app(AppState::from_config(config).expect("Failed to build state"))
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "tenant_access_token": "t-file",
            "expire": 7200
        })))
        .mount(server)
        .await;
}

async fn get(app: Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_missing_url_is_bad_request() {
    let server = MockServer::start().await;
    let app = app_for(&Config::for_testing(&server.uri()));

    let response = get(app.clone(), "/proxy/file").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, "Missing url parameter");

    let response = get(app, "/proxy/file?url=").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_streams_upstream_file() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/files/a.png"))
        .and(query_param("x", "1"))
        .and(query_param("y", "2"))
        .and(header_matcher("Authorization", "Bearer t-file"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"abc".to_vec(), "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    let original = format!("{}/files/a.png?x=1&y=2", server.uri());
    let app = app_for(&Config::for_testing(&server.uri()));

    let response = get(app, &proxy_url(&original)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(
        headers[header::CACHE_CONTROL],
        "public, max-age=86400, immutable"
    );
    assert_eq!(headers[header::ETAG], etag_for(&original).as_str());
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(body_string(response).await, "abc");
}

#[tokio::test]
async fn test_missing_content_type_defaults_to_octet_stream() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/files/blob"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
        .mount(&server)
        .await;

    let original = format!("{}/files/blob", server.uri());
    let app = app_for(&Config::for_testing(&server.uri()));

    let response = get(app, &proxy_url(&original)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
}

#[tokio::test]
async fn test_upstream_404_is_server_error() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/files/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let original = format!("{}/files/missing.png", server.uri());
    let app = app_for(&Config::for_testing(&server.uri()));

    let response = get(app, &proxy_url(&original)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_string(response).await;
    assert!(body.contains("File download failed"), "body: {body}");
    assert!(body.contains("404"), "body: {body}");
}

#[tokio::test]
async fn test_token_failure_is_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 10003})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/a.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let original = format!("{}/files/a.png", server.uri());
    let app = app_for(&Config::for_testing(&server.uri()));

    let response = get(app, &proxy_url(&original)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(response).await.contains("10003"));
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/files/slow.mp4"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let config = Config {
        file_proxy_timeout: Duration::from_secs(1),
        ..Config::for_testing(&server.uri())
    };
    let original = format!("{}/files/slow.mp4", server.uri());

    let response = get(app_for(&config), &proxy_url(&original)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(response).await.contains("within 1s"));
}

#[tokio::test]
async fn test_matching_if_none_match_skips_upstream() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/files/a.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let original = format!("{}/files/a.png", server.uri());
    let app = app_for(&Config::for_testing(&server.uri()));

    let response = app
        .oneshot(
            Request::builder()
                .uri(proxy_url(&original))
                .header(header::IF_NONE_MATCH, etag_for(&original))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(response.headers()[header::ETAG], etag_for(&original).as_str());
}

#[tokio::test]
async fn test_files_on_other_hosts_are_proxied_by_default() {
    let api = MockServer::start().await;
    mount_token(&api).await;
    let files = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cdn/a.png"))
        .and(header_matcher("Authorization", "Bearer t-file"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"png".to_vec(), "image/png"))
        .expect(1)
        .mount(&files)
        .await;
    Mock::given(method("GET"))
        .and(path("/cdn/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&files)
        .await;

    let app = app_for(&Config::for_testing(&api.uri()));

    let response = get(app.clone(), &proxy_url(&format!("{}/cdn/a.png", files.uri()))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "png");

    let response = get(app, &proxy_url(&format!("{}/cdn/gone.png", files.uri()))).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(response).await.contains("404"));
}

#[tokio::test]
async fn test_non_http_scheme_is_rejected() {
    let server = MockServer::start().await;
    let app = app_for(&Config::for_testing(&server.uri()));

    let response = get(app, &proxy_url("file:///etc/passwd")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_foreign_host_is_rejected_when_hosts_are_listed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = Config {
        extra_proxy_hosts: vec!["files.example.com".to_string()],
        ..Config::for_testing(&server.uri())
    };
    let app = app_for(&config);

    let response = get(app, &proxy_url("https://attacker.example/steal")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response).await.contains("attacker.example"));
}

#[tokio::test]
async fn test_api_host_stays_allowed_when_hosts_are_listed() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/files/a.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"ok".to_vec(), "image/png"))
        .mount(&server)
        .await;

    let config = Config {
        extra_proxy_hosts: vec!["files.example.com".to_string()],
        ..Config::for_testing(&server.uri())
    };
    let original = format!("{}/files/a.png", server.uri());

    let response = get(app_for(&config), &proxy_url(&original)).await;
    assert_eq!(response.status(), StatusCode::OK);
}
