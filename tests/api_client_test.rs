//! Wiremock tests for the management API client.

use std::time::Duration;

use reqwest::StatusCode;
use vcloud_provider::{ApiClient, RetryPolicy, VCloudError};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CLUSTER: &str = "d73c6df2-f7fe-4f7c-bf70-9f94cce26430";

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(&server.uri(), CLUSTER, "test-token")
        .unwrap()
        .with_retry_policy(RetryPolicy::new().backoff_step(Duration::from_millis(10)))
}

fn cluster_path(rest: &str) -> String {
    format!("/clusters/{CLUSTER}{rest}")
}

#[tokio::test]
async fn every_request_carries_token_and_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(cluster_path("/instances/i-1")))
        .and(header("X-Provider-Token", "test-token"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client(&server).get("/instances/i-1").await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn cluster_scoped_base_url_is_not_prefixed_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/clusters/other/instances/i-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/clusters/other", server.uri());
    let client = ApiClient::new(&base, CLUSTER, "t").unwrap();
    let resp = client.get("/instances/i-1").await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn post_json_sends_serialized_body() {
    let server = MockServer::start().await;
    let body = serde_json::json!({"name": "lb", "nodes": ["10.0.0.1"]});
    Mock::given(method("POST"))
        .and(path(cluster_path("/ingresses")))
        .and(body_json(&body))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client(&server).post_json("/ingresses", &body).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn server_errors_are_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(cluster_path("/instances/i-1")))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(cluster_path("/instances/i-1")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client(&server).get("/instances/i-1").await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn final_server_error_is_returned_as_response() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(cluster_path("/ingresses/lb")))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(3)
        .mount(&server)
        .await;

    let resp = client(&server)
        .put_json("/ingresses/lb", &serde_json::json!({}))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.text().await.unwrap(), "boom");
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(cluster_path("/ingresses/lb")))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client(&server).delete("/ingresses/lb").await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client(&server).get("/instances/missing").await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn disabled_retry_makes_one_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).with_retry_policy(RetryPolicy::disabled());
    let resp = client.get("/instances/i-1").await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn transport_failure_is_transient_http_error() {
    // Nothing listens on port 1.
    let client = ApiClient::new("http://127.0.0.1:1", CLUSTER, "t")
        .unwrap()
        .with_retry_policy(RetryPolicy::new().backoff_step(Duration::from_millis(1)));

    let err = client.get("/instances/i-1").await.unwrap_err();
    assert!(matches!(err, VCloudError::Http(_)));
    assert!(err.is_transient());
}
