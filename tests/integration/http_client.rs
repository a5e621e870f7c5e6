//! Integration tests for the request façade

use super::*;
use http_client_integration::HttpClient;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, body_string, header, header_regex, method, path, query_param};
use wiremock::Mock;

#[tokio::test(flavor = "multi_thread")]
async fn test_get_with_query_and_wildcard_attributes() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "10"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(success_response(json!({
            "data": [
                {"name": "ada", "tags": ["admin", "ops"]},
                {"name": "grace", "tags": ["dev"]}
            ],
            "meta": {"total": 2}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = format!("{}/users", mock_server.uri());
    blocking(move || {
        let response = HttpClient::new()
            .unwrap()
            .with_base_uri(uri)
            .bearer_token("test-token")
            .query([("page", "1")])
            .get([("page", "2"), ("limit", "10")]);

        assert!(response.ok());
        assert_eq!(response.status_code(), Some(200));
        assert_eq!(response.protocol_version(), "HTTP/1.1");
        assert!(response
            .header_line("content-type")
            .unwrap_or_default()
            .contains("application/json"));
        assert_eq!(response.attribute("meta.total", json!(0)), json!(2));
        assert_eq!(
            response.attribute("data.*.name", json!(null)),
            json!(["ada", "grace"])
        );
        assert_eq!(
            response.attribute("data.*.tags", json!(null)),
            json!(["admin", "ops", "dev"])
        );
        assert_eq!(response.attribute("data.missing", json!("none")), json!("none"));
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_post_json_body() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/items"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({"name": "widget", "count": 3})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 7})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = format!("{}/items", mock_server.uri());
    blocking(move || {
        let response = HttpClient::new()
            .unwrap()
            .with_base_uri(uri)
            .json(&json!({"name": "widget", "count": 3}))
            .unwrap()
            .post();

        assert!(response.ok());
        assert_eq!(response.status_code(), Some(201));
        assert_eq!(response.message(), "Created");
        assert_eq!(response.attribute_as::<u64>("id"), Some(7));
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_put_url_encoded_body() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("PUT"))
        .and(path("/settings"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string("theme=dark&lang=en"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = format!("{}/settings", mock_server.uri());
    blocking(move || {
        let response = HttpClient::new()
            .unwrap()
            .with_base_uri(uri)
            .url_encoded([("theme", "dark"), ("lang", "en")])
            .put();

        assert!(response.ok());
        assert_eq!(response.status_code(), Some(204));
        assert_eq!(response.attributes(), &json!({}));
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_multipart_form_sets_boundary() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header_regex("content-type", "^multipart/form-data; boundary=.+"))
        .respond_with(success_response(json!({"stored": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = format!("{}/upload", mock_server.uri());
    blocking(move || {
        let response = HttpClient::new()
            .unwrap()
            .with_base_uri(uri)
            .form_data([("title", "report"), ("owner", "ops")])
            .post();

        assert!(response.ok());
        assert_eq!(response.attribute("stored", json!(false)), json!(true));
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_graphql_request() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_json(json!({
            "query": "query($id: ID!) { user(id: $id) { name } }",
            "variables": {"id": "42"}
        })))
        .respond_with(success_response(json!({"data": {"user": {"name": "ada"}}})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = format!("{}/graphql", mock_server.uri());
    blocking(move || {
        let response = HttpClient::new()
            .unwrap()
            .with_base_uri(uri)
            .graphql(
                "query($id: ID!) { user(id: $id) { name } }",
                json!({"id": "42"}),
            )
            .post();

        assert_eq!(response.attribute("data.user.name", json!(null)), json!("ada"));
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_http_error_status_is_not_retried() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(error_response(500, json!({"error": "boom"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = format!("{}/broken", mock_server.uri());
    blocking(move || {
        let response = HttpClient::new()
            .unwrap()
            .with_base_uri(uri)
            .retry(3)
            .request();

        assert!(!response.ok());
        assert!(!response.is_failed());
        assert_eq!(response.status_code(), Some(500));
        assert_eq!(response.message(), "Internal Server Error");
        assert_eq!(response.attribute("error", json!(null)), json!("boom"));
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_redirect_returned_by_default() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/new"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(success_response(json!({"moved": true})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let uri = format!("{}/old", mock_server.uri());
    blocking(move || {
        let response = HttpClient::new().unwrap().with_base_uri(uri).request();

        assert!(!response.ok());
        assert_eq!(response.status_code(), Some(302));
        assert_eq!(response.message(), "Found");
        assert_eq!(response.header_line("location"), Some("/new"));
        assert_eq!(response.attribute("moved", json!(false)), json!(false));
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_redirect_followed_when_enabled() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/new"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(success_response(json!({"moved": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = format!("{}/old", mock_server.uri());
    blocking(move || {
        let response = HttpClient::new()
            .unwrap()
            .with_base_uri(uri)
            .with_options([("follow_redirects", json!(true))])
            .request();

        assert_eq!(response.status_code(), Some(200));
        assert_eq!(response.attribute("moved", json!(false)), json!(true));
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_timeout_produces_failed_envelope() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(success_response(json!({})).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let uri = format!("{}/slow", mock_server.uri());
    blocking(move || {
        let response = HttpClient::new()
            .unwrap()
            .with_base_uri(uri)
            .timeout(1)
            .request();

        assert!(response.is_failed());
        assert!(!response.ok());
        assert_eq!(response.status_code(), None);
        assert!(response.message().contains("timed out"));
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connection_failure_is_retried_then_reported() {
    blocking(|| {
        // Port 9 (discard) is closed on test hosts.
        let response = HttpClient::new()
            .unwrap()
            .with_base_uri("http://127.0.0.1:9/unreachable")
            .connect_timeout(1)
            .retry(2)
            .request();

        assert!(response.is_failed());
        assert_eq!(response.status_code(), None);
        assert!(!response.message().is_empty());
    })
    .await;
}
