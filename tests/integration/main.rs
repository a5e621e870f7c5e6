//! Integration tests using WireMock
//!
//! These tests drive the blocking client against a mock HTTP server. The
//! client is created, used and dropped inside `spawn_blocking` so it never
//! runs on the async runtime threads.

pub mod http_client;
pub mod oauth2;

use wiremock::{MockServer, ResponseTemplate};

/// Helper to create a mock server
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Run blocking client code off the runtime.
pub async fn blocking<F, T>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .expect("blocking task panicked")
}

/// Helper to create success response templates
pub fn success_response(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

/// Helper to create error response templates
pub fn error_response(status: u16, error_body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(error_body)
}
