//! HTTP Transport
//!
//! Blocking transport interface, the reqwest implementation and a mock.
//!
//! A transport performs exactly one exchange. It either returns the raw
//! response bytes (header block followed by the body) together with
//! transport metadata, or a [`TransportFailure`] when no exchange completed.
//! An HTTP error status is a completed exchange, not a failure.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use reqwest::blocking::{multipart, Client};
use reqwest::redirect::Policy;
use thiserror::Error;
use tracing::debug;

use crate::error::{HttpClientError, TransportError};
use crate::types::{default_transport_options, HttpMethod, RequestBody, ResolvedRequest};

/// HTTP protocol version negotiated by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtocolVersion {
    None,
    Http09,
    Http10,
    Http11,
    Http2,
    Http2Tls,
    Http20,
    Http2PriorKnowledge,
    Http3,
    Http3Only,
}

impl ProtocolVersion {
    /// Human-readable version string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "HTTP/NONE",
            Self::Http09 => "HTTP/0.9",
            Self::Http10 => "HTTP/1.0",
            Self::Http11 => "HTTP/1.1",
            Self::Http2 => "HTTP/2",
            Self::Http2Tls => "HTTP/2TLS",
            Self::Http20 => "HTTP/2.0",
            Self::Http2PriorKnowledge => "HTTP/2 PRIOR KNOWLEDGE",
            Self::Http3 => "HTTP/3",
            Self::Http3Only => "HTTP/3 ONLY",
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<reqwest::Version> for ProtocolVersion {
    fn from(version: reqwest::Version) -> Self {
        match version {
            reqwest::Version::HTTP_09 => Self::Http09,
            reqwest::Version::HTTP_10 => Self::Http10,
            reqwest::Version::HTTP_11 => Self::Http11,
            reqwest::Version::HTTP_2 => Self::Http2,
            reqwest::Version::HTTP_3 => Self::Http3,
            _ => Self::None,
        }
    }
}

/// Metadata reported by the transport for one exchange.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransportInfo {
    /// HTTP status code, if a response was received.
    pub status_code: Option<u16>,
    /// Size in bytes of the header block at the start of the raw bytes.
    pub header_size: Option<usize>,
    /// Elapsed seconds.
    pub total_time: Option<f64>,
    pub protocol_version: Option<ProtocolVersion>,
}

/// Completed exchange: metadata plus header block and body bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportExchange {
    pub info: TransportInfo,
    pub raw: Vec<u8>,
    /// Transport error text reported alongside a completed exchange.
    pub error: String,
}

impl TransportExchange {
    /// Assemble an HTTP/1.1 exchange from a status, headers and body.
    pub fn from_parts(status: u16, headers: &[(&str, &str)], body: &[u8]) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("");

        let head = render_header_block("HTTP/1.1", status, reason, headers.iter().copied());
        let header_size = head.len();
        let mut raw = head.into_bytes();
        raw.extend_from_slice(body);

        Self {
            info: TransportInfo {
                status_code: Some(status),
                header_size: Some(header_size),
                total_time: None,
                protocol_version: Some(ProtocolVersion::Http11),
            },
            raw,
            error: String::new(),
        }
    }
}

/// No exchange completed (connection refused, DNS, socket timeout, ...).
#[derive(Error, Clone, Debug, PartialEq)]
#[error("{message}")]
pub struct TransportFailure {
    pub info: TransportInfo,
    pub message: String,
}

impl TransportFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            info: TransportInfo::default(),
            message: message.into(),
        }
    }
}

impl From<TransportFailure> for HttpClientError {
    fn from(failure: TransportFailure) -> Self {
        HttpClientError::Transport(TransportError::Exhausted {
            message: failure.message,
        })
    }
}

/// Blocking HTTP transport interface (for dependency injection).
pub trait Transport: Send + Sync {
    /// Perform one HTTP exchange.
    fn execute(&self, request: &ResolvedRequest) -> Result<TransportExchange, TransportFailure>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: &ResolvedRequest) -> Result<TransportExchange, TransportFailure> {
        (**self).execute(request)
    }
}

fn render_header_block<'a>(
    version: &str,
    status: u16,
    reason: &str,
    headers: impl Iterator<Item = (&'a str, &'a str)>,
) -> String {
    let mut head = format!("{} {} {}\r\n", version, status, reason);
    for (name, value) in headers {
        head.push_str(name);
        head.push_str(": ");
        head.push_str(value);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");
    head
}

/// Default reqwest-based blocking transport.
///
/// Requests carrying the default options and no connect timeout share one
/// pooled client; others get a client built for their options.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create transport with default options.
    pub fn new() -> Result<Self, HttpClientError> {
        let defaults = ResolvedRequest {
            method: HttpMethod::Get,
            url: String::new(),
            headers: Default::default(),
            body: None,
            timeout: None,
            connect_timeout: None,
            options: default_transport_options(),
        };

        let client = Self::build_client(&defaults).map_err(|e| TransportError::ClientBuild {
            message: e.to_string(),
        })?;

        Ok(Self::with_client(client))
    }

    /// Create transport around an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn build_client(request: &ResolvedRequest) -> reqwest::Result<Client> {
        let redirect = if request.option_bool("follow_redirects").unwrap_or(false) {
            let max = request.option_u64("max_redirects").unwrap_or(10);
            Policy::limited(usize::try_from(max).unwrap_or(usize::MAX))
        } else {
            Policy::none()
        };

        let mut builder = Client::builder().redirect(redirect);

        if let Some(user_agent) = request.option_str("user_agent") {
            builder = builder.user_agent(user_agent);
        }
        if request.option_bool("accept_invalid_certs") == Some(true) {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(connect_timeout) = request.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        builder.build()
    }

    fn method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Options => reqwest::Method::OPTIONS,
        }
    }

    fn failure(error: reqwest::Error, started: Instant) -> TransportFailure {
        let message = if error.is_timeout() {
            format!("Request timed out: {}", error)
        } else if error.is_connect() {
            format!("Connection failed: {}", error)
        } else {
            error.to_string()
        };

        TransportFailure {
            info: TransportInfo {
                total_time: Some(started.elapsed().as_secs_f64()),
                ..Default::default()
            },
            message,
        }
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: &ResolvedRequest) -> Result<TransportExchange, TransportFailure> {
        let started = Instant::now();

        let dedicated = request.connect_timeout.is_some()
            || request.options != default_transport_options();
        let client = if dedicated {
            debug!(url = %request.url, "Building dedicated client for transport options");
            Self::build_client(request).map_err(|e| Self::failure(e, started))?
        } else {
            self.client.clone()
        };

        let is_multipart = matches!(request.body, Some(RequestBody::FormData(_)));
        let mut builder = client.request(Self::method(request.method), &request.url);

        for (name, value) in &request.headers {
            // reqwest writes the multipart content type with its boundary.
            if is_multipart && name.eq_ignore_ascii_case("content-type") {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match &request.body {
            Some(RequestBody::Raw(body)) => builder.body(body.clone()),
            Some(RequestBody::FormData(fields)) => {
                let form = fields.iter().fold(multipart::Form::new(), |form, (k, v)| {
                    form.text(k.clone(), v.clone())
                });
                builder.multipart(form)
            }
            None => builder,
        };

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().map_err(|e| Self::failure(e, started))?;

        let status = response.status();
        let version = response.version();
        let header_values: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let head = render_header_block(
            &format!("{:?}", version),
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            header_values.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        );

        let body = response.bytes().map_err(|e| Self::failure(e, started))?;

        let header_size = head.len();
        let mut raw = head.into_bytes();
        raw.extend_from_slice(&body);

        Ok(TransportExchange {
            info: TransportInfo {
                status_code: Some(status.as_u16()),
                header_size: Some(header_size),
                total_time: Some(started.elapsed().as_secs_f64()),
                protocol_version: Some(version.into()),
            },
            raw,
            error: String::new(),
        })
    }
}

/// Mock HTTP transport for testing.
///
/// Outcomes are returned in the order they were queued.
#[derive(Default)]
pub struct MockTransport {
    outcomes: Mutex<VecDeque<Result<TransportExchange, TransportFailure>>>,
    request_history: Mutex<Vec<ResolvedRequest>>,
    default_outcome: Mutex<Option<Result<TransportExchange, TransportFailure>>>,
}

impl MockTransport {
    /// Create new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a completed exchange.
    pub fn queue_exchange(&self, exchange: TransportExchange) -> &Self {
        self.outcomes.lock().unwrap().push_back(Ok(exchange));
        self
    }

    /// Queue a JSON response.
    pub fn queue_json_response(&self, status: u16, body: &serde_json::Value) -> &Self {
        let body = body.to_string();
        self.queue_exchange(TransportExchange::from_parts(
            status,
            &[("Content-Type", "application/json")],
            body.as_bytes(),
        ))
    }

    /// Queue a transport failure.
    pub fn queue_failure(&self, message: &str) -> &Self {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Err(TransportFailure::new(message)));
        self
    }

    /// Set outcome used once the queue is empty.
    pub fn set_default_outcome(&self, outcome: Result<TransportExchange, TransportFailure>) -> &Self {
        *self.default_outcome.lock().unwrap() = Some(outcome);
        self
    }

    /// Get request history.
    pub fn get_requests(&self) -> Vec<ResolvedRequest> {
        self.request_history.lock().unwrap().clone()
    }

    /// Get last request.
    pub fn get_last_request(&self) -> Option<ResolvedRequest> {
        self.request_history.lock().unwrap().last().cloned()
    }

    /// Number of `execute` calls so far.
    pub fn attempt_count(&self) -> usize {
        self.request_history.lock().unwrap().len()
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: &ResolvedRequest) -> Result<TransportExchange, TransportFailure> {
        self.request_history.lock().unwrap().push(request.clone());

        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .or_else(|| self.default_outcome.lock().unwrap().clone());

        outcome.unwrap_or_else(|| Err(TransportFailure::new("No mock response available")))
    }
}

/// Create mock HTTP transport for testing.
pub fn create_mock_transport() -> MockTransport {
    MockTransport::new()
}
