//! Request Types
//!
//! Request descriptor accumulated by the builder and the resolved request
//! handed to a transport.

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConfigurationError, HttpClientError};

/// Default content type.
pub const CONTENT_TYPE_JSON: &str = "application/json";
/// Content type set by URL-encoded form bodies.
pub const CONTENT_TYPE_FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
/// Content type set by structured form bodies.
pub const CONTENT_TYPE_MULTIPART: &str = "multipart/form-data";

/// User agent sent unless overridden through transport options.
pub const DEFAULT_USER_AGENT: &str = concat!("http-client-integration/", env!("CARGO_PKG_VERSION"));

/// HTTP method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Whether a configured body is attached when sending with this method.
    pub fn sends_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch | Self::Delete)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = HttpClientError;

    /// Parse a method name, normalizing it to upper case first.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            other => Err(ConfigurationError::UnsupportedMethod {
                method: other.to_string(),
            }
            .into()),
        }
    }
}

/// Request body payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestBody {
    /// Pre-encoded body sent as-is.
    Raw(String),
    /// Structured form fields, sent as `multipart/form-data`.
    FormData(IndexMap<String, String>),
}

/// Transport option overrides, keyed by option name.
pub type TransportOptions = IndexMap<String, Value>;

/// Built-in transport options; caller overrides are merged over these.
pub fn default_transport_options() -> TransportOptions {
    let mut options = TransportOptions::new();
    options.insert("follow_redirects".to_string(), Value::Bool(false));
    options.insert("max_redirects".to_string(), Value::from(10));
    options.insert(
        "user_agent".to_string(),
        Value::String(DEFAULT_USER_AGENT.to_string()),
    );
    options
}

/// Request configuration accumulated by [`crate::HttpClient`].
#[derive(Clone, Debug, PartialEq)]
pub struct RequestDescriptor {
    /// Target URI without the query string built from `query`.
    pub base_uri: String,
    pub method: HttpMethod,
    pub query: IndexMap<String, String>,
    /// Header keys are kept exactly as supplied.
    pub headers: IndexMap<String, String>,
    pub body: Option<RequestBody>,
    /// Active content type, injected as `Content-Type` at send time.
    pub content_type: String,
    /// Total timeout in seconds, 0 lets the transport decide.
    pub timeout: u64,
    /// Connect timeout in seconds, 0 lets the transport decide.
    pub connect_timeout: u64,
    /// Extra attempts after a transport failure.
    pub retry: u32,
    pub options: TransportOptions,
}

impl Default for RequestDescriptor {
    fn default() -> Self {
        Self {
            base_uri: String::new(),
            method: HttpMethod::Get,
            query: IndexMap::new(),
            headers: IndexMap::new(),
            body: None,
            content_type: CONTENT_TYPE_JSON.to_string(),
            timeout: 0,
            connect_timeout: 0,
            retry: 0,
            options: default_transport_options(),
        }
    }
}

/// Fully resolved request for a single transport call.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: IndexMap<String, String>,
    pub body: Option<RequestBody>,
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub options: TransportOptions,
}

impl ResolvedRequest {
    /// Read a boolean transport option.
    pub fn option_bool(&self, key: &str) -> Option<bool> {
        self.options.get(key).and_then(Value::as_bool)
    }

    /// Read an unsigned transport option.
    pub fn option_u64(&self, key: &str) -> Option<u64> {
        self.options.get(key).and_then(Value::as_u64)
    }

    /// Read a string transport option.
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }
}
