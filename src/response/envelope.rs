//! Response Envelope
//!
//! Wraps the raw output of one transport exchange. Headers and the decoded
//! JSON body are derived lazily and memoized per envelope.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, OnceLock};

use crate::core::{ProtocolVersion, TransportExchange, TransportFailure, TransportInfo};
use crate::response::decoder::{BodyDecoder, JsonBodyDecoder};
use crate::response::path;

/// Returned when the transport reported no protocol version.
pub const UNKNOWN_PROTOCOL_VERSION: &str = "Unknown";

/// Construction contract for types an [`crate::HttpClient`] can return.
pub trait ResponseEnvelope: Sized {
    /// Wrap a completed exchange, whatever its HTTP status.
    fn from_exchange(exchange: TransportExchange) -> Self;

    /// Wrap the last failure once every attempt failed at the transport level.
    fn from_failure(failure: TransportFailure) -> Self;
}

/// Default response envelope.
#[derive(Clone, Debug)]
pub struct Response {
    info: TransportInfo,
    /// `None` marks an envelope whose attempts all failed.
    raw: Option<Vec<u8>>,
    error: String,
    status: Option<u16>,
    reason: Option<String>,
    received_at: DateTime<Utc>,
    headers: OnceLock<IndexMap<String, String>>,
    attributes: OnceLock<Value>,
    decoder: Arc<dyn BodyDecoder>,
}

impl Response {
    fn new(info: TransportInfo, raw: Option<Vec<u8>>, error: String) -> Self {
        let status = if raw.is_some() { info.status_code } else { None };

        Self {
            info,
            raw,
            error,
            status,
            reason: None,
            received_at: Utc::now(),
            headers: OnceLock::new(),
            attributes: OnceLock::new(),
            decoder: Arc::new(JsonBodyDecoder),
        }
    }

    /// Replace the body decoder. Discards previously decoded attributes.
    pub fn with_decoder(mut self, decoder: Arc<dyn BodyDecoder>) -> Self {
        self.decoder = decoder;
        self.attributes = OnceLock::new();
        self
    }

    /// Status in [200, 300).
    pub fn ok(&self) -> bool {
        matches!(self.status, Some(200..=299))
    }

    pub fn has_error(&self) -> bool {
        !self.ok()
    }

    /// Every attempt failed before an exchange completed.
    pub fn is_failed(&self) -> bool {
        self.raw.is_none()
    }

    /// HTTP status, `None` for a failed envelope.
    pub fn status_code(&self) -> Option<u16> {
        self.status
    }

    /// Transport error text if any, else the status reason phrase.
    pub fn message(&self) -> String {
        if !self.error.is_empty() {
            return self.error.clone();
        }
        self.reason_phrase()
    }

    /// Reason phrase set with [`Self::with_status`], else the canonical one.
    pub fn reason_phrase(&self) -> String {
        if let Some(reason) = &self.reason {
            return reason.clone();
        }

        self.status
            .and_then(|code| reqwest::StatusCode::from_u16(code).ok())
            .and_then(|status| status.canonical_reason())
            .unwrap_or_default()
            .to_string()
    }

    /// Override the status. An empty reason falls back to the canonical one.
    pub fn with_status(&mut self, code: u16, reason: impl Into<String>) -> &mut Self {
        let reason = reason.into();
        self.status = Some(code);
        self.reason = (!reason.is_empty()).then_some(reason);
        self
    }

    /// When the envelope was created.
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Transport metadata of the wrapped attempt.
    pub fn info(&self) -> &TransportInfo {
        &self.info
    }

    /// Elapsed seconds, 0 when unknown.
    pub fn total_time(&self) -> f64 {
        self.info.total_time.unwrap_or(0.0)
    }

    pub fn protocol_version(&self) -> &'static str {
        self.info
            .protocol_version
            .map(|version| version.as_str())
            .unwrap_or(UNKNOWN_PROTOCOL_VERSION)
    }

    pub fn with_protocol_version(&mut self, version: ProtocolVersion) -> &mut Self {
        self.info.protocol_version = Some(version);
        self
    }

    fn header_size(&self) -> Option<usize> {
        let raw = self.raw.as_ref()?;
        self.info.header_size.filter(|size| *size <= raw.len())
    }

    /// Bytes following the header block.
    ///
    /// Empty unless the transport reported where the header block ends.
    pub fn body(&self) -> &[u8] {
        match (&self.raw, self.header_size()) {
            (Some(raw), Some(size)) => &raw[size..],
            _ => &[],
        }
    }

    /// Body as text, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(self.body()).into_owned()
    }

    fn parse_headers(&self) -> IndexMap<String, String> {
        let mut headers = IndexMap::new();

        let (Some(raw), Some(size)) = (&self.raw, self.header_size()) else {
            return headers;
        };

        let block = String::from_utf8_lossy(&raw[..size]);
        for line in block.split("\r\n") {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            headers
                .entry(key.to_string())
                .or_insert_with(|| value.trim().to_string());
        }

        headers
    }

    /// Parsed headers; the first occurrence of a repeated key wins.
    pub fn headers(&self) -> &IndexMap<String, String> {
        self.headers.get_or_init(|| self.parse_headers())
    }

    fn header_key(&self, name: &str) -> Option<&String> {
        self.headers()
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
    }

    /// Case-insensitive header presence check.
    pub fn has_header(&self, name: &str) -> bool {
        self.header_key(name).is_some()
    }

    /// Header values split on commas.
    pub fn header(&self, name: &str) -> Vec<String> {
        self.header_line(name)
            .map(|line| line.split(',').map(|v| v.trim().to_string()).collect())
            .unwrap_or_default()
    }

    /// Raw header value.
    pub fn header_line(&self, name: &str) -> Option<&str> {
        let key = self.header_key(name)?;
        self.headers().get(key).map(String::as_str)
    }

    fn update_headers(&mut self, update: impl FnOnce(&mut IndexMap<String, String>)) {
        let mut headers = match self.headers.take() {
            Some(headers) => headers,
            None => self.parse_headers(),
        };
        update(&mut headers);
        self.headers = OnceLock::from(headers);
    }

    /// Replace a header.
    pub fn with_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.update_headers(|headers| {
            headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
            headers.insert(name.to_string(), value.to_string());
        });
        self
    }

    /// Append to an existing header as `existing,value`, or add it.
    pub fn with_added_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.update_headers(|headers| {
            match headers
                .iter_mut()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
            {
                Some((_, existing)) => {
                    existing.push(',');
                    existing.push_str(value);
                }
                None => {
                    headers.insert(name.to_string(), value.to_string());
                }
            }
        });
        self
    }

    pub fn without_header(&mut self, name: &str) -> &mut Self {
        self.update_headers(|headers| {
            headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
        });
        self
    }

    /// Decoded body: an object or array, empty object when undecodable.
    pub fn attributes(&self) -> &Value {
        self.attributes
            .get_or_init(|| self.decoder.decode(self.body()))
    }

    /// Resolve a dot-path against the decoded body.
    pub fn attribute(&self, path: &str, default: Value) -> Value {
        path::resolve(self.attributes(), path, &default)
    }

    /// Resolve a dot-path and deserialize the result.
    pub fn attribute_as<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        match self.attribute(path, Value::Null) {
            Value::Null => None,
            value => serde_json::from_value(value).ok(),
        }
    }
}

impl ResponseEnvelope for Response {
    fn from_exchange(exchange: TransportExchange) -> Self {
        Self::new(exchange.info, Some(exchange.raw), exchange.error)
    }

    fn from_failure(failure: TransportFailure) -> Self {
        Self::new(failure.info, None, failure.message)
    }
}
