//! Token endpoint response envelope.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::ops::{Deref, DerefMut};

use crate::core::{TransportExchange, TransportFailure};
use crate::response::envelope::{Response, ResponseEnvelope};
use crate::types::CachedToken;

/// Envelope for a token endpoint answer.
///
/// The direct-request token manager caches the whole envelope; token fields
/// are read from the decoded body on demand.
#[derive(Clone, Debug)]
pub struct OAuth2Response {
    inner: Response,
}

impl OAuth2Response {
    fn string_attribute(&self, key: &str) -> Option<String> {
        match self.inner.attribute(key, Value::Null) {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.string_attribute("access_token")
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.string_attribute("refresh_token")
    }

    pub fn token_type(&self) -> Option<String> {
        self.string_attribute("token_type")
    }

    pub fn scope(&self) -> Option<String> {
        self.string_attribute("scope")
    }

    /// `expires_in` verbatim. Numeric strings are accepted.
    pub fn expires_in(&self) -> Option<i64> {
        match self.inner.attribute("expires_in", Value::Null) {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Unwrap into the plain envelope.
    pub fn into_inner(self) -> Response {
        self.inner
    }
}

impl From<Response> for OAuth2Response {
    fn from(inner: Response) -> Self {
        Self { inner }
    }
}

impl Deref for OAuth2Response {
    type Target = Response;

    fn deref(&self) -> &Response {
        &self.inner
    }
}

impl DerefMut for OAuth2Response {
    fn deref_mut(&mut self) -> &mut Response {
        &mut self.inner
    }
}

impl ResponseEnvelope for OAuth2Response {
    fn from_exchange(exchange: TransportExchange) -> Self {
        Response::from_exchange(exchange).into()
    }

    fn from_failure(failure: TransportFailure) -> Self {
        Response::from_failure(failure).into()
    }
}

impl CachedToken for OAuth2Response {
    fn access_token(&self) -> Option<String> {
        OAuth2Response::access_token(self)
    }

    fn refresh_token(&self) -> Option<String> {
        OAuth2Response::refresh_token(self)
    }

    fn expires_in(&self) -> Option<i64> {
        OAuth2Response::expires_in(self)
    }

    fn issued_at(&self) -> DateTime<Utc> {
        self.inner.received_at()
    }
}
