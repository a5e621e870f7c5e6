//! Token Types
//!
//! Token endpoint response, the cached token record and the expiry rules
//! shared by both token manager variants.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{HttpClientResult, TokenError};

/// Token response from a token endpoint.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Token type (usually "Bearer").
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Value of `expires_in`, kept verbatim.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Granted scope.
    #[serde(default)]
    pub scope: Option<String>,
    /// Additional fields.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// How the `expires_in` value of a cached token is compared with the clock.
///
/// `expires_in` is conventionally a lifetime in seconds. Some providers
/// return an absolute epoch instead. Both readings are available; pick one
/// explicitly per configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryPolicy {
    /// Expired once `issued_at + expires_in` is reached.
    #[default]
    RelativeToIssue,
    /// Expired once `expires_in < now` in epoch seconds. An ordinary
    /// lifetime such as `3600` is always reported as expired.
    AbsoluteTimestamp,
}

impl ExpiryPolicy {
    /// Classify a token.
    ///
    /// Fails with [`TokenError::MissingExpiry`] when no expiry value is known.
    pub fn is_expired(
        &self,
        expires_in: Option<i64>,
        issued_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> HttpClientResult<bool> {
        let expires = expires_in.ok_or(TokenError::MissingExpiry)?;

        let expired = match self {
            Self::AbsoluteTimestamp => expires < now.timestamp(),
            Self::RelativeToIssue => TimeDelta::try_seconds(expires)
                .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
                .map(|expires_at| expires_at <= now)
                .unwrap_or(false),
        };

        Ok(expired)
    }
}

/// A cached credential: anything a token manager can store and classify.
pub trait CachedToken {
    /// Access token value.
    fn access_token(&self) -> Option<String>;

    /// Refresh token, if the endpoint issued one.
    fn refresh_token(&self) -> Option<String>;

    /// Raw `expires_in` value.
    fn expires_in(&self) -> Option<i64>;

    /// When the token endpoint answered.
    fn issued_at(&self) -> DateTime<Utc>;

    /// Check expiry against an explicit clock reading.
    fn has_expired_at(&self, policy: ExpiryPolicy, now: DateTime<Utc>) -> HttpClientResult<bool> {
        policy.is_expired(self.expires_in(), self.issued_at(), now)
    }

    /// Check expiry against the system clock.
    fn has_expired(&self, policy: ExpiryPolicy) -> HttpClientResult<bool> {
        self.has_expired_at(policy, Utc::now())
    }
}

/// Token record cached by the generic-provider token manager.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StoredToken {
    pub access_token: String,
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub issued_at: DateTime<Utc>,
}

impl StoredToken {
    /// Create from token response.
    pub fn from_response(response: TokenResponse, issued_at: DateTime<Utc>) -> Self {
        Self {
            access_token: response.access_token,
            token_type: response.token_type,
            expires_in: response.expires_in,
            refresh_token: response.refresh_token,
            scope: response.scope,
            issued_at,
        }
    }

    /// Format as Authorization header value.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

impl CachedToken for StoredToken {
    fn access_token(&self) -> Option<String> {
        Some(self.access_token.clone())
    }

    fn refresh_token(&self) -> Option<String> {
        self.refresh_token.clone()
    }

    fn expires_in(&self) -> Option<i64> {
        self.expires_in
    }

    fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}
