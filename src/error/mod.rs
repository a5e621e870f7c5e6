//! Error Types
//!
//! Error hierarchy for request configuration, transport, token acquisition
//! and token storage.

use thiserror::Error;

/// Root error type for the HTTP client and its OAuth2 layer.
#[derive(Error, Debug)]
pub enum HttpClientError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl HttpClientError {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "HTTP_CONFIG",
            Self::Transport(_) => "HTTP_TRANSPORT",
            Self::Token(_) => "OAUTH2_TOKEN",
            Self::Storage(_) => "OAUTH2_STORAGE",
            Self::Provider(_) => "OAUTH2_PROVIDER",
        }
    }

    /// Check if error is retryable.
    ///
    /// Only transport failures are; an HTTP error status is a completed exchange.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_retryable(),
            Self::Provider(ProviderError::TemporarilyUnavailable) => true,
            _ => false,
        }
    }

    /// Check if the cached credential must be discarded and re-acquired.
    pub fn needs_reauth(&self) -> bool {
        matches!(
            self,
            Self::Provider(ProviderError::InvalidGrant { .. })
                | Self::Provider(ProviderError::InvalidClient { .. })
        )
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid endpoint URL: {url}")]
    InvalidEndpoint { url: String },

    #[error("Unsupported HTTP method: {method}")]
    UnsupportedMethod { method: String },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Transport-level error: no HTTP exchange completed.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to build HTTP client: {message}")]
    ClientBuild { message: String },

    #[error("No exchange completed: {message}")]
    Exhausted { message: String },
}

impl TransportError {
    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::ClientBuild { .. })
    }
}

/// Token acquisition and classification error.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token acquisition failed: {reason}")]
    AcquisitionFailed { status: Option<u16>, reason: String },

    #[error("\"expires_in\" is not set on the token")]
    MissingExpiry,

    #[error("Token response has no access_token")]
    MissingAccessToken,

    #[error("Invalid token response: {message}")]
    InvalidResponse { message: String },
}

/// Storage error.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Read failed: {message}")]
    ReadFailed { message: String },

    #[error("Write failed: {message}")]
    WriteFailed { message: String },

    #[error("Delete failed: {message}")]
    DeleteFailed { message: String },
}

/// Token endpoint error (RFC 6749 Section 5.2).
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Invalid client credentials")]
    InvalidClient { error_description: Option<String> },

    #[error("Invalid grant: {message}")]
    InvalidGrant { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Invalid scope: {scope}")]
    InvalidScope { scope: String },

    #[error("Unauthorized client for this grant type")]
    UnauthorizedClient { error_description: Option<String> },

    #[error("Unsupported grant type: {grant_type}")]
    UnsupportedGrantType { grant_type: String },

    #[error("Server error: {message}")]
    ServerError { message: String },

    #[error("Server temporarily unavailable")]
    TemporarilyUnavailable,
}

/// Result type for client operations.
pub type HttpClientResult<T> = Result<T, HttpClientError>;

/// OAuth2 error response body from a token endpoint.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct OAuth2ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error_uri: Option<String>,
}

/// Map token error response to error type.
pub fn map_token_error(response: &OAuth2ErrorResponse) -> ProviderError {
    let description = || {
        response
            .error_description
            .clone()
            .unwrap_or_else(|| response.error.clone())
    };

    match response.error.as_str() {
        "invalid_client" => ProviderError::InvalidClient {
            error_description: response.error_description.clone(),
        },
        "invalid_grant" => ProviderError::InvalidGrant {
            message: description(),
        },
        "invalid_scope" => ProviderError::InvalidScope {
            scope: response.error_description.clone().unwrap_or_default(),
        },
        "unauthorized_client" => ProviderError::UnauthorizedClient {
            error_description: response.error_description.clone(),
        },
        "unsupported_grant_type" => ProviderError::UnsupportedGrantType {
            grant_type: response.error_description.clone().unwrap_or_default(),
        },
        "server_error" => ProviderError::ServerError {
            message: description(),
        },
        "temporarily_unavailable" => ProviderError::TemporarilyUnavailable,
        _ => ProviderError::InvalidRequest {
            message: description(),
        },
    }
}

/// Create error from a token endpoint status and decoded body.
pub fn create_error_from_response(status: u16, body: &serde_json::Value) -> HttpClientError {
    if let Ok(response) = serde_json::from_value::<OAuth2ErrorResponse>(body.clone()) {
        return HttpClientError::Provider(map_token_error(&response));
    }

    let error = match status {
        400 => ProviderError::InvalidRequest {
            message: "Bad request".to_string(),
        },
        401 => ProviderError::InvalidClient {
            error_description: Some("Unauthorized".to_string()),
        },
        403 => ProviderError::UnauthorizedClient {
            error_description: Some("Forbidden".to_string()),
        },
        429 | 503 => ProviderError::TemporarilyUnavailable,
        _ => ProviderError::ServerError {
            message: format!("HTTP {}", status),
        },
    };

    HttpClientError::Provider(error)
}
