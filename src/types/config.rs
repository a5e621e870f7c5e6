//! Configuration Types
//!
//! Client credentials, endpoint selection and token manager configuration.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::ExpiryPolicy;

/// Storage namespace used when none is configured.
pub const DEFAULT_STORAGE_NAME: &str = "oauth_token";
/// Default HTTP timeout for token requests, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client credentials for OAuth2 authentication.
#[derive(Clone)]
pub struct ClientCredentials {
    /// Client identifier, also the token cache key.
    pub client_id: String,
    /// Client secret (for confidential clients).
    pub client_secret: Option<SecretString>,
    /// Client authentication method.
    pub auth_method: ClientAuthMethod,
}

impl ClientCredentials {
    /// Create credentials authenticated with HTTP Basic.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: Some(SecretString::new(client_secret.into())),
            auth_method: ClientAuthMethod::ClientSecretBasic,
        }
    }

    /// Create credentials for a public client.
    pub fn public(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            auth_method: ClientAuthMethod::None,
        }
    }

    /// Set client authentication method.
    pub fn with_auth_method(mut self, auth_method: ClientAuthMethod) -> Self {
        self.auth_method = auth_method;
        self
    }

    /// Expose the secret for request signing.
    pub fn secret(&self) -> Option<&str> {
        self.client_secret.as_ref().map(|s| s.expose_secret().as_str())
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("auth_method", &self.auth_method)
            .finish()
    }
}

/// Client authentication method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
    /// client_id and client_secret in request body.
    ClientSecretPost,
    /// HTTP Basic Authentication header.
    #[default]
    ClientSecretBasic,
    /// No client authentication (public client).
    None,
}

/// Grant used to acquire a fresh token.
#[derive(Clone, Default)]
pub enum GrantType {
    #[default]
    ClientCredentials,
    AuthorizationCode {
        code: String,
        redirect_uri: Option<String>,
        /// PKCE verifier matching the challenge sent to the authorize endpoint.
        code_verifier: Option<String>,
    },
    Password {
        username: String,
        password: SecretString,
    },
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientCredentials => "client_credentials",
            Self::AuthorizationCode { .. } => "authorization_code",
            Self::Password { .. } => "password",
        }
    }
}

impl fmt::Debug for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientCredentials => f.write_str("ClientCredentials"),
            Self::AuthorizationCode { redirect_uri, .. } => f
                .debug_struct("AuthorizationCode")
                .field("code", &"[REDACTED]")
                .field("redirect_uri", redirect_uri)
                .finish(),
            Self::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Production and sandbox base URLs with a sandbox switch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub production: String,
    #[serde(default)]
    pub sandbox: String,
    #[serde(default)]
    pub sandbox_mode: bool,
}

impl Endpoints {
    /// Create with a production URL only.
    pub fn new(production: impl Into<String>) -> Self {
        Self {
            production: production.into(),
            ..Default::default()
        }
    }

    /// Set the sandbox URL.
    pub fn with_sandbox(mut self, sandbox: impl Into<String>) -> Self {
        self.sandbox = sandbox.into();
        self
    }

    /// Enable sandbox mode.
    pub fn sandbox(mut self) -> Self {
        self.sandbox_mode = true;
        self
    }

    /// Active base URL followed by `uri`, if any.
    pub fn endpoint(&self, uri: Option<&str>) -> String {
        let base = if self.sandbox_mode {
            &self.sandbox
        } else {
            &self.production
        };
        format!("{}{}", base, uri.unwrap_or_default())
    }
}

/// PKCE challenge method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PkceMethod {
    /// SHA-256 hash (recommended).
    #[default]
    S256,
    /// Plain text (not recommended).
    Plain,
}

impl PkceMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S256 => "S256",
            Self::Plain => "plain",
        }
    }
}

/// PKCE parameters.
#[derive(Clone)]
pub struct PkceParams {
    /// Code verifier (keep secret).
    pub code_verifier: String,
    /// Code challenge (sent in authorization URL).
    pub code_challenge: String,
    /// Challenge method used.
    pub code_challenge_method: PkceMethod,
}

impl fmt::Debug for PkceParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PkceParams")
            .field("code_verifier", &"[REDACTED]")
            .field("code_challenge", &self.code_challenge)
            .field("code_challenge_method", &self.code_challenge_method)
            .finish()
    }
}

/// Generic-provider token manager configuration.
///
/// Built with [`crate::builders::OAuth2ConfigBuilder`].
#[derive(Clone, Debug)]
pub struct OAuth2Config {
    pub credentials: ClientCredentials,
    /// Token endpoint, production and sandbox.
    pub token_endpoints: Endpoints,
    /// Authorization endpoint for the authorization-code grant.
    pub authorization_endpoint: Option<String>,
    pub grant_type: GrantType,
    /// Scope passed through on every acquisition grant.
    pub scope: Option<String>,
    pub enable_pkce: bool,
    /// Namespace of the token cache.
    pub storage_name: String,
    pub expiry_policy: ExpiryPolicy,
    /// HTTP timeout in seconds.
    pub timeout: u64,
    /// Retries after transport failures.
    pub retry: u32,
}

impl OAuth2Config {
    /// Resolved (sandbox or production) token endpoint.
    pub fn token_endpoint(&self) -> String {
        self.token_endpoints.endpoint(None)
    }
}
