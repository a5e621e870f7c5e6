//! Token Endpoint Client
//!
//! RFC 6749 token requests (client credentials, authorization code,
//! password and refresh grants) sent through [`HttpClient`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use secrecy::ExposeSecret;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::core::{ReqwestTransport, Transport};
use crate::error::{create_error_from_response, HttpClientResult, TokenError, TransportError};
use crate::request::HttpClient;
use crate::types::{ClientAuthMethod, ClientCredentials, GrantType, OAuth2Config, TokenResponse};

/// Standards OAuth2 token endpoint interface (for dependency injection).
pub trait TokenEndpointClient: Send + Sync {
    /// Perform `grant`, passing `scope` through when set.
    fn request_token(
        &self,
        grant: &GrantType,
        scope: Option<&str>,
    ) -> HttpClientResult<TokenResponse>;

    /// Exchange a refresh token for a new token.
    fn refresh_token(&self, refresh_token: &str) -> HttpClientResult<TokenResponse>;
}

/// Token endpoint client over HTTP.
pub struct HttpTokenEndpoint<T: Transport = ReqwestTransport> {
    credentials: ClientCredentials,
    token_endpoint: String,
    timeout: u64,
    retry: u32,
    transport: Arc<T>,
}

impl HttpTokenEndpoint {
    /// Create a client for the configured (sandbox or production) endpoint.
    pub fn new(config: &OAuth2Config) -> HttpClientResult<Self> {
        Ok(Self::with_transport(config, Arc::new(ReqwestTransport::new()?)))
    }
}

impl<T: Transport> HttpTokenEndpoint<T> {
    pub fn with_transport(config: &OAuth2Config, transport: Arc<T>) -> Self {
        Self {
            credentials: config.credentials.clone(),
            token_endpoint: config.token_endpoint(),
            timeout: config.timeout,
            retry: config.retry,
            transport,
        }
    }

    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint
    }

    fn grant_params(grant: &GrantType, scope: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![("grant_type", grant.as_str().to_string())];

        match grant {
            GrantType::ClientCredentials => {}
            GrantType::AuthorizationCode {
                code,
                redirect_uri,
                code_verifier,
            } => {
                params.push(("code", code.clone()));
                if let Some(uri) = redirect_uri {
                    params.push(("redirect_uri", uri.clone()));
                }
                if let Some(verifier) = code_verifier {
                    params.push(("code_verifier", verifier.clone()));
                }
            }
            GrantType::Password { username, password } => {
                params.push(("username", username.clone()));
                params.push(("password", password.expose_secret().clone()));
            }
        }

        if let Some(scope) = scope.filter(|s| !s.is_empty()) {
            params.push(("scope", scope.to_string()));
        }

        params
    }

    fn exchange(&self, mut params: Vec<(&'static str, String)>) -> HttpClientResult<TokenResponse> {
        let mut client = HttpClient::with_transport(Arc::clone(&self.transport))
            .with_base_uri(self.token_endpoint.as_str())
            .with_header("Accept", "application/json")
            .timeout(self.timeout)
            .retry(self.retry);

        match self.credentials.auth_method {
            ClientAuthMethod::ClientSecretBasic => {
                let secret = self.credentials.secret().unwrap_or_default();
                let encoded = STANDARD.encode(format!("{}:{}", self.credentials.client_id, secret));
                client = client.with_header("Authorization", format!("Basic {}", encoded));
            }
            ClientAuthMethod::ClientSecretPost => {
                params.push(("client_id", self.credentials.client_id.clone()));
                if let Some(secret) = self.credentials.secret() {
                    params.push(("client_secret", secret.to_string()));
                }
            }
            ClientAuthMethod::None => {
                params.push(("client_id", self.credentials.client_id.clone()));
            }
        }

        let response = client.url_encoded(params).post();

        if response.is_failed() {
            return Err(TransportError::Exhausted {
                message: response.message(),
            }
            .into());
        }

        let status = response.status_code().unwrap_or_default();
        debug!(status, endpoint = %self.token_endpoint, "Token endpoint answered");

        if !response.ok() {
            return Err(create_error_from_response(status, response.attributes()));
        }

        if response.attribute("access_token", Value::Null).is_null() {
            return Err(TokenError::MissingAccessToken.into());
        }

        serde_json::from_value(response.attributes().clone()).map_err(|e| {
            TokenError::InvalidResponse {
                message: e.to_string(),
            }
            .into()
        })
    }
}

impl<T: Transport> TokenEndpointClient for HttpTokenEndpoint<T> {
    fn request_token(
        &self,
        grant: &GrantType,
        scope: Option<&str>,
    ) -> HttpClientResult<TokenResponse> {
        self.exchange(Self::grant_params(grant, scope))
    }

    fn refresh_token(&self, refresh_token: &str) -> HttpClientResult<TokenResponse> {
        self.exchange(vec![
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", refresh_token.to_string()),
        ])
    }
}

/// Mock token endpoint for testing.
///
/// Returns queued results in order, then a default token.
#[derive(Default)]
pub struct MockTokenEndpoint {
    results: Mutex<VecDeque<HttpClientResult<TokenResponse>>>,
    grant_history: Mutex<Vec<(GrantType, Option<String>)>>,
    refresh_history: Mutex<Vec<String>>,
}

impl MockTokenEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next request or refresh.
    pub fn queue_result(&self, result: HttpClientResult<TokenResponse>) -> &Self {
        self.results.lock().unwrap().push_back(result);
        self
    }

    /// Grants requested so far, with their scope.
    pub fn get_grant_history(&self) -> Vec<(GrantType, Option<String>)> {
        self.grant_history.lock().unwrap().clone()
    }

    /// Refresh tokens exchanged so far.
    pub fn get_refresh_history(&self) -> Vec<String> {
        self.refresh_history.lock().unwrap().clone()
    }

    fn next_result(&self) -> HttpClientResult<TokenResponse> {
        self.results.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(TokenResponse {
                access_token: "mock-access-token".to_string(),
                token_type: "Bearer".to_string(),
                expires_in: Some(3600),
                refresh_token: Some("mock-refresh-token".to_string()),
                scope: None,
                extra: HashMap::new(),
            })
        })
    }
}

impl TokenEndpointClient for MockTokenEndpoint {
    fn request_token(
        &self,
        grant: &GrantType,
        scope: Option<&str>,
    ) -> HttpClientResult<TokenResponse> {
        self.grant_history
            .lock()
            .unwrap()
            .push((grant.clone(), scope.map(str::to_string)));
        self.next_result()
    }

    fn refresh_token(&self, refresh_token: &str) -> HttpClientResult<TokenResponse> {
        self.refresh_history
            .lock()
            .unwrap()
            .push(refresh_token.to_string());
        self.next_result()
    }
}
