//! Configuration Builder
//!
//! Fluent builder for the generic-provider token manager configuration.

use secrecy::SecretString;
use url::Url;

use crate::error::{ConfigurationError, HttpClientResult};
use crate::types::{
    ClientAuthMethod, ClientCredentials, Endpoints, ExpiryPolicy, GrantType, OAuth2Config,
    DEFAULT_STORAGE_NAME, DEFAULT_TIMEOUT_SECS,
};

/// OAuth2 configuration builder.
#[derive(Default)]
pub struct OAuth2ConfigBuilder {
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    auth_method: Option<ClientAuthMethod>,
    token_endpoint: Option<String>,
    sandbox_token_endpoint: Option<String>,
    sandbox_mode: bool,
    authorization_endpoint: Option<String>,
    grant_type: GrantType,
    scope: Option<String>,
    enable_pkce: bool,
    storage_name: Option<String>,
    expiry_policy: ExpiryPolicy,
    timeout: Option<u64>,
    retry: u32,
}

impl OAuth2ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(SecretString::new(client_secret.into()));
        self
    }

    /// Defaults to HTTP Basic, or none for a client without secret.
    pub fn auth_method(mut self, method: ClientAuthMethod) -> Self {
        self.auth_method = Some(method);
        self
    }

    /// Production token endpoint.
    pub fn token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = Some(endpoint.into());
        self
    }

    /// Sandbox token endpoint.
    pub fn sandbox_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.sandbox_token_endpoint = Some(endpoint.into());
        self
    }

    /// Use the sandbox token endpoint.
    pub fn sandbox(mut self, enabled: bool) -> Self {
        self.sandbox_mode = enabled;
        self
    }

    pub fn authorization_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.authorization_endpoint = Some(endpoint.into());
        self
    }

    /// Grant performed when no token is cached.
    pub fn grant_type(mut self, grant_type: GrantType) -> Self {
        self.grant_type = grant_type;
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn enable_pkce(mut self, enable: bool) -> Self {
        self.enable_pkce = enable;
        self
    }

    /// Namespace of the token cache.
    pub fn storage_name(mut self, name: impl Into<String>) -> Self {
        self.storage_name = Some(name.into());
        self
    }

    pub fn expiry_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.expiry_policy = policy;
        self
    }

    /// HTTP timeout in seconds.
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    /// Retries after transport failures.
    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    fn validate_url(url: &str) -> Result<(), ConfigurationError> {
        Url::parse(url)
            .map(|_| ())
            .map_err(|_| ConfigurationError::InvalidEndpoint {
                url: url.to_string(),
            })
    }

    /// Build the configuration.
    pub fn build(self) -> HttpClientResult<OAuth2Config> {
        let client_id = self
            .client_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ConfigurationError::MissingField {
                field: "client_id".to_string(),
            })?;

        let token_endpoint = self.token_endpoint.ok_or_else(|| ConfigurationError::MissingField {
            field: "token_endpoint".to_string(),
        })?;
        Self::validate_url(&token_endpoint)?;

        let mut endpoints = Endpoints::new(token_endpoint);
        if let Some(sandbox) = self.sandbox_token_endpoint {
            Self::validate_url(&sandbox)?;
            endpoints = endpoints.with_sandbox(sandbox);
        }
        if self.sandbox_mode {
            if endpoints.sandbox.is_empty() {
                return Err(ConfigurationError::MissingField {
                    field: "sandbox_token_endpoint".to_string(),
                }
                .into());
            }
            endpoints = endpoints.sandbox();
        }

        if let Some(endpoint) = &self.authorization_endpoint {
            Self::validate_url(endpoint)?;
        }

        let auth_method = self.auth_method.unwrap_or(if self.client_secret.is_some() {
            ClientAuthMethod::ClientSecretBasic
        } else {
            ClientAuthMethod::None
        });

        if auth_method != ClientAuthMethod::None && self.client_secret.is_none() {
            return Err(ConfigurationError::MissingField {
                field: "client_secret".to_string(),
            }
            .into());
        }

        let storage_name = self
            .storage_name
            .unwrap_or_else(|| DEFAULT_STORAGE_NAME.to_string());
        if storage_name.is_empty() {
            return Err(ConfigurationError::InvalidValue {
                field: "storage_name".to_string(),
                message: "must not be empty".to_string(),
            }
            .into());
        }

        Ok(OAuth2Config {
            credentials: ClientCredentials {
                client_id,
                client_secret: self.client_secret,
                auth_method,
            },
            token_endpoints: endpoints,
            authorization_endpoint: self.authorization_endpoint,
            grant_type: self.grant_type,
            scope: self.scope,
            enable_pkce: self.enable_pkce,
            storage_name,
            expiry_policy: self.expiry_policy,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS),
            retry: self.retry,
        })
    }
}

/// Create a new OAuth2 configuration builder.
pub fn oauth2_config() -> OAuth2ConfigBuilder {
    OAuth2ConfigBuilder::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpClientError;

    fn base() -> OAuth2ConfigBuilder {
        oauth2_config()
            .client_id("client")
            .client_secret("secret")
            .token_endpoint("https://auth.example.com/token")
    }

    #[test]
    fn test_defaults() {
        let config = base().build().unwrap();

        assert_eq!(config.token_endpoint(), "https://auth.example.com/token");
        assert_eq!(config.storage_name, DEFAULT_STORAGE_NAME);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.expiry_policy, ExpiryPolicy::RelativeToIssue);
        assert_eq!(config.credentials.auth_method, ClientAuthMethod::ClientSecretBasic);
        assert!(matches!(config.grant_type, GrantType::ClientCredentials));
        assert!(!config.enable_pkce);
    }

    #[test]
    fn test_sandbox_endpoint_selected() {
        let config = base()
            .sandbox_token_endpoint("https://sandbox.example.com/token")
            .sandbox(true)
            .build()
            .unwrap();

        assert_eq!(config.token_endpoint(), "https://sandbox.example.com/token");
    }

    #[test]
    fn test_sandbox_mode_requires_sandbox_endpoint() {
        let result = base().sandbox(true).build();
        assert!(matches!(
            result,
            Err(HttpClientError::Configuration(ConfigurationError::MissingField { .. }))
        ));
    }

    #[test]
    fn test_missing_client_id() {
        let result = oauth2_config()
            .token_endpoint("https://auth.example.com/token")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_endpoint() {
        let result = base().token_endpoint("not a url").build();
        assert!(matches!(
            result,
            Err(HttpClientError::Configuration(ConfigurationError::InvalidEndpoint { .. }))
        ));
    }

    #[test]
    fn test_secret_required_for_confidential_client() {
        let result = oauth2_config()
            .client_id("client")
            .token_endpoint("https://auth.example.com/token")
            .auth_method(ClientAuthMethod::ClientSecretPost)
            .build();
        assert!(result.is_err());

        let public = oauth2_config()
            .client_id("client")
            .token_endpoint("https://auth.example.com/token")
            .build()
            .unwrap();
        assert_eq!(public.credentials.auth_method, ClientAuthMethod::None);
    }
}
