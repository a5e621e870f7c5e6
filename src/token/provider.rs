//! Generic-provider token manager.
//!
//! Delegates the token-endpoint exchange to a [`TokenEndpointClient`] and
//! caches the result per client id.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::core::create_pkce_generator;
use crate::error::{HttpClientResult, TokenError};
use crate::flows::{authorization_url, AuthorizationRequest, HttpTokenEndpoint, TokenEndpointClient};
use crate::token::storage::{create_in_memory_token_storage, InMemoryTokenStorage, TokenStorage};
use crate::types::{CachedToken, OAuth2Config, StoredToken, TokenResponse};

/// Token manager for standards-compliant OAuth2 providers.
pub struct OAuth2Client<
    E: TokenEndpointClient = HttpTokenEndpoint,
    S: TokenStorage<StoredToken> = InMemoryTokenStorage<StoredToken>,
> {
    config: OAuth2Config,
    endpoint: E,
    storage: Arc<S>,
}

impl OAuth2Client {
    /// Client on the configured endpoint with in-memory storage named after
    /// the configured storage name.
    pub fn new(config: OAuth2Config) -> HttpClientResult<Self> {
        let endpoint = HttpTokenEndpoint::new(&config)?;
        let storage = Arc::new(create_in_memory_token_storage(&config.storage_name));
        Ok(Self::with_parts(config, endpoint, storage))
    }
}

impl<E: TokenEndpointClient, S: TokenStorage<StoredToken>> OAuth2Client<E, S> {
    pub fn with_parts(config: OAuth2Config, endpoint: E, storage: Arc<S>) -> Self {
        Self {
            config,
            endpoint,
            storage,
        }
    }

    pub fn config(&self) -> &OAuth2Config {
        &self.config
    }

    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    /// Token currently cached for the configured client id.
    pub fn cached_token(&self) -> HttpClientResult<Option<StoredToken>> {
        self.storage.get(&self.config.credentials.client_id)
    }

    /// Return a usable access token, refreshing or acquiring as needed.
    ///
    /// A cached, unexpired token is returned as is. An expired one is
    /// refreshed when it carries a refresh token, otherwise the configured
    /// grant is performed again. A rejected refresh token is discarded and
    /// the configured grant runs in its place.
    pub fn fetch_access_token(&self) -> HttpClientResult<String> {
        let client_id = &self.config.credentials.client_id;

        if let Some(token) = self.cached_token()? {
            if !token.has_expired(self.config.expiry_policy)? {
                debug!(client_id = %client_id, "Using cached token");
                return Ok(token.access_token);
            }

            match token.refresh_token.as_deref() {
                Some(refresh_token) => {
                    debug!(client_id = %client_id, "Cached token expired, refreshing");
                    match self.endpoint.refresh_token(refresh_token) {
                        Ok(mut response) => {
                            if response.refresh_token.is_none() {
                                response.refresh_token = token.refresh_token.clone();
                            }
                            return self.persist(response);
                        }
                        Err(e) if e.needs_reauth() => {
                            warn!(
                                client_id = %client_id,
                                error = %e,
                                "Refresh token rejected, discarding cached token"
                            );
                            self.clear_token()?;
                        }
                        Err(e) => return Err(e),
                    }
                }
                None => {
                    debug!(client_id = %client_id, "Cached token expired without refresh token");
                }
            }
        } else {
            debug!(client_id = %client_id, "No cached token");
        }

        let response = self
            .endpoint
            .request_token(&self.config.grant_type, self.config.scope.as_deref())?;
        self.persist(response)
    }

    /// [`Self::fetch_access_token`], logging and discarding the error.
    pub fn get_access_token(&self) -> Option<String> {
        match self.fetch_access_token() {
            Ok(token) => Some(token),
            Err(e) => {
                error!(
                    client_id = %self.config.credentials.client_id,
                    code = e.error_code(),
                    error = %e,
                    "Failed to obtain access token"
                );
                None
            }
        }
    }

    /// Drop the cached token for the configured client id.
    pub fn clear_token(&self) -> HttpClientResult<()> {
        self.storage.remove(&self.config.credentials.client_id)
    }

    /// Authorization URL for the authorization-code grant, with PKCE when
    /// enabled.
    pub fn authorization_url(
        &self,
        redirect_uri: &str,
        state: Option<&str>,
    ) -> HttpClientResult<AuthorizationRequest> {
        authorization_url(&self.config, redirect_uri, state, &create_pkce_generator())
    }

    fn persist(&self, response: TokenResponse) -> HttpClientResult<String> {
        if response.access_token.is_empty() {
            return Err(TokenError::MissingAccessToken.into());
        }

        let token = StoredToken::from_response(response, Utc::now());
        let access_token = token.access_token.clone();

        // A token without expiry cannot be classified later.
        if token.expires_in.is_none() {
            warn!(
                client_id = %self.config.credentials.client_id,
                "Token has no expires_in, not caching"
            );
            return Ok(access_token);
        }

        self.storage
            .set(&self.config.credentials.client_id, token)?;
        Ok(access_token)
    }
}
