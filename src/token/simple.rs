//! Direct-request token manager.
//!
//! For providers whose token endpoint does not follow a standard grant
//! shape. A [`TokenRequester`] builds and sends the token request; the
//! returned envelope itself is cached.

use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::error::{HttpClientResult, TokenError};
use crate::response::OAuth2Response;
use crate::token::storage::{create_in_memory_token_storage, InMemoryTokenStorage, TokenStorage};
use crate::types::{
    CachedToken, ClientCredentials, Endpoints, ExpiryPolicy, DEFAULT_STORAGE_NAME,
};

/// Builds and sends the provider-specific token request.
pub trait TokenRequester: Send + Sync {
    /// Request a token for `credentials` from `token_endpoint`.
    fn send_token_request(
        &self,
        credentials: &ClientCredentials,
        token_endpoint: &str,
    ) -> OAuth2Response;
}

/// Token manager that caches whole token envelopes per client id.
pub struct SimpleOAuth2Client<
    P: TokenRequester,
    S: TokenStorage<OAuth2Response> = InMemoryTokenStorage<OAuth2Response>,
> {
    credentials: ClientCredentials,
    endpoints: Endpoints,
    expiry_policy: ExpiryPolicy,
    requester: P,
    storage: Arc<S>,
}

impl<P: TokenRequester> SimpleOAuth2Client<P> {
    /// Client with in-memory storage under the default storage name.
    pub fn new(credentials: ClientCredentials, endpoints: Endpoints, requester: P) -> Self {
        Self::with_storage(
            credentials,
            endpoints,
            requester,
            Arc::new(create_in_memory_token_storage(DEFAULT_STORAGE_NAME)),
        )
    }
}

impl<P: TokenRequester, S: TokenStorage<OAuth2Response>> SimpleOAuth2Client<P, S> {
    pub fn with_storage(
        credentials: ClientCredentials,
        endpoints: Endpoints,
        requester: P,
        storage: Arc<S>,
    ) -> Self {
        Self {
            credentials,
            endpoints,
            expiry_policy: ExpiryPolicy::default(),
            requester,
            storage,
        }
    }

    pub fn with_expiry_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.expiry_policy = policy;
        self
    }

    pub fn credentials(&self) -> &ClientCredentials {
        &self.credentials
    }

    /// Resolved (sandbox or production) token endpoint.
    pub fn token_endpoint(&self) -> String {
        self.endpoints.endpoint(None)
    }

    /// Return a usable access token.
    ///
    /// An expired cached envelope is evicted before a new one is requested.
    /// A non-2xx answer yields [`TokenError::AcquisitionFailed`] with the
    /// envelope's reason text and nothing is cached.
    pub fn fetch_access_token(&self) -> HttpClientResult<String> {
        let client_id = &self.credentials.client_id;

        if let Some(cached) = self.storage.get(client_id)? {
            if cached.has_expired(self.expiry_policy)? {
                debug!(client_id = %client_id, "Evicting expired token");
                self.storage.remove(client_id)?;
            } else {
                debug!(client_id = %client_id, "Using cached token");
                return cached
                    .access_token()
                    .ok_or_else(|| TokenError::MissingAccessToken.into());
            }
        }

        let response = self
            .requester
            .send_token_request(&self.credentials, &self.token_endpoint());

        if !response.ok() {
            return Err(TokenError::AcquisitionFailed {
                status: response.status_code(),
                reason: response.message(),
            }
            .into());
        }

        let access_token = response
            .access_token()
            .ok_or(TokenError::MissingAccessToken)?;

        // A token without expiry cannot be classified later.
        if response.expires_in().is_none() {
            warn!(client_id = %client_id, "Token has no expires_in, not caching");
            return Ok(access_token);
        }

        self.storage.set(client_id, response)?;
        Ok(access_token)
    }

    /// [`Self::fetch_access_token`], logging and discarding the error.
    pub fn get_access_token(&self) -> Option<String> {
        match self.fetch_access_token() {
            Ok(token) => Some(token),
            Err(e) => {
                error!(
                    client_id = %self.credentials.client_id,
                    code = e.error_code(),
                    error = %e,
                    "Failed to obtain access token"
                );
                None
            }
        }
    }
}
