//! HTTP Client Integration Module
//!
//! Blocking HTTP request façade with retries, lazily parsed response
//! envelopes and OAuth2 token caching.
//!
//! # Features
//!
//! - Fluent request builder (query, headers, JSON, form, multipart, GraphQL)
//! - Retry on transport failure
//! - Response envelopes with lazy header and JSON parsing
//! - Dot-path attribute access with `*` wildcard flattening
//! - Client Credentials, Authorization Code (with PKCE) and Password grants
//! - Token refresh (RFC 6749 Section 6)
//! - Injectable, namespaced token storage
//!
//! # Example
//!
//! ```rust,ignore
//! use http_client_integration::{oauth2_config, HttpClient, OAuth2Client};
//! use serde_json::json;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = oauth2_config()
//!         .client_id("my-client-id")
//!         .client_secret("my-client-secret")
//!         .token_endpoint("https://provider.com/oauth/token")
//!         .scope("read")
//!         .build()?;
//!
//!     let oauth = OAuth2Client::new(config)?;
//!     let token = oauth.fetch_access_token()?;
//!
//!     let response = HttpClient::new()?
//!         .with_base_uri("https://api.provider.com/users")
//!         .bearer_token(&token)
//!         .retry(2)
//!         .get([("page", "1")]);
//!
//!     if response.ok() {
//!         let names = response.attribute("data.*.name", json!([]));
//!         println!("{names}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: request descriptors, token and configuration types
//! - `error`: error hierarchy and provider error mapping
//! - `core`: transport and PKCE primitives
//! - `request`: fluent request builder and retrying executor
//! - `response`: response envelopes, body decoding and path resolution
//! - `flows`: token endpoint requests and authorization URLs
//! - `token`: token storage and the two token managers
//! - `builders`: fluent builders for configuration

pub mod builders;
pub mod core;
pub mod error;
pub mod flows;
pub mod request;
pub mod response;
pub mod token;
pub mod types;

// Re-export request façade
pub use request::HttpClient;

// Re-export responses
pub use response::{
    resolve, BodyDecoder, JsonBodyDecoder, OAuth2Response, Response, ResponseEnvelope, WILDCARD,
};

// Re-export builders
pub use builders::{oauth2_config, OAuth2ConfigBuilder};

// Re-export errors
pub use error::{
    create_error_from_response, map_token_error, ConfigurationError, HttpClientError,
    HttpClientResult, OAuth2ErrorResponse, ProviderError, StorageError, TokenError,
    TransportError,
};

// Re-export types
pub use types::{
    // Request
    HttpMethod, RequestBody, RequestDescriptor, ResolvedRequest, TransportOptions,
    // Config
    ClientAuthMethod, ClientCredentials, Endpoints, GrantType, OAuth2Config, PkceMethod,
    PkceParams,
    // Token
    CachedToken, ExpiryPolicy, StoredToken, TokenResponse,
};

// Re-export core components
pub use crate::core::{
    // Transport
    MockTransport, ProtocolVersion, ReqwestTransport, Transport, TransportExchange,
    TransportFailure, TransportInfo,
    // PKCE
    DefaultPkceGenerator, MockPkceGenerator, PkceGenerator,
};

// Re-export flows
pub use flows::{
    authorization_url, AuthorizationRequest, HttpTokenEndpoint, MockTokenEndpoint,
    TokenEndpointClient,
};

// Re-export token management
pub use token::{
    InMemoryTokenStorage, MockTokenStorage, OAuth2Client, SimpleOAuth2Client, TokenRequester,
    TokenStorage,
};
