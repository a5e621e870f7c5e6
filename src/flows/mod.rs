//! OAuth2 Flows
//!
//! Token endpoint requests and authorization URL construction.

pub mod authorization;
pub mod token_endpoint;

pub use authorization::{authorization_url, AuthorizationRequest};
pub use token_endpoint::{HttpTokenEndpoint, MockTokenEndpoint, TokenEndpointClient};
