//! Token Management
//!
//! Token storage and the two token manager variants:
//!
//! - **[`OAuth2Client`]**: standards grants through a [`crate::flows::TokenEndpointClient`],
//!   refreshing expired tokens.
//! - **[`SimpleOAuth2Client`]**: provider-specific requests through a
//!   [`TokenRequester`], evicting expired tokens and re-acquiring.

pub mod provider;
pub mod simple;
pub mod storage;

pub use provider::OAuth2Client;
pub use simple::{SimpleOAuth2Client, TokenRequester};
pub use storage::{
    create_in_memory_token_storage, InMemoryTokenStorage, MockTokenStorage, TokenStorage,
};
