//! Core Infrastructure
//!
//! Transport and PKCE primitives shared by the request and OAuth2 layers.

pub mod pkce;
pub mod transport;

pub use pkce::*;
pub use transport::*;
