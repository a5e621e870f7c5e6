//! Responses
//!
//! Response envelopes, body decoding and dot-path attribute resolution.

pub mod decoder;
pub mod envelope;
pub mod oauth2;
pub mod path;

pub use decoder::{BodyDecoder, JsonBodyDecoder};
pub use envelope::{Response, ResponseEnvelope, UNKNOWN_PROTOCOL_VERSION};
pub use oauth2::OAuth2Response;
pub use path::{resolve, WILDCARD};
