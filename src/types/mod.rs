//! Types
//!
//! Request, token and configuration type definitions.

pub mod config;
pub mod request;
pub mod token;

pub use config::*;
pub use request::*;
pub use token::*;
