//! HTTP Requests
//!
//! The [`HttpClient`] builder and its retrying executor.

pub mod builder;
pub mod executor;

pub use builder::HttpClient;
