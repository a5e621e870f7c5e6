//! Request Executor
//!
//! Resolves the descriptor into a single request and drives the transport
//! under the retry policy. Only transport failures are retried; any
//! completed exchange, whatever its status, is returned as is.

use indexmap::IndexMap;
use reqwest::header::{HeaderName, HeaderValue};
use std::time::Duration;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::core::{Transport, TransportFailure};
use crate::error::ConfigurationError;
use crate::request::HttpClient;
use crate::response::ResponseEnvelope;
use crate::types::{HttpMethod, ResolvedRequest};

fn seconds(value: u64) -> Option<Duration> {
    (value > 0).then(|| Duration::from_secs(value))
}

fn check_headers(headers: &IndexMap<String, String>) -> Result<(), ConfigurationError> {
    for (name, value) in headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            return Err(ConfigurationError::InvalidValue {
                field: "headers".to_string(),
                message: format!("invalid header name {:?}", name),
            });
        }
        if HeaderValue::from_str(value).is_err() {
            return Err(ConfigurationError::InvalidValue {
                field: "headers".to_string(),
                message: format!("invalid value for header {}", name),
            });
        }
    }
    Ok(())
}

impl<T: Transport, R: ResponseEnvelope> HttpClient<T, R> {
    /// Resolve the current configuration into a request.
    pub fn resolve(&self) -> ResolvedRequest {
        let descriptor = &self.descriptor;

        let mut url = descriptor.base_uri.clone();
        if !descriptor.query.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&descriptor.query)
                .finish();
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }

        let mut headers = descriptor.headers.clone();
        headers.retain(|name, _| !name.eq_ignore_ascii_case("content-type"));
        headers.insert("Content-Type".to_string(), descriptor.content_type.clone());

        let body = if descriptor.method.sends_body() {
            descriptor.body.clone()
        } else {
            None
        };

        ResolvedRequest {
            method: descriptor.method,
            url,
            headers,
            body,
            timeout: seconds(descriptor.timeout),
            connect_timeout: seconds(descriptor.connect_timeout),
            options: descriptor.options.clone(),
        }
    }

    /// Send the request, retrying transport failures up to the retry count.
    ///
    /// Headers that cannot be sent fail the request before any attempt.
    pub fn request(&self) -> R {
        let request = self.resolve();

        if let Err(e) = check_headers(&request.headers) {
            warn!(url = %request.url, error = %e, "Request not sent");
            return R::from_failure(TransportFailure::new(format!("Configuration error: {}", e)));
        }
        let max_attempts = self.descriptor.retry.saturating_add(1);
        let mut last_failure = None;

        for attempt in 1..=max_attempts {
            debug!(
                attempt,
                max_attempts,
                method = %request.method,
                url = %request.url,
                "Sending request"
            );

            match self.transport.execute(&request) {
                Ok(exchange) => {
                    debug!(status = ?exchange.info.status_code, "Exchange completed");
                    return R::from_exchange(exchange);
                }
                Err(failure) => {
                    warn!(
                        attempt,
                        max_attempts,
                        url = %request.url,
                        error = %failure.message,
                        "Transport failure"
                    );
                    last_failure = Some(failure);
                }
            }
        }

        R::from_failure(
            last_failure.unwrap_or_else(|| TransportFailure::new("No attempt was made")),
        )
    }

    fn send_as(&mut self, method: HttpMethod) -> R {
        self.descriptor.method = method;
        self.request()
    }

    /// GET, merging `params` into the query.
    pub fn get<K, V>(&mut self, params: impl IntoIterator<Item = (K, V)>) -> R
    where
        K: Into<String>,
        V: ToString,
    {
        self.descriptor
            .query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.to_string())));
        self.send_as(HttpMethod::Get)
    }

    pub fn post(&mut self) -> R {
        self.send_as(HttpMethod::Post)
    }

    pub fn put(&mut self) -> R {
        self.send_as(HttpMethod::Put)
    }

    pub fn patch(&mut self) -> R {
        self.send_as(HttpMethod::Patch)
    }

    pub fn delete(&mut self) -> R {
        self.send_as(HttpMethod::Delete)
    }
}
