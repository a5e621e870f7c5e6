//! Request Builder
//!
//! Fluent configuration of one HTTP call. Setters consume and return the
//! client so calls chain in any order; a later setter overrides an earlier
//! one on the same field.

use serde::Serialize;
use serde_json::{json, Value};
use std::marker::PhantomData;
use std::sync::Arc;
use url::form_urlencoded;

use crate::core::{ReqwestTransport, Transport};
use crate::error::{ConfigurationError, HttpClientResult};
use crate::response::{Response, ResponseEnvelope};
use crate::types::{
    HttpMethod, RequestBody, RequestDescriptor, CONTENT_TYPE_FORM_URLENCODED, CONTENT_TYPE_JSON,
    CONTENT_TYPE_MULTIPART,
};

/// HTTP client: a request descriptor bound to a transport and a response
/// envelope type.
pub struct HttpClient<T: Transport = ReqwestTransport, R: ResponseEnvelope = Response> {
    pub(crate) transport: Arc<T>,
    pub(crate) descriptor: RequestDescriptor,
    response_type: PhantomData<fn() -> R>,
}

impl HttpClient {
    /// Create a client on the default reqwest transport.
    pub fn new() -> HttpClientResult<Self> {
        Ok(Self::with_transport(Arc::new(ReqwestTransport::new()?)))
    }
}

impl<T: Transport> HttpClient<T, Response> {
    /// Create a client on a custom transport.
    pub fn with_transport(transport: Arc<T>) -> Self {
        Self {
            transport,
            descriptor: RequestDescriptor::default(),
            response_type: PhantomData,
        }
    }
}

impl<T: Transport, R: ResponseEnvelope> Clone for HttpClient<T, R> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            descriptor: self.descriptor.clone(),
            response_type: PhantomData,
        }
    }
}

impl<T: Transport, R: ResponseEnvelope> HttpClient<T, R> {
    /// Current request configuration.
    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    /// Wrap responses in `R2` instead.
    pub fn with_response_type<R2: ResponseEnvelope>(self) -> HttpClient<T, R2> {
        HttpClient {
            transport: self.transport,
            descriptor: self.descriptor,
            response_type: PhantomData,
        }
    }

    /// Set target URI.
    pub fn with_base_uri(mut self, uri: impl Into<String>) -> Self {
        self.descriptor.base_uri = uri.into();
        self
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.descriptor.method = method;
        self
    }

    /// Set method by name, in any case.
    pub fn with_method_name(self, method: &str) -> HttpClientResult<Self> {
        Ok(self.with_method(method.parse()?))
    }

    /// Merge headers, overwriting per key.
    pub fn with_headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.descriptor
            .headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_headers([(name, value)])
    }

    /// Merge transport option overrides, overwriting per key.
    pub fn with_options<K>(mut self, options: impl IntoIterator<Item = (K, Value)>) -> Self
    where
        K: Into<String>,
    {
        self.descriptor
            .options
            .extend(options.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    /// Set `Authorization: Bearer <token>`.
    pub fn bearer_token(self, token: &str) -> Self {
        self.with_header("Authorization", format!("Bearer {}", token))
    }

    /// Replace query parameters.
    pub fn query<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: ToString,
    {
        self.descriptor.query = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.to_string()))
            .collect();
        self
    }

    /// Multipart form body.
    pub fn form_data<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: ToString,
    {
        let fields = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.to_string()))
            .collect();
        self.descriptor.body = Some(RequestBody::FormData(fields));
        self.descriptor.content_type = CONTENT_TYPE_MULTIPART.to_string();
        self
    }

    /// URL-encoded form body.
    pub fn url_encoded<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: ToString,
    {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (k, v) in fields {
            serializer.append_pair(k.as_ref(), &v.to_string());
        }
        self.descriptor.body = Some(RequestBody::Raw(serializer.finish()));
        self.descriptor.content_type = CONTENT_TYPE_FORM_URLENCODED.to_string();
        self
    }

    /// Raw body sent as-is with the given content type.
    pub fn raw(mut self, body: impl Into<String>, content_type: impl Into<String>) -> Self {
        self.descriptor.body = Some(RequestBody::Raw(body.into()));
        self.descriptor.content_type = content_type.into();
        self
    }

    /// Raw JSON body.
    pub fn raw_json(self, body: impl Into<String>) -> Self {
        self.raw(body, CONTENT_TYPE_JSON)
    }

    /// Serialize `body` as JSON.
    pub fn json<B: Serialize + ?Sized>(self, body: &B) -> HttpClientResult<Self> {
        let encoded = serde_json::to_string(body).map_err(|e| ConfigurationError::InvalidValue {
            field: "body".to_string(),
            message: e.to_string(),
        })?;
        Ok(self.raw_json(encoded))
    }

    /// GraphQL-style body: `{"query": ..., "variables": ...}`.
    pub fn graphql(self, query: &str, variables: Value) -> Self {
        let body = json!({ "query": query, "variables": variables });
        self.raw_json(body.to_string())
    }

    /// Extra attempts after transport failures.
    pub fn retry(mut self, retry: u32) -> Self {
        self.descriptor.retry = retry;
        self
    }

    /// Total timeout in seconds, 0 for the transport default.
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.descriptor.timeout = seconds;
        self
    }

    /// Connect timeout in seconds, 0 for the transport default.
    pub fn connect_timeout(mut self, seconds: u64) -> Self {
        self.descriptor.connect_timeout = seconds;
        self
    }
}
