//! Outgoing response descriptors.
//!
//! The router never writes to a transport. Handlers, redirects and the synthetic
//! `OPTIONS` answer all produce an [`OutgoingResponse`] that the host turns into a real
//! response.

use crate::error::BoxError;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResponseContent {
    #[default]
    Empty,
    Text(String),
    Json(Value),
    Bytes(Bytes),
}

/// A plain response description: status, headers and content.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingResponse {
    status: StatusCode,
    headers: HeaderMap,
    content: ResponseContent,
}

impl Default for OutgoingResponse {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

impl OutgoingResponse {
    pub fn new(status: StatusCode) -> Self {
        Self { status, headers: HeaderMap::new(), content: ResponseContent::Empty }
    }

    /// A redirect to `location` with the given 3xx status
    pub fn redirect(status: StatusCode, location: &str) -> Result<Self, BoxError> {
        let mut response = Self::new(status);
        response.headers.insert(http::header::LOCATION, HeaderValue::from_str(location)?);
        Ok(response)
    }

    pub fn with_content(mut self, content: ResponseContent) -> Self {
        self.content = content;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_mut(&mut self) -> &mut StatusCode {
        &mut self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn content(&self) -> &ResponseContent {
        &self.content
    }
}

/// Input handed to a [`ResponseResolver`].
#[derive(Debug, Clone, Default)]
pub struct ResponseOptions {
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
    pub content: ResponseContent,
}

/// Builds outgoing responses on behalf of the router, letting hosts decorate every
/// response the router itself produces.
pub trait ResponseResolver: Send + Sync {
    fn resolve(&self, options: ResponseOptions) -> Result<OutgoingResponse, BoxError>;
}

/// Maps [`ResponseOptions`] one to one, defaulting the status to `200 OK`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultResponseResolver;

impl ResponseResolver for DefaultResponseResolver {
    fn resolve(&self, options: ResponseOptions) -> Result<OutgoingResponse, BoxError> {
        Ok(OutgoingResponse {
            status: options.status.unwrap_or(StatusCode::OK),
            headers: options.headers,
            content: options.content,
        })
    }
}
