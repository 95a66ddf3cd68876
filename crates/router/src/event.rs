//! The incoming event contract the router expects from its host, and [`HttpEvent`],
//! a ready-made implementation backed by `http` request parts.

use http::request::Parts;
use http::{HeaderMap, Method, Request, Uri};
use std::borrow::Cow;
use tracing::warn;

/// What the router reads from an incoming request.
///
/// Hosts adapt their own request type to this trait. Matching only reads from the
/// event, so one event may be matched against many routes.
pub trait IncomingEvent: Send + Sync {
    fn method(&self) -> &Method;

    /// The request host name, without port
    fn host(&self) -> Option<&str>;

    /// The raw, still percent-encoded path
    fn pathname(&self) -> &str;

    fn uri(&self) -> &Uri;

    /// Decoded query pairs, in request order
    fn query(&self) -> Vec<(String, String)>;

    fn is_secure(&self) -> bool;

    fn decoded_pathname(&self) -> Cow<'_, str> {
        urlencoding::decode(self.pathname()).unwrap_or(Cow::Borrowed(self.pathname()))
    }

    fn is_method(&self, method: &Method) -> bool {
        self.method() == method
    }

    /// The string route regexes run against: `host + path` with a domain, the path alone without.
    fn get_uri(&self, with_domain: bool) -> String {
        let path = self.decoded_pathname();
        match self.host() {
            Some(host) if with_domain => format!("{host}{path}"),
            _ => path.into_owned(),
        }
    }
}

/// An [`IncomingEvent`] built from `http` request parts.
#[derive(Debug, Clone)]
pub struct HttpEvent {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    host: Option<String>,
    secure: bool,
}

impl HttpEvent {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self::from_components(method, uri, HeaderMap::new())
    }

    /// Parses `uri` and builds an event, mostly useful in tests and demos
    pub fn parse(method: Method, uri: &str) -> Result<Self, http::uri::InvalidUri> {
        Ok(Self::new(method, uri.parse()?))
    }

    pub fn from_request<B>(request: &Request<B>) -> Self {
        Self::from_components(request.method().clone(), request.uri().clone(), request.headers().clone())
    }

    fn from_components(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        let host = uri
            .host()
            .map(ToOwned::to_owned)
            .or_else(|| headers.get(http::header::HOST).and_then(|h| h.to_str().ok()).map(strip_port));
        let secure = uri.scheme_str() == Some("https");
        Self { method, uri, headers, host, secure }
    }

    /// Overrides whether the event arrived over a secure channel, e.g. behind a TLS terminating proxy
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_host(mut self, host: impl AsRef<str>) -> Self {
        self.host = Some(strip_port(host.as_ref()));
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl From<Parts> for HttpEvent {
    fn from(parts: Parts) -> Self {
        Self::from_components(parts.method, parts.uri, parts.headers)
    }
}

fn strip_port(host: &str) -> String {
    // bracketed IPv6 literals keep their colons
    if let Some(end) = host.strip_prefix('[').and_then(|h| h.find(']')) {
        return host[..end + 2].to_owned();
    }
    host.split(':').next().unwrap_or(host).to_owned()
}

impl IncomingEvent for HttpEvent {
    fn method(&self) -> &Method {
        &self.method
    }

    fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    fn pathname(&self) -> &str {
        self.uri.path()
    }

    fn uri(&self) -> &Uri {
        &self.uri
    }

    fn query(&self) -> Vec<(String, String)> {
        let Some(query) = self.uri.query() else {
            return vec![];
        };
        serde_urlencoded::from_str(query).unwrap_or_else(|e| {
            warn!(cause = %e, query, "failed to parse query string");
            vec![]
        })
    }

    fn is_secure(&self) -> bool {
        self.secure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_request() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/users/caf%C3%A9?page=2&sort=name")
            .header(http::header::HOST, "api.example.com:8080")
            .body(())
            .unwrap();
        let event = HttpEvent::from_request(&request);

        assert_eq!(event.method(), &Method::POST);
        assert_eq!(event.host(), Some("api.example.com"));
        assert_eq!(event.decoded_pathname(), "/users/café");
        assert_eq!(event.query(), vec![("page".to_owned(), "2".to_owned()), ("sort".to_owned(), "name".to_owned())]);
        assert!(!event.is_secure());
        assert_eq!(event.get_uri(true), "api.example.com/users/café");
        assert_eq!(event.get_uri(false), "/users/café");
    }

    #[test]
    fn test_absolute_uri() {
        let event = HttpEvent::parse(Method::GET, "https://shop.example.com/cart").unwrap();
        assert_eq!(event.host(), Some("shop.example.com"));
        assert!(event.is_secure());
        assert!(event.is_method(&Method::GET));
    }

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("localhost:3000"), "localhost");
        assert_eq!(strip_port("[::1]:3000"), "[::1]");
        assert_eq!(strip_port("example.com"), "example.com");
    }
}
