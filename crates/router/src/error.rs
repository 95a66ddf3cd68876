//! Error kinds raised by route compilation, matching, binding and dispatch.
//!
//! Every failure the router produces is a [`RouterError`]. Hosts should branch on the
//! variant (or on [`RouterError::status_code`]) instead of inspecting messages.

use http::{Method, StatusCode};
use std::error::Error;
use thiserror::Error;

/// Boxed error type returned by handlers, binding resolvers and dispatchers.
pub type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum RouterError {
    /// invalid router setup, fatal at registration time
    #[error("router configuration error: {reason}")]
    Configuration { reason: String },

    #[error("route not found for path: {path}")]
    RouteNotFound { path: String },

    #[error("method {method} is not allowed for path {path}, allowed: {}", join_methods(.allowed))]
    MethodNotAllowed { method: Method, path: String, allowed: Vec<Method> },

    /// an entity binding found nothing for a required parameter
    #[error("resource not found for parameter `{param}`")]
    ResourceNotFound {
        param: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("invalid route action: {reason}")]
    InvalidAction { reason: String },

    #[error("no dispatcher registered for `{kind}` actions")]
    MissingDispatcher { kind: String },

    #[error("missing required parameter `{param}` to generate route `{route}`")]
    MissingParameter { param: String, route: String },

    #[error("event is not bound")]
    NotBound,

    #[error("handler error: {source}")]
    Handler {
        #[source]
        source: BoxError,
    },
}

impl RouterError {
    pub fn configuration<S: ToString>(reason: S) -> Self {
        Self::Configuration { reason: reason.to_string() }
    }

    pub fn route_not_found<S: ToString>(path: S) -> Self {
        Self::RouteNotFound { path: path.to_string() }
    }

    pub fn method_not_allowed<S: ToString>(method: Method, path: S, allowed: Vec<Method>) -> Self {
        Self::MethodNotAllowed { method, path: path.to_string(), allowed }
    }

    pub fn resource_not_found<S: ToString>(param: S, source: Option<BoxError>) -> Self {
        Self::ResourceNotFound { param: param.to_string(), source }
    }

    pub fn invalid_action<S: ToString>(reason: S) -> Self {
        Self::InvalidAction { reason: reason.to_string() }
    }

    pub fn missing_dispatcher<S: ToString>(kind: S) -> Self {
        Self::MissingDispatcher { kind: kind.to_string() }
    }

    pub fn missing_parameter<P: ToString, R: ToString>(param: P, route: R) -> Self {
        Self::MissingParameter { param: param.to_string(), route: route.to_string() }
    }

    /// Wraps a handler failure, keeping router errors raised inside handlers as they are.
    pub fn handler(source: BoxError) -> Self {
        match source.downcast::<RouterError>() {
            Ok(router_error) => *router_error,
            Err(source) => Self::Handler { source },
        }
    }

    /// Returns true for the kinds that indicate a broken router setup rather than a bad request.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::InvalidAction { .. } | Self::MissingDispatcher { .. })
    }

    /// The status code a host would typically answer with for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RouteNotFound { .. } | Self::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Configuration { .. }
            | Self::InvalidAction { .. }
            | Self::MissingDispatcher { .. }
            | Self::MissingParameter { .. }
            | Self::NotBound
            | Self::Handler { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn join_methods(methods: &[Method]) -> String {
    methods.iter().map(Method::as_str).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_not_allowed_lists_alternatives() {
        let error = RouterError::method_not_allowed(Method::GET, "/widgets", vec![Method::POST, Method::PUT]);
        assert_eq!(error.to_string(), "method GET is not allowed for path /widgets, allowed: POST,PUT");
        assert_eq!(error.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn handler_error_unwraps_router_errors() {
        let boxed: BoxError = Box::new(RouterError::route_not_found("/a"));
        assert!(matches!(RouterError::handler(boxed), RouterError::RouteNotFound { .. }));

        let boxed: BoxError = "boom".into();
        assert!(matches!(RouterError::handler(boxed), RouterError::Handler { .. }));
    }

    #[test]
    fn configuration_kinds() {
        assert!(RouterError::configuration("x").is_configuration());
        assert!(RouterError::missing_dispatcher("component").is_configuration());
        assert!(!RouterError::NotBound.is_configuration());
    }
}
