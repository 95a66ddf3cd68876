use crate::event::IncomingEvent;
use crate::params::Params;
use crate::route::Route;
use http::{Method, Uri};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// The outcome of binding one event to one route.
///
/// A context is created per dispatch by [`Route::bind`] and threaded through
/// [`Route::run`], so a route itself never holds request state and can be bound by
/// concurrent requests.
#[derive(Clone)]
pub struct RouteContext {
    route: Arc<Route>,
    method: Method,
    url: Uri,
    host: Option<String>,
    secure: bool,
    query: Vec<(String, String)>,
    params: Params,
}

impl RouteContext {
    pub(crate) fn new(route: Arc<Route>, event: &dyn IncomingEvent, params: Params) -> Self {
        Self {
            route,
            method: event.method().clone(),
            url: event.uri().clone(),
            host: event.host().map(ToOwned::to_owned),
            secure: event.is_secure(),
            query: event.query(),
            params,
        }
    }

    /// The route this context was bound to
    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Uri {
        &self.url
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Gets the last query value with the given name
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.iter().rfind(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn param_as<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.params.get_as(name)
    }

    pub fn into_params(self) -> Params {
        self.params
    }
}

impl fmt::Debug for RouteContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteContext")
            .field("route", &self.route.path())
            .field("url", &self.url)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
