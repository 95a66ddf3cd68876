//! The indexed set of compiled routes of one router, and request resolution over it.

use crate::RouterError;
use crate::action::Action;
use crate::error::BoxError;
use crate::event::IncomingEvent;
use crate::handler::RouteHandler;
use crate::mapper::HTTP_METHODS;
use crate::response::{OutgoingResponse, ResponseResolver};
use crate::route::{Protocol, Route, RouteContext, RouteSummary, allow_response};
use async_trait::async_trait;
use http::Method;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Routes indexed by `method + path`, by method and by name.
///
/// A later route with the same key replaces the earlier one.
///
/// Registration happens once at startup; afterwards the collection is only read, so it
/// can be shared by concurrent dispatches without locking.
#[derive(Default)]
pub struct RouteCollection {
    /// every route, in registration order
    routes: Vec<Arc<Route>>,
    /// route key to the index in `routes` and in its method bucket
    primary: HashMap<String, (usize, usize)>,
    by_method: HashMap<Method, Vec<Arc<Route>>>,
    by_name: HashMap<String, Arc<Route>>,
    response_resolver: Option<Arc<dyn ResponseResolver>>,
}

/// `method + path`, qualified by domain and protocol so expanded variants of one
/// definition do not replace each other.
fn primary_key(method: &Method, protocol: Option<Protocol>, domain: Option<&str>, path: &str) -> String {
    let scheme = protocol.map_or("", Protocol::as_str);
    format!("{method} {scheme}://{}{path}", domain.unwrap_or_default())
}

fn route_key(route: &Route) -> String {
    primary_key(route.method(), route.protocol(), route.domain(), route.path())
}

impl RouteCollection {
    pub fn new(response_resolver: Option<Arc<dyn ResponseResolver>>) -> Self {
        Self { response_resolver, ..Self::default() }
    }

    /// Adds a route; a route with the same method and path replaces the earlier one in place.
    ///
    /// The name of a replaced route is dropped unless another route took it over since.
    pub fn add(&mut self, route: Route) -> Arc<Route> {
        let route = Arc::new(route);
        let key = route_key(&route);
        let bucket = self.by_method.entry(route.method().clone()).or_default();

        match self.primary.get(&key).copied() {
            Some((index, position)) => {
                debug!(key, "route replaces an earlier registration");
                let replaced = std::mem::replace(&mut self.routes[index], Arc::clone(&route));
                bucket[position] = Arc::clone(&route);
                if let Some(name) = replaced.name()
                    && self.by_name.get(name).is_some_and(|named| Arc::ptr_eq(named, &replaced))
                {
                    self.by_name.remove(name);
                }
            }
            None => {
                self.primary.insert(key, (self.routes.len(), bucket.len()));
                bucket.push(Arc::clone(&route));
                self.routes.push(Arc::clone(&route));
            }
        }

        if let Some(name) = route.name()
            && !route.is_internal_head()
        {
            self.by_name.insert(name.to_owned(), Arc::clone(&route));
        }

        route
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter()
    }

    /// Looks up a route registered without domain or protocol
    pub fn get(&self, method: &Method, path: &str) -> Option<&Arc<Route>> {
        self.primary.get(&primary_key(method, None, None, path)).map(|&(index, _)| &self.routes[index])
    }

    /// Routes registered for `method`, in registration order
    pub fn routes_for(&self, method: &Method) -> &[Arc<Route>] {
        self.by_method.get(method).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Arc<Route>> {
        self.by_name.get(name)
    }

    pub fn has_named_route(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Resolves the route for an event.
    ///
    /// Candidates registered for the event method are tried in order with fallback
    /// routes last. When none matches, the other verbs are probed: an `OPTIONS` request
    /// then gets a synthetic route answering with an `Allow` header, any other request
    /// fails with [`RouterError::MethodNotAllowed`]. Nothing matching at all is
    /// [`RouterError::RouteNotFound`].
    pub fn match_event(&self, event: &dyn IncomingEvent, including_method: bool) -> Result<Arc<Route>, RouterError> {
        if let Some(route) = self.find_in(self.routes_for(event.method()), event, including_method) {
            trace!(method = %event.method(), path = event.pathname(), route = %route.path(), "matched route");
            return Ok(Arc::clone(route));
        }

        let mut allowed = Vec::new();
        let mut first_alternate = None;
        for method in HTTP_METHODS.iter().filter(|method| *method != event.method()) {
            if let Some(route) = self.find_in(self.routes_for(method), event, false) {
                allowed.push(method.clone());
                first_alternate.get_or_insert(route);
            }
        }

        let Some(alternate) = first_alternate else {
            debug!(method = %event.method(), path = event.pathname(), "no route found");
            return Err(RouterError::route_not_found(event.pathname()));
        };

        debug!(method = %event.method(), path = event.pathname(), ?allowed, "route matches other methods");
        if event.method() == Method::OPTIONS {
            Ok(Arc::new(self.options_route(alternate, allowed)))
        } else {
            Err(RouterError::method_not_allowed(event.method().clone(), event.pathname(), allowed))
        }
    }

    fn find_in<'a>(
        &self,
        candidates: &'a [Arc<Route>],
        event: &dyn IncomingEvent,
        including_method: bool,
    ) -> Option<&'a Arc<Route>> {
        let regular = candidates.iter().filter(|route| !route.is_fallback());
        let fallback = candidates.iter().filter(|route| route.is_fallback());
        regular.chain(fallback).find(|route| route.matches(event, including_method))
    }

    /// An ad-hoc `OPTIONS` twin of `matched` answering with the allowed methods.
    fn options_route(&self, matched: &Route, allowed: Vec<Method>) -> Route {
        let mut options = matched.options().clone();
        options.method = Method::OPTIONS;
        options.name = None;
        options.bindings.clear();
        options.middleware.clear();
        options.redirect = None;
        options.internal_head = false;

        let resolver = self.response_resolver.clone();
        options.action = Action::Callable(Arc::new(AllowHandler { allowed, resolver: resolver.clone() }));
        Route::create(options).with_response_resolver(resolver)
    }

    /// Snapshot of every public route sorted by path, internal `HEAD` twins left out.
    pub fn dump(&self) -> Vec<RouteSummary> {
        let mut summaries: Vec<_> =
            self.routes.iter().filter(|route| !route.is_internal_head()).map(|route| route.summary()).collect();
        summaries.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.method.cmp(&b.method)));
        summaries
    }
}

impl fmt::Debug for RouteCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteCollection")
            .field("routes", &self.routes.len())
            .field("names", &self.by_name.len())
            .finish_non_exhaustive()
    }
}

/// The action of the synthetic `OPTIONS` route.
struct AllowHandler {
    allowed: Vec<Method>,
    resolver: Option<Arc<dyn ResponseResolver>>,
}

#[async_trait]
impl RouteHandler for AllowHandler {
    async fn handle(&self, _ctx: &RouteContext) -> Result<OutgoingResponse, BoxError> {
        Ok(allow_response(self.resolver.as_deref(), &self.allowed)?)
    }
}
