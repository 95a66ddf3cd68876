//! The router facade: registration, dispatch and introspection.
//!
//! ```
//! use micro_router::{HttpEvent, RouteRegistrar, Router, handler_fn};
//! use http::Method;
//!
//! # tokio_test_block_on(async {
//! let router = Router::builder()
//!     .get("/users/:id(\\d+)", handler_fn(|ctx| async move { format!("user {}", ctx.params().get("id").unwrap()) }))
//!     .build()
//!     .unwrap();
//!
//! let event = HttpEvent::parse(Method::GET, "/users/42").unwrap();
//! let response = router.dispatch(&event).await.unwrap();
//! assert_eq!(response.status(), http::StatusCode::OK);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

mod registrar;

pub use registrar::{FALLBACK_PATH, RouteGroup, RouteRegistrar};

use crate::RouterError;
use crate::collection::RouteCollection;
use crate::config::RouterOptions;
use crate::container::Container;
use crate::dispatcher::{Dispatcher, DispatcherType, Dispatchers};
use crate::event::IncomingEvent;
use crate::mapper::{RouteDefinition, RouteMapper};
use crate::matcher::Matcher;
use crate::middleware::{Middleware, MiddlewareRegistry};
use crate::params::Params;
use crate::response::{OutgoingResponse, ResponseResolver};
use crate::route::{GenerateOptions, Route, RouteContext, RouteSummary};
use arc_swap::ArcSwapOption;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

pub struct Router {
    options: RouterOptions,
    mapper: RouteMapper,
    routes: RouteCollection,
    middleware: MiddlewareRegistry,
    /// the context of the last bound dispatch
    current: ArcSwapOption<RouteContext>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    /// Maps and adds more routes after the router was built.
    ///
    /// Takes `&mut self`: hosts sharing the router must synchronize registration themselves.
    pub fn register(&mut self, definitions: Vec<RouteDefinition>) -> Result<(), RouterError> {
        let routes = self.mapper.map(definitions)?;
        self.check_middleware(&routes)?;
        for route in routes {
            self.routes.add(route);
        }
        Ok(())
    }

    fn check_middleware(&self, routes: &[Route]) -> Result<(), RouterError> {
        if self.options.skip_middleware {
            return Ok(());
        }
        routes.iter().try_for_each(|route| self.middleware.chain(&route.middleware()).map(|_| ()))
    }

    /// Matches, binds and runs the route for `event`.
    pub async fn dispatch(&self, event: &dyn IncomingEvent) -> Result<OutgoingResponse, RouterError> {
        let route = self.find_route(event)?;
        self.respond_with_route(route, event).await
    }

    /// Binds and runs the route named `name`, skipping matching.
    pub async fn respond_with_route_name(
        &self,
        event: &dyn IncomingEvent,
        name: &str,
    ) -> Result<OutgoingResponse, RouterError> {
        let route = self.named(name)?;
        self.respond_with_route(route, event).await
    }

    async fn respond_with_route(
        &self,
        route: Arc<Route>,
        event: &dyn IncomingEvent,
    ) -> Result<OutgoingResponse, RouterError> {
        let ctx = route.bind(event).await?;
        self.current.store(Some(Arc::new(ctx.clone())));

        let result = if self.options.skip_middleware {
            route.run(&ctx, event).await
        } else {
            let chain = self.middleware.chain(&route.middleware())?;
            if let Some(response) = chain.on_request(&ctx).await.map_err(RouterError::handler)? {
                debug!(route = %route.path(), "middleware answered the request");
                return Ok(response);
            }
            let mut result = route.run(&ctx, event).await;
            chain.on_response(&ctx, &mut result).await;
            result
        };

        if let Err(e) = &result {
            error!(cause = %e, method = %event.method(), route = %route.path(), "failed to run route");
        }
        result
    }

    pub fn find_route(&self, event: &dyn IncomingEvent) -> Result<Arc<Route>, RouterError> {
        self.routes.match_event(event, true)
    }

    /// Generates the URL of the route named in `options`.
    pub fn generate(&self, options: &GenerateOptions) -> Result<String, RouterError> {
        let name = options
            .name
            .as_deref()
            .ok_or_else(|| RouterError::configuration("generating a URL requires a route name"))?;
        self.named(name)?.generate(options)
    }

    fn named(&self, name: &str) -> Result<Arc<Route>, RouterError> {
        self.routes
            .get_by_name(name)
            .cloned()
            .ok_or_else(|| RouterError::configuration(format!("no route is named `{name}`")))
    }

    pub fn get_routes(&self) -> &RouteCollection {
        &self.routes
    }

    pub fn dump_routes(&self) -> Vec<RouteSummary> {
        self.routes.dump()
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.routes.has_named_route(name)
    }

    /// The route of the last bound dispatch, if any
    pub fn get_current_route(&self) -> Option<Arc<Route>> {
        self.current.load_full().map(|ctx| Arc::clone(ctx.route()))
    }

    /// Parameters of the last bound dispatch.
    pub fn get_parameters(&self) -> Result<Params, RouterError> {
        self.current.load_full().map(|ctx| ctx.params().clone()).ok_or(RouterError::NotBound)
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("options", &self.options)
            .field("routes", &self.routes)
            .field("middleware", &self.middleware)
            .finish_non_exhaustive()
    }
}

pub struct RouterBuilder {
    options: RouterOptions,
    matchers: Option<Vec<Arc<dyn Matcher>>>,
    dispatchers: Dispatchers,
    container: Option<Arc<dyn Container>>,
    response_resolver: Option<Arc<dyn ResponseResolver>>,
    middleware: MiddlewareRegistry,
    definitions: Vec<RouteDefinition>,
}

impl RouterBuilder {
    fn new() -> Self {
        Self {
            options: RouterOptions::default(),
            matchers: None,
            dispatchers: Dispatchers::default(),
            container: None,
            response_resolver: None,
            middleware: MiddlewareRegistry::new(),
            definitions: vec![],
        }
    }

    pub fn config(mut self, options: RouterOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the default domain, method, protocol and uri matchers.
    pub fn matchers(mut self, matchers: Vec<Arc<dyn Matcher>>) -> Self {
        self.matchers = Some(matchers);
        self
    }

    pub fn dispatcher<D: Dispatcher + 'static>(mut self, kind: DispatcherType, dispatcher: D) -> Self {
        self.dispatchers.set(kind, Arc::new(dispatcher));
        self
    }

    /// Registers a dispatcher under a type name; unknown names are rejected.
    pub fn dispatcher_named<D: Dispatcher + 'static>(mut self, kind: &str, dispatcher: D) -> Result<Self, RouterError> {
        self.dispatchers.set_named(kind, Arc::new(dispatcher))?;
        Ok(self)
    }

    pub fn container<C: Container + 'static>(mut self, container: C) -> Self {
        self.container = Some(Arc::new(container));
        self
    }

    pub fn response_resolver<R: ResponseResolver + 'static>(mut self, resolver: R) -> Self {
        self.response_resolver = Some(Arc::new(resolver));
        self
    }

    pub fn middleware<M: Middleware + 'static>(mut self, name: impl Into<String>, middleware: M) -> Self {
        self.middleware.register(name, middleware);
        self
    }

    pub fn build(self) -> Result<Router, RouterError> {
        let mut mapper = RouteMapper::new(self.options.clone())
            .with_dispatchers(self.dispatchers)
            .with_container(self.container)
            .with_response_resolver(self.response_resolver.clone());
        if let Some(matchers) = self.matchers {
            mapper = mapper.with_matchers(matchers);
        }

        let mut router = Router {
            options: self.options,
            mapper,
            routes: RouteCollection::new(self.response_resolver),
            middleware: self.middleware,
            current: ArcSwapOption::empty(),
        };
        router.register(self.definitions)?;

        info!(routes = router.routes.len(), "router built");
        Ok(router)
    }
}

impl RouteRegistrar for RouterBuilder {
    fn define(mut self, definitions: impl IntoIterator<Item = RouteDefinition>) -> Self {
        self.definitions.extend(definitions);
        self
    }
}

impl fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("options", &self.options)
            .field("dispatchers", &self.dispatchers)
            .field("middleware", &self.middleware)
            .field("definitions", &self.definitions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::event::HttpEvent;
    use crate::handler_fn;
    use crate::middleware::ResponseResult;
    use crate::response::{DefaultResponseResolver, ResponseContent};
    use async_trait::async_trait;
    use http::{HeaderValue, Method, StatusCode};
    use serde_json::json;

    fn event(method: Method, uri: &str) -> HttpEvent {
        HttpEvent::parse(method, uri).unwrap()
    }

    struct Deny;

    #[async_trait]
    impl Middleware for Deny {
        async fn on_request(&self, ctx: &RouteContext) -> Result<Option<OutgoingResponse>, BoxError> {
            Ok(ctx.query_param("token").is_none().then(|| OutgoingResponse::new(StatusCode::UNAUTHORIZED)))
        }
    }

    struct Stamp;

    #[async_trait]
    impl Middleware for Stamp {
        async fn on_response(&self, _ctx: &RouteContext, resp: &mut ResponseResult) {
            if let Ok(response) = resp {
                response.headers_mut().insert("x-stamp", HeaderValue::from_static("1"));
            }
        }
    }

    fn router() -> Router {
        Router::builder()
            .response_resolver(DefaultResponseResolver)
            .middleware("deny", Deny)
            .middleware("stamp", Stamp)
            .get("/ping", handler_fn(|_ctx| async { "pong" }))
            .define([RouteDefinition::new("/secret")
                .method("GET")
                .name("secret")
                .middleware("stamp")
                .middleware("deny")
                .handler(handler_fn(|_ctx| async { "secret" }))])
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_and_head_twin() {
        let router = router();

        let response = router.dispatch(&event(Method::GET, "/ping")).await.unwrap();
        assert_eq!(response.content(), &ResponseContent::Text("pong".into()));
        let response = router.dispatch(&event(Method::HEAD, "/ping")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert_eq!(router.dump_routes().len(), 2);
        assert_eq!(router.get_routes().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_group_registers_nothing() {
        let router = Router::builder()
            .group(RouteDefinition::new("/admin").name("admin"), |admin| admin)
            .get("/ping", handler_fn(|_ctx| async { "pong" }))
            .build()
            .unwrap();

        assert_eq!(router.dump_routes().len(), 1);
        assert_eq!(router.dump_routes()[0].path, "/ping");
        assert!(!router.has_route("admin"));
        let error = router.dispatch(&event(Method::GET, "/admin")).await.unwrap_err();
        assert!(matches!(error, RouterError::RouteNotFound { .. }));
    }

    #[tokio::test]
    async fn test_middleware_short_circuit_and_response_hook() {
        let router = router();

        let response = router.dispatch(&event(Method::GET, "/secret")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router.dispatch(&event(Method::GET, "/secret?token=t")).await.unwrap();
        assert_eq!(response.content(), &ResponseContent::Text("secret".into()));
        assert_eq!(response.headers().get("x-stamp").unwrap(), "1");
    }

    #[test]
    fn test_unknown_middleware_is_rejected() {
        let error = Router::builder()
            .define([RouteDefinition::new("/").method("GET").middleware("nope").handler(handler_fn(|_ctx| async {}))])
            .build()
            .unwrap_err();
        assert!(error.is_configuration());

        let skipped = Router::builder()
            .config(RouterOptions::builder().skip_middleware(true).build())
            .define([RouteDefinition::new("/").method("GET").middleware("nope").handler(handler_fn(|_ctx| async {}))])
            .build();
        assert!(skipped.is_ok());
    }

    #[tokio::test]
    async fn test_current_route_and_parameters() {
        let router = Router::builder()
            .define([RouteDefinition::new("/users/:id").method("GET").name("users.show").handler(handler_fn(|_ctx| async {}))])
            .build()
            .unwrap();

        assert!(router.get_current_route().is_none());
        assert!(matches!(router.get_parameters(), Err(RouterError::NotBound)));

        let response = router.dispatch(&event(Method::GET, "/users/9")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(router.get_current_route().unwrap().name(), Some("users.show"));
        assert_eq!(router.get_parameters().unwrap().get("id"), Some(&json!(9)));
    }

    #[tokio::test]
    async fn test_respond_with_route_name_and_generate() {
        let router = router();
        let response = router.respond_with_route_name(&event(Method::GET, "/other?token=1"), "secret").await.unwrap();
        assert_eq!(response.content(), &ResponseContent::Text("secret".into()));

        assert!(router.has_route("secret"));
        assert_eq!(router.generate(&GenerateOptions::named("secret")).unwrap(), "/secret");
        assert!(router.generate(&GenerateOptions::named("missing")).unwrap_err().is_configuration());
        assert!(router.generate(&GenerateOptions::new()).unwrap_err().is_configuration());
    }

    #[tokio::test]
    async fn test_register_after_build() {
        let mut router = router();
        router
            .register(vec![RouteDefinition::new("/late").method("POST").handler(handler_fn(|_ctx| async { "late" }))])
            .unwrap();
        let response = router.dispatch(&event(Method::POST, "/late")).await.unwrap();
        assert_eq!(response.content(), &ResponseContent::Text("late".into()));
    }
}
