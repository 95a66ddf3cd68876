//! Compiled routes.
//!
//! A [`Route`] owns its validated [`RouteOptions`] and lazily compiles its domain and
//! path patterns on first use. Per-request state lives in the [`RouteContext`] that
//! [`Route::bind`] returns, never on the route.

mod context;
mod redirect;

pub use context::RouteContext;
pub use redirect::Redirect;

use crate::RouterError;
use crate::action::Action;
use crate::binding::Binding;
use crate::container::{Container, EmptyContainer};
use crate::dispatcher::{DispatchTarget, DispatcherType, Dispatchers};
use crate::event::IncomingEvent;
use crate::matcher::{Matcher, MatcherKind, MatcherKinds, default_matchers};
use crate::params::{Params, coerce, to_url_value};
use crate::pattern::{
    CompiledPattern, Defaults, ParamConstraint, Quantifier, Rules, SegmentConstraint, domain_constraint, domain_regex,
};
use crate::response::{OutgoingResponse, ResponseContent, ResponseOptions, ResponseResolver};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// Placeholder shown for unset names and domains in route summaries.
pub const NOT_SET: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn is_secure(self) -> bool {
        self == Self::Https
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl FromStr for Protocol {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(RouterError::configuration(format!("invalid protocol `{other}`"))),
        }
    }
}

pub type Bindings = BTreeMap<String, Arc<dyn Binding>>;

/// The validated, fully merged definition of one route.
#[derive(Clone)]
pub struct RouteOptions {
    pub path: String,
    /// alternate paths accepted by the same route
    pub alias: Vec<String>,
    pub method: Method,
    pub domain: Option<String>,
    pub protocol: Option<Protocol>,
    pub name: Option<String>,
    pub rules: Rules,
    pub defaults: Defaults,
    pub bindings: Bindings,
    pub middleware: Vec<String>,
    pub exclude_middleware: Vec<String>,
    pub redirect: Option<Redirect>,
    pub fallback: bool,
    pub strict: bool,
    pub action: Action,
    /// set on the `HEAD` twin registered alongside every `GET` route
    pub internal_head: bool,
}

impl RouteOptions {
    pub fn new(path: impl Into<String>, method: Method, action: Action) -> Self {
        Self {
            path: path.into(),
            alias: vec![],
            method,
            domain: None,
            protocol: None,
            name: None,
            rules: Rules::new(),
            defaults: Defaults::new(),
            bindings: Bindings::new(),
            middleware: vec![],
            exclude_middleware: vec![],
            redirect: None,
            fallback: false,
            strict: false,
            action,
            internal_head: false,
        }
    }
}

impl fmt::Debug for RouteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteOptions")
            .field("path", &self.path)
            .field("alias", &self.alias)
            .field("method", &self.method)
            .field("domain", &self.domain)
            .field("protocol", &self.protocol)
            .field("name", &self.name)
            .field("rules", &self.rules)
            .field("defaults", &self.defaults)
            .field("bindings", &self.bindings.keys().collect::<Vec<_>>())
            .field("middleware", &self.middleware)
            .field("exclude_middleware", &self.exclude_middleware)
            .field("redirect", &self.redirect)
            .field("fallback", &self.fallback)
            .field("strict", &self.strict)
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

struct DomainPattern {
    constraint: SegmentConstraint,
    regex: Regex,
}

pub struct Route {
    options: RouteOptions,
    domain: OnceCell<Option<DomainPattern>>,
    patterns: OnceCell<Vec<CompiledPattern>>,
    matchers: Vec<Arc<dyn Matcher>>,
    dispatchers: Dispatchers,
    container: Option<Arc<dyn Container>>,
    response_resolver: Option<Arc<dyn ResponseResolver>>,
}

impl Route {
    /// Creates a route with the default matchers and dispatchers.
    pub fn create(options: RouteOptions) -> Self {
        Self {
            options,
            domain: OnceCell::new(),
            patterns: OnceCell::new(),
            matchers: default_matchers(),
            dispatchers: Dispatchers::default(),
            container: None,
            response_resolver: None,
        }
    }

    pub fn with_matchers(mut self, matchers: Vec<Arc<dyn Matcher>>) -> Self {
        self.matchers = matchers;
        self
    }

    /// Adds `dispatchers` over the defaults, replacing those of the same type
    pub fn with_dispatchers(mut self, dispatchers: &Dispatchers) -> Self {
        self.dispatchers.extend(dispatchers);
        self
    }

    pub fn with_container(mut self, container: Option<Arc<dyn Container>>) -> Self {
        self.container = container;
        self
    }

    pub fn with_response_resolver(mut self, resolver: Option<Arc<dyn ResponseResolver>>) -> Self {
        self.response_resolver = resolver;
        self
    }

    pub fn options(&self) -> &RouteOptions {
        &self.options
    }

    pub fn path(&self) -> &str {
        &self.options.path
    }

    pub fn method(&self) -> &Method {
        &self.options.method
    }

    pub fn name(&self) -> Option<&str> {
        self.options.name.as_deref()
    }

    pub fn domain(&self) -> Option<&str> {
        self.options.domain.as_deref()
    }

    pub fn protocol(&self) -> Option<Protocol> {
        self.options.protocol
    }

    pub fn action(&self) -> &Action {
        &self.options.action
    }

    pub fn has_domain(&self) -> bool {
        self.options.domain.as_deref().is_some_and(|domain| !domain.is_empty())
    }

    pub fn is_fallback(&self) -> bool {
        self.options.fallback
    }

    pub fn is_strict(&self) -> bool {
        self.options.strict
    }

    pub fn is_internal_head(&self) -> bool {
        self.options.internal_head
    }

    /// The route middleware minus the excluded ones, in declaration order
    pub fn middleware(&self) -> Vec<&str> {
        self.options
            .middleware
            .iter()
            .filter(|name| !self.options.exclude_middleware.contains(name))
            .map(String::as_str)
            .collect()
    }

    fn domain_pattern(&self) -> Result<Option<&DomainPattern>, RouterError> {
        self.domain
            .get_or_try_init(|| {
                let constraint =
                    domain_constraint(self.options.domain.as_deref(), &self.options.rules, &self.options.defaults)?;
                constraint
                    .map(|constraint| Ok::<_, RouterError>(DomainPattern { regex: domain_regex(&constraint)?, constraint }))
                    .transpose()
            })
            .map(Option::as_ref)
    }

    /// Compiled patterns of the main path followed by the aliases; never empty.
    fn patterns(&self) -> Result<&[CompiledPattern], RouterError> {
        self.patterns
            .get_or_try_init(|| {
                let domain = self.domain_pattern()?.map(|domain| &domain.constraint);
                std::iter::once(&self.options.path)
                    .chain(&self.options.alias)
                    .map(|path| {
                        CompiledPattern::compile(path, domain, &self.options.rules, &self.options.defaults, self.options.strict)
                    })
                    .collect::<Result<Vec<_>, RouterError>>()
            })
            .map(Vec::as_slice)
    }

    /// Compiles the domain and path patterns now rather than on first match.
    pub fn compile(&self) -> Result<(), RouterError> {
        self.patterns().map(|_| ())
    }

    /// Constraints of the main path, left to right
    pub fn segments_constraints(&self) -> Result<&[SegmentConstraint], RouterError> {
        Ok(self.patterns()?[0].segments())
    }

    pub fn domain_constraint(&self) -> Result<Option<&SegmentConstraint>, RouterError> {
        Ok(self.domain_pattern()?.map(|domain| &domain.constraint))
    }

    /// Runs every matcher against the event; method matchers are skipped unless `including_method`.
    ///
    /// A route without applicable matchers never matches.
    pub fn matches(&self, event: &dyn IncomingEvent, including_method: bool) -> bool {
        let mut applicable = self
            .matchers
            .iter()
            .filter(|matcher| including_method || matcher.kind() != MatcherKind::Method)
            .peekable();

        if applicable.peek().is_none() {
            return false;
        }
        applicable.all(|matcher| matcher.matches(self, event))
    }

    pub(crate) fn domain_matches(&self, event: &dyn IncomingEvent) -> bool {
        match self.domain_pattern() {
            Ok(None) => true,
            Ok(Some(domain)) => event.host().is_some_and(|host| domain.regex.is_match(host)),
            Err(e) => {
                error!(cause = %e, path = %self.options.path, "failed to compile route domain");
                false
            }
        }
    }

    pub(crate) fn uri_matches(&self, event: &dyn IncomingEvent) -> bool {
        match self.patterns() {
            Ok(patterns) => {
                let uri = event.get_uri(self.has_domain());
                patterns.iter().any(|pattern| pattern.is_match(&uri))
            }
            Err(e) => {
                error!(cause = %e, path = %self.options.path, "failed to compile route path");
                false
            }
        }
    }

    /// Binds the event to this route and returns the per-request context.
    ///
    /// Captured values are coerced to numbers when lossless, absent captures take their
    /// default, bound parameters go through their [`Binding`], and finally route defaults
    /// fill keys that are still absent.
    pub async fn bind(self: &Arc<Self>, event: &dyn IncomingEvent) -> Result<RouteContext, RouterError> {
        let uri = event.get_uri(self.has_domain());
        let mut params = Params::empty();

        match self.patterns()?.iter().find_map(|pattern| pattern.captures(&uri)) {
            Some(captures) => {
                for (constraint, raw) in captures {
                    let value = match raw {
                        Some(raw) => self.resolve_binding(constraint, coerce(raw)).await?,
                        None => constraint.default.clone(),
                    };
                    if let Some(value) = value {
                        params.insert(constraint.param.clone(), value);
                    }
                }
            }
            None => debug!(uri, path = %self.options.path, "bound event does not match the route path"),
        }

        for (key, value) in &self.options.defaults {
            params.insert_absent(key.clone(), value.clone());
        }

        trace!(path = %self.options.path, ?params, "route bound");
        Ok(RouteContext::new(Arc::clone(self), event, params))
    }

    async fn resolve_binding(&self, constraint: &ParamConstraint, value: Value) -> Result<Option<Value>, RouterError> {
        let Some(binding) = self.options.bindings.get(&constraint.param) else {
            return Ok(Some(value));
        };
        let container = self.container.as_deref().unwrap_or(&EmptyContainer);

        match binding.resolve(&constraint.alias, &value, container).await {
            Ok(Some(resolved)) if !resolved.is_null() => Ok(Some(resolved)),
            Ok(_) if constraint.optional => {
                warn!(param = %constraint.param, "binding found nothing, using default");
                Ok(constraint.default.clone())
            }
            Ok(_) => Err(RouterError::resource_not_found(&constraint.param, None)),
            Err(e) if constraint.optional => {
                warn!(param = %constraint.param, cause = %e, "binding failed, using default");
                Ok(constraint.default.clone())
            }
            Err(e) => Err(RouterError::resource_not_found(&constraint.param, Some(e))),
        }
    }

    /// Runs the route action for a bound context.
    ///
    /// A configured redirect wins over any action; other actions go to the dispatcher
    /// registered for their type.
    pub async fn run(&self, ctx: &RouteContext, event: &dyn IncomingEvent) -> Result<OutgoingResponse, RouterError> {
        if let Some(redirect) = &self.options.redirect {
            return self.redirect_response(redirect, event);
        }

        match &self.options.action {
            Action::Redirect(redirect) => self.redirect_response(redirect, event),
            Action::Component(component) => {
                self.dispatch(DispatcherType::Component, DispatchTarget::Component(component), ctx).await
            }
            Action::Controller { controller, method } => {
                let instance = self
                    .container
                    .as_ref()
                    .and_then(|container| container.resolve_controller(controller.name()))
                    .unwrap_or_else(|| controller.construct());
                self.dispatch(DispatcherType::Controller, DispatchTarget::Controller { instance, method }, ctx).await
            }
            Action::Callable(handler) => {
                self.dispatch(DispatcherType::Callable, DispatchTarget::Callable(handler.as_ref()), ctx).await
            }
        }
    }

    async fn dispatch(
        &self,
        kind: DispatcherType,
        target: DispatchTarget<'_>,
        ctx: &RouteContext,
    ) -> Result<OutgoingResponse, RouterError> {
        let dispatcher = self.dispatchers.get(kind)?;
        dispatcher.dispatch(target, ctx).await.map_err(RouterError::handler)
    }

    fn redirect_response(&self, redirect: &Redirect, event: &dyn IncomingEvent) -> Result<OutgoingResponse, RouterError> {
        let (status, location) = redirect.resolve(self, event)?;
        debug!(path = %self.options.path, %status, location, "redirecting");

        match &self.response_resolver {
            Some(resolver) => {
                let mut headers = HeaderMap::new();
                let location = HeaderValue::from_str(&location).map_err(|e| RouterError::handler(e.into()))?;
                headers.insert(http::header::LOCATION, location);
                resolver
                    .resolve(ResponseOptions { status: Some(status), headers, content: ResponseContent::Empty })
                    .map_err(RouterError::handler)
            }
            None => OutgoingResponse::redirect(status, &location).map_err(RouterError::handler),
        }
    }

    /// Builds a URL for this route, the inverse of [`Route::bind`].
    ///
    /// Supplied params fill placeholders (falling back to defaults), leftover params and
    /// the explicit query become the query string.
    pub fn generate(&self, options: &GenerateOptions) -> Result<String, RouterError> {
        let mut params = options.params.clone();
        let mut url = String::new();

        let domain = self.domain_constraint()?;
        if !options.with_domain
            && let Some(param) = domain.and_then(SegmentConstraint::as_param)
        {
            params.remove(&param.param);
        }

        if options.with_domain
            && let Some(domain) = domain
        {
            let protocol = options.protocol.or(self.options.protocol).unwrap_or(Protocol::Http);
            url.push_str(protocol.as_str());
            url.push_str("://");
            match domain {
                SegmentConstraint::Literal(literal) => url.push_str(literal),
                SegmentConstraint::Param(param) => {
                    if let Some(value) = self.take_value(param, &mut params)? {
                        url.push_str(&param.prefix);
                        url.push_str(&value);
                        url.push_str(&param.suffix);
                    } else {
                        url.push_str(&param.suffix);
                    }
                }
            }
        }

        let mut path = String::new();
        for segment in self.segments_constraints()? {
            match segment {
                SegmentConstraint::Literal(literal) => {
                    path.push('/');
                    path.push_str(literal);
                }
                SegmentConstraint::Param(param) => match self.take_value(param, &mut params)? {
                    Some(value) => {
                        path.push('/');
                        path.push_str(&param.prefix);
                        path.push_str(&encode_path_value(&value, param.quantifier));
                        path.push_str(&param.suffix);
                    }
                    // only the capture is optional once a prefix is declared
                    None if !param.prefix.is_empty() => {
                        path.push('/');
                        path.push_str(&param.prefix);
                        path.push_str(&param.suffix);
                    }
                    None => {}
                },
            }
        }
        if path.is_empty() || (self.options.path.ends_with('/') && !path.ends_with('/')) {
            path.push('/');
        }
        url.push_str(&collapse_slashes(&path));

        let mut query: Vec<(String, String)> =
            params.iter().filter_map(|(key, value)| Some((key.clone(), to_url_value(value)?))).collect();
        query.extend(options.query.iter().cloned());
        if !query.is_empty() {
            let encoded = serde_urlencoded::to_string(&query)
                .map_err(|e| RouterError::configuration(format!("failed to encode query string: {e}")))?;
            url.push('?');
            url.push_str(&encoded);
        }

        if let Some(hash) = &options.hash {
            url.push('#');
            url.push_str(hash);
        }

        Ok(url)
    }

    /// Takes the value for `param` out of `params`, or its default; errors when a required value is missing.
    fn take_value(&self, param: &ParamConstraint, params: &mut Params) -> Result<Option<String>, RouterError> {
        let value = params
            .remove(&param.param)
            .and_then(|value| to_url_value(&value))
            .or_else(|| param.default.as_ref().and_then(to_url_value));

        match value {
            Some(value) => Ok(Some(value)),
            None if param.optional => Ok(None),
            None => Err(RouterError::missing_parameter(
                &param.param,
                self.options.name.as_deref().unwrap_or(&self.options.path),
            )),
        }
    }

    /// Stable introspection snapshot of this route
    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            path: self.options.path.clone(),
            method: self.options.method.to_string(),
            handler: self.options.action.label(),
            name: self.options.name.clone().unwrap_or_else(|| NOT_SET.to_owned()),
            domain: self.options.domain.clone().unwrap_or_else(|| NOT_SET.to_owned()),
            fallback: self.options.fallback,
        }
    }
}

fn encode_path_value(value: &str, quantifier: Quantifier) -> String {
    if quantifier.is_repeat() {
        value.split('/').map(urlencoding::encode).collect::<Vec<_>>().join("/")
    } else {
        urlencoding::encode(value).into_owned()
    }
}

fn collapse_slashes(path: &str) -> String {
    let mut collapsed = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && collapsed.ends_with('/') {
            continue;
        }
        collapsed.push(c);
    }
    collapsed
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("options", &self.options)
            .field("matchers", &MatcherKinds(&self.matchers))
            .field("dispatchers", &self.dispatchers)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.summary();
        write!(f, "{} {} -> {} (name: {}, domain: {}", summary.method, summary.path, summary.handler, summary.name, summary.domain)?;
        if summary.fallback {
            f.write_str(", fallback")?;
        }
        f.write_str(")")
    }
}

/// What [`Route::summary`] and route dumps report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    pub path: String,
    pub method: String,
    pub handler: String,
    pub name: String,
    pub domain: String,
    pub fallback: bool,
}

/// Input of [`Route::generate`] and [`crate::Router::generate`].
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// route name, used by the router to pick the route
    pub name: Option<String>,
    pub params: Params,
    pub query: Vec<(String, String)>,
    pub hash: Option<String>,
    pub with_domain: bool,
    pub protocol: Option<Protocol>,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Self::default() }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key, value.into());
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn with_domain(mut self, protocol: Option<Protocol>) -> Self {
        self.with_domain = true;
        self.protocol = protocol;
        self
    }
}

/// Builds the `200 OK` answer to an `OPTIONS` request, listing the allowed methods.
pub(crate) fn allow_response(
    resolver: Option<&dyn ResponseResolver>,
    methods: &[Method],
) -> Result<OutgoingResponse, RouterError> {
    let resolver = resolver.ok_or_else(|| RouterError::configuration("no response resolver configured"))?;
    let allow = methods.iter().map(Method::as_str).collect::<Vec<_>>().join(",");

    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&allow).map_err(|e| RouterError::handler(e.into()))?;
    headers.insert(http::header::ALLOW, value);
    let content = ResponseContent::Json(serde_json::json!({ "Allow": allow }));

    resolver
        .resolve(ResponseOptions { status: Some(StatusCode::OK), headers, content })
        .map_err(RouterError::handler)
}

#[cfg(test)]
mod tests;
