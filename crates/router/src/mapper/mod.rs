//! Route mapper: turns nested [`RouteDefinition`]s into validated, compiled [`Route`]s.
//!
//! Mapping runs depth first. Every definition is first expanded into one flat
//! definition per `path × method × protocol × domain` combination, each combination is
//! merged with its parent, and leaves are validated into [`RouteOptions`].

mod definition;
pub mod merge;

pub use definition::RouteDefinition;

use crate::RouterError;
use crate::action::{Action, ActionDefinition};
use crate::config::RouterOptions;
use crate::container::Container;
use crate::dispatcher::Dispatchers;
use crate::matcher::{Matcher, MatcherKinds, default_matchers};
use crate::pattern::{Defaults, Rules};
use crate::response::ResponseResolver;
use crate::route::{Bindings, Protocol, Redirect, Route, RouteOptions};
use http::Method;
use merge::{join_paths, merge_action, merge_list, merge_map, merge_name, merge_scalar, normalize_name};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// The verbs a route may be registered for.
pub const HTTP_METHODS: [Method; 7] =
    [Method::GET, Method::PUT, Method::HEAD, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS];

/// One definition after expansion and inheritance: every axis holds a single value.
#[derive(Clone, Default)]
struct FlatDefinition {
    path: Option<String>,
    alias: Vec<String>,
    method: Option<String>,
    domain: Option<String>,
    protocol: Option<Protocol>,
    name: Option<String>,
    rules: Rules,
    defaults: Defaults,
    bindings: Bindings,
    middleware: Vec<String>,
    exclude_middleware: Vec<String>,
    redirect: Option<Redirect>,
    fallback: Option<bool>,
    strict: Option<bool>,
    action: Option<ActionDefinition>,
    internal_head: bool,
}

impl FlatDefinition {
    fn inherit(self, parent: Option<&FlatDefinition>) -> Self {
        let Some(parent) = parent else {
            return self;
        };

        let path = match (&parent.path, self.path) {
            (Some(parent_path), child) => Some(join_paths(parent_path, child.as_deref().unwrap_or_default())),
            (None, child) => child,
        };
        let alias = match &parent.path {
            Some(parent_path) => self.alias.iter().map(|alias| join_paths(parent_path, alias)).collect(),
            None => self.alias,
        };

        Self {
            path,
            alias,
            method: merge_scalar(parent.method.as_ref(), self.method),
            domain: merge_scalar(parent.domain.as_ref(), self.domain),
            protocol: merge_scalar(parent.protocol.as_ref(), self.protocol),
            name: merge_name(parent.name.as_deref(), self.name.as_deref()),
            rules: merge_map(&parent.rules, self.rules),
            defaults: merge_map(&parent.defaults, self.defaults),
            bindings: merge_map(&parent.bindings, self.bindings),
            middleware: merge_list(&parent.middleware, self.middleware),
            exclude_middleware: merge_list(&parent.exclude_middleware, self.exclude_middleware),
            redirect: merge_scalar(parent.redirect.as_ref(), self.redirect),
            fallback: merge_scalar(parent.fallback.as_ref(), self.fallback),
            strict: merge_scalar(parent.strict.as_ref(), self.strict),
            action: merge_action(parent.action.as_ref(), self.action),
            internal_head: self.internal_head || parent.internal_head,
        }
    }

    /// Identifies the definition in error messages.
    fn describe(&self) -> String {
        format!(
            "{} {} (name: {})",
            self.method.as_deref().unwrap_or("<no method>"),
            self.path.as_deref().unwrap_or("<no path>"),
            self.name.as_deref().unwrap_or("<none>")
        )
    }
}

/// Expands the array axes of one definition into flat definitions, full cartesian product.
fn expand(definition: &RouteDefinition) -> Vec<FlatDefinition> {
    fn axis<T: Clone>(values: &[T]) -> Vec<Option<T>> {
        if values.is_empty() { vec![None] } else { values.iter().cloned().map(Some).collect() }
    }

    let methods = definition.candidate_methods();
    let mut expanded = Vec::new();

    for path in axis(&definition.paths) {
        for method in axis(&methods) {
            for protocol in axis(&definition.protocols) {
                for domain in axis(&definition.domains) {
                    expanded.push(FlatDefinition {
                        path: path.clone(),
                        alias: definition.alias.clone(),
                        method: method.clone(),
                        domain,
                        protocol,
                        name: definition.name.clone(),
                        rules: definition.rules.clone(),
                        defaults: definition.defaults.clone(),
                        bindings: definition.bindings.clone(),
                        middleware: definition.middleware.clone(),
                        exclude_middleware: definition.exclude_middleware.clone(),
                        redirect: definition.redirect.clone(),
                        fallback: definition.fallback,
                        strict: definition.strict,
                        action: definition.action.clone(),
                        internal_head: definition.internal_head,
                    });
                }
            }
        }
    }
    expanded
}

/// Builds routes from definitions, configuring each with the shared matchers,
/// dispatchers, container and response resolver.
#[derive(Clone)]
pub struct RouteMapper {
    options: RouterOptions,
    matchers: Vec<Arc<dyn Matcher>>,
    dispatchers: Dispatchers,
    container: Option<Arc<dyn Container>>,
    response_resolver: Option<Arc<dyn ResponseResolver>>,
}

impl RouteMapper {
    pub fn new(options: RouterOptions) -> Self {
        Self {
            options,
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

    pub fn with_dispatchers(mut self, dispatchers: Dispatchers) -> Self {
        self.dispatchers = dispatchers;
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

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    /// Maps definitions to compiled routes, failing on the first invalid one.
    pub fn map(&self, definitions: Vec<RouteDefinition>) -> Result<Vec<Route>, RouterError> {
        self.flatten(definitions)?.into_iter().map(|options| self.create_route(options)).collect()
    }

    /// Expands, merges and validates definitions without building routes.
    pub fn flatten(&self, definitions: Vec<RouteDefinition>) -> Result<Vec<RouteOptions>, RouterError> {
        let mut leaves = Vec::new();
        for definition in &definitions {
            self.walk(definition, None, 1, &mut leaves)?;
        }
        leaves.into_iter().map(|leaf| self.to_route_options(leaf)).collect()
    }

    fn walk(
        &self,
        definition: &RouteDefinition,
        parent: Option<&FlatDefinition>,
        depth: usize,
        leaves: &mut Vec<FlatDefinition>,
    ) -> Result<(), RouterError> {
        if depth > self.options.max_depth {
            return Err(RouterError::configuration(format!(
                "route definitions are nested deeper than the maximum depth of {}",
                self.options.max_depth
            )));
        }

        for flat in expand(definition) {
            let merged = flat.inherit(parent);
            if definition.children.is_empty() {
                if merged.action.is_none() && merged.redirect.is_none() {
                    debug!(definition = %merged.describe(), "skipped route definition without action");
                    continue;
                }
                trace!(definition = %merged.describe(), "collected route definition");
                leaves.push(merged);
            } else {
                for child in &definition.children {
                    self.walk(child, Some(&merged), depth + 1, leaves)?;
                }
            }
        }
        Ok(())
    }

    /// Validates a leaf and applies the router-wide options.
    fn to_route_options(&self, flat: FlatDefinition) -> Result<RouteOptions, RouterError> {
        let describe = flat.describe();

        let path = flat
            .path
            .as_deref()
            .ok_or_else(|| RouterError::configuration(format!("route {describe} has no path")))?;
        let method = flat
            .method
            .as_deref()
            .ok_or_else(|| RouterError::configuration(format!("route {describe} has no method")))?;
        let method = HTTP_METHODS
            .iter()
            .find(|known| known.as_str() == method)
            .cloned()
            .ok_or_else(|| RouterError::configuration(format!("route {describe} has an invalid method `{method}`")))?;
        let action = Action::resolve(flat.action, flat.redirect.as_ref())
            .map_err(|e| RouterError::configuration(format!("route {describe}: {e}")))?;

        let mut options = RouteOptions::new(join_paths(&self.options.prefix, path), method, action);
        options.alias = flat.alias.iter().map(|alias| join_paths(&self.options.prefix, alias)).collect();
        options.domain = flat.domain;
        options.protocol = flat.protocol;
        options.name = flat.name.as_deref().and_then(normalize_name);
        options.rules = merge_map(&self.options.rules, flat.rules);
        options.defaults = merge_map(&self.options.defaults, flat.defaults);
        options.bindings = flat.bindings;
        options.middleware = flat.middleware;
        options.exclude_middleware = flat.exclude_middleware;
        options.redirect = flat.redirect;
        options.fallback = flat.fallback.unwrap_or(false);
        options.strict = flat.strict.unwrap_or(self.options.strict);
        options.internal_head = flat.internal_head;
        Ok(options)
    }

    /// Creates the route, configures it and compiles its patterns.
    pub fn create_route(&self, options: RouteOptions) -> Result<Route, RouterError> {
        let route = Route::create(options)
            .with_matchers(self.matchers.clone())
            .with_dispatchers(&self.dispatchers)
            .with_container(self.container.clone())
            .with_response_resolver(self.response_resolver.clone());
        route.compile()?;
        debug!(route = %route, "mapped route");
        Ok(route)
    }
}

impl fmt::Debug for RouteMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMapper")
            .field("options", &self.options)
            .field("matchers", &MatcherKinds(&self.matchers))
            .field("dispatchers", &self.dispatchers)
            .finish_non_exhaustive()
    }
}
