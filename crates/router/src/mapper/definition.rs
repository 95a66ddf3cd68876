use crate::action::ActionDefinition;
use crate::binding::Binding;
use crate::route::{Bindings, Protocol, Redirect};
use crate::pattern::{Defaults, Rules};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A user-authored route definition, possibly nested.
///
/// `paths`, `methods`, `domains` and `protocols` may hold several values; the mapper
/// expands them into one route per combination. A definition with `children` is a
/// group: its fields are inherited by every child and it never becomes a route itself.
///
/// ```
/// use micro_router::{RouteDefinition, handler_fn};
///
/// let users = RouteDefinition::new("/users")
///     .name("users")
///     .middleware("auth")
///     .rule("id", "\\d+")
///     .child(RouteDefinition::new("/:id").method("GET").name("show").handler(handler_fn(|_ctx| async { "user" })))
///     .child(RouteDefinition::new("/").methods(["POST", "PUT"]).name("store").handler(handler_fn(|_ctx| async { "saved" })));
/// # let _ = users;
/// ```
#[derive(Clone, Default)]
pub struct RouteDefinition {
    pub paths: Vec<String>,
    pub alias: Vec<String>,
    pub method: Option<String>,
    pub methods: Vec<String>,
    pub domains: Vec<String>,
    pub protocols: Vec<Protocol>,
    pub name: Option<String>,
    pub rules: Rules,
    pub defaults: Defaults,
    pub bindings: Bindings,
    pub middleware: Vec<String>,
    pub exclude_middleware: Vec<String>,
    pub redirect: Option<Redirect>,
    pub fallback: Option<bool>,
    pub strict: Option<bool>,
    pub action: Option<ActionDefinition>,
    pub children: Vec<RouteDefinition>,
    pub(crate) internal_head: bool,
}

impl RouteDefinition {
    pub fn new(path: impl Into<String>) -> Self {
        Self { paths: vec![path.into()], ..Self::default() }
    }

    /// A definition without a path of its own, only useful as a group.
    pub fn group() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias.push(alias.into());
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods.extend(methods.into_iter().map(Into::into));
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domains.push(domain.into());
        self
    }

    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocols.push(protocol);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn rule(mut self, param: impl Into<String>, rule: impl Into<String>) -> Self {
        self.rules.insert(param.into(), rule.into());
        self
    }

    pub fn default_value(mut self, param: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(param.into(), value.into());
        self
    }

    pub fn binding<B: Binding + 'static>(mut self, param: impl Into<String>, binding: B) -> Self {
        self.bindings.insert(param.into(), Arc::new(binding));
        self
    }

    pub fn middleware(mut self, name: impl Into<String>) -> Self {
        self.middleware.push(name.into());
        self
    }

    pub fn exclude_middleware(mut self, name: impl Into<String>) -> Self {
        self.exclude_middleware.push(name.into());
        self
    }

    pub fn redirect(mut self, redirect: impl Into<Redirect>) -> Self {
        self.redirect = Some(redirect.into());
        self
    }

    pub fn fallback(mut self, fallback: bool) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    pub fn action(mut self, action: impl Into<ActionDefinition>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Shorthand for [`RouteDefinition::action`] with a [`crate::RouteHandler`].
    pub fn handler<H: crate::RouteHandler + 'static>(mut self, handler: H) -> Self {
        self.action = Some(ActionDefinition::handler(handler));
        self
    }

    pub fn child(mut self, child: RouteDefinition) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = RouteDefinition>) -> Self {
        self.children.extend(children);
        self
    }

    /// `method` followed by `methods`, deduplicated in first-seen order and upper-cased.
    pub(crate) fn candidate_methods(&self) -> Vec<String> {
        let mut methods: Vec<String> = Vec::new();
        for method in self.method.iter().chain(&self.methods) {
            let method = method.trim().to_ascii_uppercase();
            if !methods.contains(&method) {
                methods.push(method);
            }
        }
        methods
    }
}

impl fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("paths", &self.paths)
            .field("method", &self.method)
            .field("methods", &self.methods)
            .field("domains", &self.domains)
            .field("name", &self.name)
            .field("action", &self.action)
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}
