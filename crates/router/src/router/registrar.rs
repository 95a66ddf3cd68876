use crate::action::ActionDefinition;
use crate::mapper::{HTTP_METHODS, RouteDefinition};
use http::Method;

/// Path of the catch-all route registered by [`RouteRegistrar::fallback`].
pub const FALLBACK_PATH: &str = "/:__fallback__(.*)*";

/// The registration surface shared by the router builder and route groups.
///
/// Every method produces [`RouteDefinition`]s and hands them to
/// [`RouteRegistrar::define`]; nothing is validated until the router is built.
pub trait RouteRegistrar: Sized {
    fn define(self, definitions: impl IntoIterator<Item = RouteDefinition>) -> Self;

    /// Registers a `GET` route and its internal `HEAD` twin.
    fn get(self, path: impl Into<String>, action: impl Into<ActionDefinition>) -> Self {
        let definition = RouteDefinition::new(path).method(Method::GET.as_str()).action(action);
        let mut head = definition.clone().method(Method::HEAD.as_str());
        head.internal_head = true;
        self.define([definition, head])
    }

    fn post(self, path: impl Into<String>, action: impl Into<ActionDefinition>) -> Self {
        self.match_methods([Method::POST], path, action)
    }

    fn put(self, path: impl Into<String>, action: impl Into<ActionDefinition>) -> Self {
        self.match_methods([Method::PUT], path, action)
    }

    fn patch(self, path: impl Into<String>, action: impl Into<ActionDefinition>) -> Self {
        self.match_methods([Method::PATCH], path, action)
    }

    fn delete(self, path: impl Into<String>, action: impl Into<ActionDefinition>) -> Self {
        self.match_methods([Method::DELETE], path, action)
    }

    fn options(self, path: impl Into<String>, action: impl Into<ActionDefinition>) -> Self {
        self.match_methods([Method::OPTIONS], path, action)
    }

    /// Registers the route for every supported verb.
    fn any(self, path: impl Into<String>, action: impl Into<ActionDefinition>) -> Self {
        self.match_methods(HTTP_METHODS, path, action)
    }

    fn match_methods(
        self,
        methods: impl IntoIterator<Item = Method>,
        path: impl Into<String>,
        action: impl Into<ActionDefinition>,
    ) -> Self {
        let definition = RouteDefinition::new(path)
            .methods(methods.into_iter().map(|method| method.as_str().to_owned()))
            .action(action);
        self.define([definition])
    }

    /// Registers a catch-all `GET`/`HEAD` route tried after every other route.
    fn fallback(self, action: impl Into<ActionDefinition>) -> Self {
        let definition = RouteDefinition::new(FALLBACK_PATH).method(Method::GET.as_str()).fallback(true).action(action);
        let mut head = definition.clone().method(Method::HEAD.as_str());
        head.internal_head = true;
        self.define([definition, head])
    }

    /// Registers the routes added in `routes` as children of `attributes`.
    ///
    /// ```
    /// use micro_router::{RouteDefinition, RouteRegistrar, Router, handler_fn};
    ///
    /// let router = Router::builder()
    ///     .group(RouteDefinition::new("/admin").name("admin").middleware("auth"), |group| {
    ///         group.get("/dashboard", handler_fn(|_ctx| async { "dashboard" }))
    ///     });
    /// # let _ = router;
    /// ```
    fn group<F>(self, attributes: RouteDefinition, routes: F) -> Self
    where
        F: FnOnce(RouteGroup) -> RouteGroup,
    {
        let group = routes(RouteGroup::default());
        self.define([attributes.children(group.definitions)])
    }
}

/// Collects the routes of one [`RouteRegistrar::group`].
#[derive(Debug, Default)]
pub struct RouteGroup {
    definitions: Vec<RouteDefinition>,
}

impl RouteRegistrar for RouteGroup {
    fn define(mut self, definitions: impl IntoIterator<Item = RouteDefinition>) -> Self {
        self.definitions.extend(definitions);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler_fn;

    fn ok() -> ActionDefinition {
        handler_fn(|_ctx| async { "ok" }).into()
    }

    #[test]
    fn test_get_adds_head_twin() {
        let group = RouteGroup::default().get("/a", ok());
        assert_eq!(group.definitions.len(), 2);
        assert_eq!(group.definitions[0].method.as_deref(), Some("GET"));
        assert!(!group.definitions[0].internal_head);
        assert_eq!(group.definitions[1].method.as_deref(), Some("HEAD"));
        assert!(group.definitions[1].internal_head);
    }

    #[test]
    fn test_methods() {
        let group = RouteGroup::default().any("/any", ok()).match_methods([Method::PUT, Method::PATCH], "/two", ok());
        assert_eq!(group.definitions[0].methods.len(), HTTP_METHODS.len());
        assert_eq!(group.definitions[1].methods, ["PUT", "PATCH"]);
    }

    #[test]
    fn test_nested_groups() {
        let group = RouteGroup::default().group(RouteDefinition::new("/v1"), |v1| {
            v1.post("/items", ok()).group(RouteDefinition::new("/admin"), |admin| admin.delete("/items/:id", ok()))
        });

        let v1 = &group.definitions[0];
        assert_eq!(v1.children.len(), 2);
        assert_eq!(v1.children[1].children[0].methods, ["DELETE"]);
    }
}
