//! Named route middleware.
//!
//! Middleware is registered on the router under a name; routes refer to it through
//! their `middleware`/`exclude_middleware` lists. The router runs a route's chain
//! around [`Route::run`](crate::Route::run) once the event is bound.

use crate::RouterError;
use crate::error::BoxError;
use crate::response::OutgoingResponse;
use crate::route::RouteContext;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type ResponseResult = Result<OutgoingResponse, RouterError>;

#[async_trait]
pub trait Middleware: Send + Sync {
    /// Runs before the route; returning a response skips the route and the rest of the chain.
    async fn on_request(&self, _ctx: &RouteContext) -> Result<Option<OutgoingResponse>, BoxError> {
        Ok(None)
    }

    async fn on_response(&self, _ctx: &RouteContext, _resp: &mut ResponseResult) {}
}

/// Middleware known to a router, by name.
#[derive(Clone, Default)]
pub struct MiddlewareRegistry {
    inner: HashMap<String, Arc<dyn Middleware>>,
}

impl MiddlewareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<M: Middleware + 'static>(&mut self, name: impl Into<String>, middleware: M) {
        self.inner.insert(name.into(), Arc::new(middleware));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Resolves names into a chain, in the given order.
    pub fn chain(&self, names: &[&str]) -> Result<MiddlewareChain, RouterError> {
        names
            .iter()
            .map(|name| {
                self.inner
                    .get(*name)
                    .cloned()
                    .ok_or_else(|| RouterError::configuration(format!("middleware `{name}` is not registered")))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|inner| MiddlewareChain { inner })
    }
}

impl fmt::Debug for MiddlewareRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.inner.keys()).finish()
    }
}

/// The resolved middleware of one route.
pub struct MiddlewareChain {
    inner: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl Middleware for MiddlewareChain {
    async fn on_request(&self, ctx: &RouteContext) -> Result<Option<OutgoingResponse>, BoxError> {
        for middleware in &self.inner {
            if let Some(response) = middleware.on_request(ctx).await? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }

    async fn on_response(&self, ctx: &RouteContext, resp: &mut ResponseResult) {
        for middleware in &self.inner {
            middleware.on_response(ctx, resp).await;
        }
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain").field("len", &self.inner.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl Middleware for Noop {}

    #[test]
    fn test_chain_resolution() {
        let mut registry = MiddlewareRegistry::new();
        registry.register("auth", Noop);
        registry.register("log", Noop);

        assert_eq!(registry.chain(&["log", "auth", "log"]).unwrap().len(), 3);
        assert!(registry.chain(&[]).unwrap().is_empty());

        let error = registry.chain(&["auth", "csrf"]).unwrap_err();
        assert!(error.is_configuration());
        assert!(error.to_string().contains("csrf"));
    }
}
