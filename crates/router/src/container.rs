//! The dependency-resolver capability the router consumes.
//!
//! The router never owns a service container. Hosts implement [`Container`] over
//! whatever they use, and the router asks it for controller instances and hands it to
//! binding resolvers.

use crate::action::Controller;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub trait Container: Send + Sync {
    /// Looks up a service by key
    fn resolve(&self, key: &str) -> Option<Arc<dyn Any + Send + Sync>>;

    /// Looks up a controller instance by its name
    fn resolve_controller(&self, _name: &str) -> Option<Arc<dyn Controller>> {
        None
    }
}

/// Resolves `key` and downcasts it to `T`.
pub fn resolve_as<T: Any + Send + Sync>(container: &dyn Container, key: &str) -> Option<Arc<T>> {
    container.resolve(key).and_then(|service| service.downcast::<T>().ok())
}

/// A container that knows nothing, used when the host configures none.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyContainer;

impl Container for EmptyContainer {
    fn resolve(&self, _key: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        None
    }
}

/// A map backed container, enough for small applications and tests.
#[derive(Default)]
pub struct SimpleContainer {
    services: HashMap<String, Arc<dyn Any + Send + Sync>>,
    controllers: HashMap<String, Arc<dyn Controller>>,
}

impl SimpleContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service<T: Any + Send + Sync>(mut self, key: impl Into<String>, service: T) -> Self {
        self.services.insert(key.into(), Arc::new(service));
        self
    }

    pub fn with_controller<C: Controller + 'static>(mut self, name: impl Into<String>, controller: C) -> Self {
        self.controllers.insert(name.into(), Arc::new(controller));
        self
    }
}

impl Container for SimpleContainer {
    fn resolve(&self, key: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        self.services.get(key).cloned()
    }

    fn resolve_controller(&self, name: &str) -> Option<Arc<dyn Controller>> {
        self.controllers.get(name).cloned()
    }
}

impl fmt::Debug for SimpleContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleContainer")
            .field("services", &self.services.keys().collect::<Vec<_>>())
            .field("controllers", &self.controllers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_as() {
        let container = SimpleContainer::new().with_service("db_url", String::from("postgres://localhost"));

        let url = resolve_as::<String>(&container, "db_url").unwrap();
        assert_eq!(url.as_str(), "postgres://localhost");
        assert!(resolve_as::<u32>(&container, "db_url").is_none());
        assert!(resolve_as::<String>(&EmptyContainer, "db_url").is_none());
    }
}
