//! Dispatchers execute resolved actions.
//!
//! A route looks its dispatcher up by [`DispatcherType`]. Callable and controller
//! dispatchers are installed by default; component dispatch depends on the host's
//! component library and must be registered explicitly.

use crate::RouterError;
use crate::action::{ComponentRef, Controller};
use crate::error::BoxError;
use crate::handler::RouteHandler;
use crate::response::OutgoingResponse;
use crate::route::RouteContext;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatcherType {
    Callable,
    Controller,
    Component,
}

impl DispatcherType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Callable => "callable",
            Self::Controller => "controller",
            Self::Component => "component",
        }
    }
}

impl fmt::Display for DispatcherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DispatcherType {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "callable" => Ok(Self::Callable),
            "controller" => Ok(Self::Controller),
            "component" => Ok(Self::Component),
            other => Err(RouterError::configuration(format!("invalid dispatcher type `{other}`"))),
        }
    }
}

/// What a dispatcher is asked to run.
pub enum DispatchTarget<'a> {
    Callable(&'a dyn RouteHandler),
    Controller { instance: Arc<dyn Controller>, method: &'a str },
    Component(&'a ComponentRef),
}

impl fmt::Debug for DispatchTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callable(_) => f.write_str("Callable"),
            Self::Controller { method, .. } => f.debug_struct("Controller").field("method", method).finish(),
            Self::Component(component) => f.debug_tuple("Component").field(component).finish(),
        }
    }
}

#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, target: DispatchTarget<'_>, ctx: &RouteContext) -> Result<OutgoingResponse, BoxError>;
}

/// Invokes callable actions directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct CallableDispatcher;

#[async_trait]
impl Dispatcher for CallableDispatcher {
    async fn dispatch(&self, target: DispatchTarget<'_>, ctx: &RouteContext) -> Result<OutgoingResponse, BoxError> {
        match target {
            DispatchTarget::Callable(handler) => handler.handle(ctx).await,
            other => Err(RouterError::invalid_action(format!("callable dispatcher cannot run {other:?}")).into()),
        }
    }
}

/// Calls the named method on a resolved controller instance.
#[derive(Debug, Default, Clone, Copy)]
pub struct ControllerDispatcher;

#[async_trait]
impl Dispatcher for ControllerDispatcher {
    async fn dispatch(&self, target: DispatchTarget<'_>, ctx: &RouteContext) -> Result<OutgoingResponse, BoxError> {
        match target {
            DispatchTarget::Controller { instance, method } => instance.call(method, ctx).await,
            other => Err(RouterError::invalid_action(format!("controller dispatcher cannot run {other:?}")).into()),
        }
    }
}

/// The dispatchers known to a route, by type.
#[derive(Clone)]
pub struct Dispatchers {
    inner: HashMap<DispatcherType, Arc<dyn Dispatcher>>,
}

impl Default for Dispatchers {
    fn default() -> Self {
        Self::empty()
            .with(DispatcherType::Callable, CallableDispatcher)
            .with(DispatcherType::Controller, ControllerDispatcher)
    }
}

impl Dispatchers {
    pub fn empty() -> Self {
        Self { inner: HashMap::new() }
    }

    pub fn with<D: Dispatcher + 'static>(mut self, kind: DispatcherType, dispatcher: D) -> Self {
        self.set(kind, Arc::new(dispatcher));
        self
    }

    pub fn set(&mut self, kind: DispatcherType, dispatcher: Arc<dyn Dispatcher>) {
        self.inner.insert(kind, dispatcher);
    }

    /// Registers a dispatcher under a type name, rejecting unknown names
    pub fn set_named(&mut self, kind: &str, dispatcher: Arc<dyn Dispatcher>) -> Result<(), RouterError> {
        self.set(kind.parse()?, dispatcher);
        Ok(())
    }

    /// Copies every dispatcher of `other` over this set
    pub fn extend(&mut self, other: &Dispatchers) {
        self.inner.extend(other.inner.iter().map(|(kind, dispatcher)| (*kind, Arc::clone(dispatcher))));
    }

    pub fn get(&self, kind: DispatcherType) -> Result<&Arc<dyn Dispatcher>, RouterError> {
        self.inner.get(&kind).ok_or_else(|| RouterError::missing_dispatcher(kind))
    }

    pub fn contains(&self, kind: DispatcherType) -> bool {
        self.inner.contains_key(&kind)
    }
}

impl fmt::Debug for Dispatchers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.inner.keys()).finish()
    }
}
