//! Route actions.
//!
//! Definitions carry an [`ActionDefinition`], which may still be incomplete (a bare
//! method name waiting for its parent controller). The mapper resolves it once into an
//! [`Action`], so dispatch never has to inspect shapes again.

use crate::RouterError;
use crate::dispatcher::DispatcherType;
use crate::error::BoxError;
use crate::handler::{FnHandler, RouteHandler};
use crate::response::OutgoingResponse;
use crate::route::{Redirect, RouteContext};
use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A handler object exposing several named actions.
#[async_trait]
pub trait Controller: Send + Sync {
    async fn call(&self, method: &str, ctx: &RouteContext) -> Result<OutgoingResponse, BoxError>;
}

type Constructor = dyn Fn() -> Arc<dyn Controller> + Send + Sync;

/// A named controller type plus a way to build it when the container has no instance.
#[derive(Clone)]
pub struct ControllerRef {
    name: Arc<str>,
    constructor: Arc<Constructor>,
}

impl ControllerRef {
    /// Refers to `C`, built with `C::default()` when not resolved from the container
    pub fn of<C: Controller + Default + 'static>(name: impl Into<Arc<str>>) -> Self {
        Self::with_constructor(name, || Arc::new(C::default()))
    }

    pub fn with_constructor<F>(name: impl Into<Arc<str>>, constructor: F) -> Self
    where
        F: Fn() -> Arc<dyn Controller> + Send + Sync + 'static,
    {
        Self { name: name.into(), constructor: Arc::new(constructor) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn construct(&self) -> Arc<dyn Controller> {
        (self.constructor)()
    }
}

impl fmt::Debug for ControllerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ControllerRef").field(&self.name).finish()
    }
}

/// A page or component reference, handed unresolved to the component dispatcher.
#[derive(Clone)]
pub struct ComponentRef {
    name: String,
    component: Option<Arc<dyn Any + Send + Sync>>,
}

impl ComponentRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), component: None }
    }

    pub fn with_component<T: Any + Send + Sync>(mut self, component: T) -> Self {
        self.component = Some(Arc::new(component));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn component(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.component.as_deref()
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentRef").field(&self.name).finish()
    }
}

/// An action as written in a route definition.
#[derive(Clone)]
pub enum ActionDefinition {
    Handler(Arc<dyn RouteHandler>),
    /// a controller whose method comes from a child definition
    Controller(ControllerRef),
    ControllerMethod { controller: ControllerRef, method: String },
    /// a method name, combined with the parent's controller
    Method(String),
    Component(ComponentRef),
}

impl ActionDefinition {
    pub fn handler<H: RouteHandler + 'static>(handler: H) -> Self {
        Self::Handler(Arc::new(handler))
    }

    pub fn controller_method(controller: ControllerRef, method: impl Into<String>) -> Self {
        Self::ControllerMethod { controller, method: method.into() }
    }
}

impl<F> From<FnHandler<F>> for ActionDefinition
where
    FnHandler<F>: RouteHandler + 'static,
{
    fn from(handler: FnHandler<F>) -> Self {
        Self::handler(handler)
    }
}

impl From<ControllerRef> for ActionDefinition {
    fn from(controller: ControllerRef) -> Self {
        Self::Controller(controller)
    }
}

impl From<(ControllerRef, &str)> for ActionDefinition {
    fn from((controller, method): (ControllerRef, &str)) -> Self {
        Self::controller_method(controller, method)
    }
}

impl From<&str> for ActionDefinition {
    fn from(method: &str) -> Self {
        Self::Method(method.to_owned())
    }
}

impl From<ComponentRef> for ActionDefinition {
    fn from(component: ComponentRef) -> Self {
        Self::Component(component)
    }
}

impl fmt::Debug for ActionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler(_) => f.write_str("Handler"),
            Self::Controller(controller) => f.debug_tuple("Controller").field(controller).finish(),
            Self::ControllerMethod { controller, method } => {
                f.debug_struct("ControllerMethod").field("controller", controller).field("method", method).finish()
            }
            Self::Method(method) => f.debug_tuple("Method").field(method).finish(),
            Self::Component(component) => f.debug_tuple("Component").field(component).finish(),
        }
    }
}

/// A fully resolved route action.
#[derive(Clone)]
pub enum Action {
    Callable(Arc<dyn RouteHandler>),
    Controller { controller: ControllerRef, method: String },
    Component(ComponentRef),
    Redirect(Redirect),
}

impl Action {
    /// Resolves a definition's action; a lone redirect stands in when no action is given.
    pub fn resolve(definition: Option<ActionDefinition>, redirect: Option<&Redirect>) -> Result<Self, RouterError> {
        match definition {
            Some(ActionDefinition::Handler(handler)) => Ok(Self::Callable(handler)),
            Some(ActionDefinition::ControllerMethod { controller, method }) => Ok(Self::Controller { controller, method }),
            Some(ActionDefinition::Component(component)) => Ok(Self::Component(component)),
            Some(ActionDefinition::Controller(controller)) => Err(RouterError::invalid_action(format!(
                "controller `{}` is used without a method name",
                controller.name()
            ))),
            Some(ActionDefinition::Method(method)) => {
                Err(RouterError::invalid_action(format!("method `{method}` has no controller to belong to")))
            }
            None => match redirect {
                Some(redirect) => Ok(Self::Redirect(redirect.clone())),
                None => Err(RouterError::invalid_action("route has neither an action nor a redirect")),
            },
        }
    }

    /// Which dispatcher runs this action, `None` for redirects handled by the route itself.
    pub fn dispatcher_type(&self) -> Option<DispatcherType> {
        match self {
            Self::Callable(_) => Some(DispatcherType::Callable),
            Self::Controller { .. } => Some(DispatcherType::Controller),
            Self::Component(_) => Some(DispatcherType::Component),
            Self::Redirect(_) => None,
        }
    }

    /// `Controller@method` for controllers, a generic label otherwise.
    pub fn label(&self) -> String {
        match self {
            Self::Callable(_) => "Callable".to_owned(),
            Self::Controller { controller, method } => format!("{}@{method}", controller.name()),
            Self::Component(component) => format!("Component({})", component.name()),
            Self::Redirect(_) => "Redirect".to_owned(),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler_fn;

    #[derive(Default)]
    struct UserController;

    #[async_trait]
    impl Controller for UserController {
        async fn call(&self, _method: &str, _ctx: &RouteContext) -> Result<OutgoingResponse, BoxError> {
            Ok(OutgoingResponse::default())
        }
    }

    #[test]
    fn test_resolve_variants() {
        let callable = Action::resolve(Some(handler_fn(|_ctx| async { "ok" }).into()), None).unwrap();
        assert_eq!(callable.label(), "Callable");
        assert_eq!(callable.dispatcher_type(), Some(DispatcherType::Callable));

        let controller = ControllerRef::of::<UserController>("UserController");
        let action = Action::resolve(Some((controller.clone(), "show").into()), None).unwrap();
        assert_eq!(action.label(), "UserController@show");

        assert!(matches!(
            Action::resolve(Some(controller.into()), None),
            Err(RouterError::InvalidAction { .. })
        ));
        assert!(matches!(Action::resolve(Some("show".into()), None), Err(RouterError::InvalidAction { .. })));
        assert!(matches!(Action::resolve(None, None), Err(RouterError::InvalidAction { .. })));
    }

    #[test]
    fn test_redirect_stands_in() {
        let action = Action::resolve(None, Some(&Redirect::to("/home"))).unwrap();
        assert_eq!(action.label(), "Redirect");
        assert_eq!(action.dispatcher_type(), None);
    }
}
