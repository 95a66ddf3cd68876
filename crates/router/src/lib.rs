//! Route compilation and matching engine.
//!
//! `micro-router` turns declarative route definitions into compiled regular
//! expressions, matches incoming requests against them and dispatches the matched
//! route's action.
//!
//! # Features
//!
//! - Placeholder paths and domains: `/users/:id(\d+)`, `/files/:rest*`, `{tenant}.example.com`
//! - Nested route groups with inherited names, middleware, rules and defaults
//! - Typed parameters with numeric coercion and async entity binding
//! - Callable, controller and component actions behind pluggable dispatchers
//! - Method-not-allowed detection and automatic `OPTIONS` answers
//! - URL generation from named routes
//!
//! # Example
//!
//! ```no_run
//! use micro_router::{HttpEvent, RouteContext, RouteDefinition, RouteRegistrar, Router, handler_fn};
//! use http::Method;
//!
//! async fn show_user(ctx: RouteContext) -> String {
//!     format!("user {}", ctx.param("id").cloned().unwrap_or_default())
//! }
//!
//! # async fn run() -> Result<(), micro_router::RouterError> {
//! let router = Router::builder()
//!     .define([RouteDefinition::new("/users/:id(\\d+)").method("GET").name("users.show").handler(handler_fn(show_user))])
//!     .fallback(handler_fn(|_ctx| async { (http::StatusCode::NOT_FOUND, "nothing here") }))
//!     .build()?;
//!
//! let event = HttpEvent::parse(Method::GET, "/users/42").expect("valid uri");
//! let response = router.dispatch(&event).await?;
//! # let _ = response;
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod binding;
pub mod collection;
pub mod config;
pub mod container;
pub mod dispatcher;
mod error;
pub mod event;
mod handler;
pub mod mapper;
pub mod matcher;
pub mod middleware;
pub mod params;
pub mod pattern;
mod responder;
pub mod response;
pub mod route;
pub mod router;

pub use action::{Action, ActionDefinition, ComponentRef, Controller, ControllerRef};
pub use binding::{Binding, binding_fn};
pub use collection::RouteCollection;
pub use config::RouterOptions;
pub use container::{Container, SimpleContainer};
pub use dispatcher::{DispatchTarget, Dispatcher, DispatcherType, Dispatchers};
pub use error::{BoxError, RouterError};
pub use event::{HttpEvent, IncomingEvent};
pub use handler::{FnHandler, RouteHandler, handler_fn};
pub use mapper::{RouteDefinition, RouteMapper};
pub use middleware::Middleware;
pub use params::Params;
pub use responder::IntoResponse;
pub use response::{DefaultResponseResolver, OutgoingResponse, ResponseContent, ResponseResolver};
pub use route::{GenerateOptions, Protocol, Redirect, Route, RouteContext, RouteOptions, RouteSummary};
pub use router::{RouteGroup, RouteRegistrar, Router, RouterBuilder};
