use crate::error::BoxError;
use crate::responder::IntoResponse;
use crate::response::OutgoingResponse;
use crate::route::RouteContext;
use async_trait::async_trait;

/// A callable route action.
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn handle(&self, ctx: &RouteContext) -> Result<OutgoingResponse, BoxError>;
}

/// Adapts an async function taking a [`RouteContext`] into a [`RouteHandler`]
#[derive(Debug, Clone, Copy)]
pub struct FnHandler<F> {
    f: F,
}

/// Wraps `f` so that it can be registered as a route action.
///
/// # Example
/// ```
/// use micro_router::{handler_fn, RouteContext};
///
/// let handler = handler_fn(|ctx: RouteContext| async move {
///     format!("user {}", ctx.param("id").cloned().unwrap_or_default())
/// });
/// # let _ = handler;
/// ```
pub fn handler_fn<F, Fut, R>(f: F) -> FnHandler<F>
where
    F: Fn(RouteContext) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send,
    R: IntoResponse,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut, R> RouteHandler for FnHandler<F>
where
    F: Fn(RouteContext) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send,
    R: IntoResponse,
{
    async fn handle(&self, ctx: &RouteContext) -> Result<OutgoingResponse, BoxError> {
        (self.f)(ctx.clone()).await.into_response()
    }
}
