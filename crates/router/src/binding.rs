//! Entity binding: turning a raw parameter value into a resolved resource.
//!
//! A route may register a [`Binding`] per parameter. During bind the resolver receives
//! the binding key (the `@alias` or the param name), the coerced raw value and the
//! host container. An empty answer for a required parameter becomes
//! [`RouterError::ResourceNotFound`](crate::RouterError::ResourceNotFound).

use crate::container::Container;
use crate::error::BoxError;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait Binding: Send + Sync {
    /// Resolves `value`; `Ok(None)` or `Ok(Some(Value::Null))` means nothing was found.
    async fn resolve(&self, key: &str, value: &Value, container: &dyn Container) -> Result<Option<Value>, BoxError>;
}

/// A [`Binding`] backed by an async function of `(key, value)`.
#[derive(Debug, Clone, Copy)]
pub struct FnBinding<F> {
    f: F,
}

pub fn binding_fn<F, Fut>(f: F) -> FnBinding<F>
where
    F: Fn(String, Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<Value>, BoxError>> + Send,
{
    FnBinding { f }
}

#[async_trait]
impl<F, Fut> Binding for FnBinding<F>
where
    F: Fn(String, Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<Value>, BoxError>> + Send,
{
    async fn resolve(&self, key: &str, value: &Value, _container: &dyn Container) -> Result<Option<Value>, BoxError> {
        (self.f)(key.to_owned(), value.clone()).await
    }
}
