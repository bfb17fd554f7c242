use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use super::Value;
use crate::error::Result;

/// Outcome of invoking a callable.
pub enum Invocation {
    /// Completed synchronously.
    Ready(Result<Value>),
    /// The callable suspends; the future yields its result.
    Pending(BoxFuture<'static, Result<Value>>),
}

impl Invocation {
    pub fn is_pending(&self) -> bool {
        matches!(self, Invocation::Pending(_))
    }

    /// Drive the invocation to completion.
    pub async fn resolve(self) -> Result<Value> {
        match self {
            Invocation::Ready(r) => r,
            Invocation::Pending(fut) => fut.await,
        }
    }
}

/// A type-erased callable taking a positional argument list.
pub trait Invocable: Send + Sync {
    fn invoke(&self, args: Vec<Value>) -> Invocation;
}

/// Explicit handle to a callable (entry point + its receiver).
#[derive(Clone)]
pub struct Method {
    inner: Arc<dyn Invocable>,
}

impl Method {
    pub fn new(inner: Arc<dyn Invocable>) -> Self {
        Self { inner }
    }

    /// Synchronous closure.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        Self::new(Arc::new(SyncFn(f)))
    }

    /// Closure returning a future.
    pub fn from_async_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self::new(Arc::new(AsyncFn(f)))
    }

    /// Pair an owned receiver with an entry point.
    pub fn bound<R>(receiver: Arc<R>, entry: fn(&R, Vec<Value>) -> Result<Value>) -> Self
    where
        R: Send + Sync + 'static,
    {
        Self::new(Arc::new(BoundMethod { receiver, entry }))
    }

    pub fn invoke(&self, args: Vec<Value>) -> Invocation {
        self.inner.invoke(args)
    }

    /// Invoke and await the result, whether or not the callable suspends.
    pub async fn call(&self, args: Vec<Value>) -> Result<Value> {
        self.invoke(args).resolve().await
    }

    pub fn ptr_eq(&self, other: &Method) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

struct SyncFn<F>(F);

impl<F> Invocable for SyncFn<F>
where
    F: Fn(Vec<Value>) -> Result<Value> + Send + Sync,
{
    fn invoke(&self, args: Vec<Value>) -> Invocation {
        Invocation::Ready((self.0)(args))
    }
}

struct AsyncFn<F>(F);

impl<F, Fut> Invocable for AsyncFn<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    fn invoke(&self, args: Vec<Value>) -> Invocation {
        Invocation::Pending((self.0)(args).boxed())
    }
}

struct BoundMethod<R> {
    receiver: Arc<R>,
    entry: fn(&R, Vec<Value>) -> Result<Value>,
}

impl<R: Send + Sync> Invocable for BoundMethod<R> {
    fn invoke(&self, args: Vec<Value>) -> Invocation {
        Invocation::Ready((self.entry)(&self.receiver, args))
    }
}
