//! Value-producing functions over the source
//!
//! Every rule declaration (sync function, async function, literal, future of
//! a literal, or a finalized transform) is normalized into a [`Compute`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};

use crate::BoxError;

type SyncFn<S, V> = dyn Fn(&S) -> Result<V, BoxError> + Send + Sync;
type AsyncFn<S, V> = dyn Fn(Arc<S>) -> BoxFuture<'static, Result<V, BoxError>> + Send + Sync;

/// How a compute function was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeMode {
    Sync,
    Async,
}

/// A value-producing function over the source.
pub enum Compute<S, V> {
    /// Evaluated in place, borrowing the source
    Sync(Arc<SyncFn<S, V>>),
    /// Evaluated as a future holding a shared handle to the source
    Async(Arc<AsyncFn<S, V>>),
}

impl<S, V> Compute<S, V>
where
    S: 'static,
    V: 'static,
{
    /// Infallible synchronous function of the source.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&S) -> V + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(move |source: &S| -> Result<V, BoxError> {
            Ok(f(source))
        }))
    }

    /// Fallible synchronous function of the source.
    pub fn try_from_fn<F, E>(f: F) -> Self
    where
        F: Fn(&S) -> Result<V, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self::Sync(Arc::new(move |source: &S| -> Result<V, BoxError> {
            f(source).map_err(Into::into)
        }))
    }

    /// Asynchronous function of the source.
    pub fn from_async_fn<F, Fut, E>(f: F) -> Self
    where
        F: Fn(Arc<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        Self::Async(Arc::new(move |source: Arc<S>| {
            f(source)
                .map(|result| result.map_err(Into::<BoxError>::into))
                .boxed()
        }))
    }

    /// Constant value, cloned for every invocation.
    pub fn literal(value: V) -> Self
    where
        V: Clone + Send + Sync,
    {
        Self::Sync(Arc::new(move |_: &S| -> Result<V, BoxError> {
            Ok(value.clone())
        }))
    }

    /// Future of a constant value.
    ///
    /// The future is polled at most once; every invocation receives a clone of
    /// its output.
    pub fn future_literal<Fut>(value: Fut) -> Self
    where
        Fut: Future<Output = V> + Send + 'static,
        V: Clone + Send + Sync,
    {
        let shared = value.boxed().shared();
        Self::Async(Arc::new(move |_: Arc<S>| {
            shared.clone().map(Ok::<V, BoxError>).boxed()
        }))
    }

    #[must_use]
    pub fn mode(&self) -> ComputeMode {
        match self {
            Self::Sync(_) => ComputeMode::Sync,
            Self::Async(_) => ComputeMode::Async,
        }
    }

    #[must_use]
    pub fn is_async(&self) -> bool {
        self.mode() == ComputeMode::Async
    }

    /// Evaluate against a shared source, awaiting asynchronous forms.
    pub async fn evaluate(&self, source: Arc<S>) -> Result<V, BoxError> {
        match self {
            Self::Sync(f) => f(source.as_ref()),
            Self::Async(f) => f(source).await,
        }
    }
}

impl<S, V> Clone for Compute<S, V> {
    fn clone(&self) -> Self {
        match self {
            Self::Sync(f) => Self::Sync(Arc::clone(f)),
            Self::Async(f) => Self::Async(Arc::clone(f)),
        }
    }
}

impl<S, V> fmt::Debug for Compute<S, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Compute::Sync"),
            Self::Async(_) => f.write_str("Compute::Async"),
        }
    }
}
