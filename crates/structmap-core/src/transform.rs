//! Finalized transforms
//!
//! Both transforms hold an immutable snapshot of the builder's rules, so
//! registrations made after finalization never reach an existing transform.

use std::fmt;
use std::sync::Arc;

use futures_util::future::{FutureExt, try_join_all};
use futures_util::lock::Mutex;
use tracing::trace;

use crate::{BoxError, Result};
use crate::compute::Compute;
use crate::rule::Rule;

/// Source-to-target transform whose rules run concurrently.
pub struct AsyncTransform<S, T> {
    rules: Arc<[Rule<S, T>]>,
}

impl<S, T> AsyncTransform<S, T>
where
    S: Send + Sync + 'static,
    T: Default + Send + 'static,
{
    pub(crate) fn new(rules: Arc<[Rule<S, T>]>) -> Self {
        Self { rules }
    }

    /// Map a source, or return `T::default()` for an absent source.
    ///
    /// Every rule is started before any is awaited. The first failure ends the
    /// invocation: remaining computations are dropped and the partially
    /// written target is discarded.
    pub async fn apply(&self, source: Option<Arc<S>>) -> Result<T> {
        let Some(source) = source else {
            trace!("absent source, returning default target");
            return Ok(T::default());
        };

        trace!(rules = self.rules.len(), "running async transform");
        let target = Mutex::new(T::default());
        try_join_all(
            self.rules
                .iter()
                .map(|rule| rule.apply(Arc::clone(&source), &target)),
        )
        .await?;

        Ok(target.into_inner())
    }

    /// Map a present source.
    pub async fn map(&self, source: impl Into<Arc<S>>) -> Result<T> {
        self.apply(Some(source.into())).await
    }

    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl<S, T> Clone for AsyncTransform<S, T> {
    fn clone(&self) -> Self {
        Self {
            rules: Arc::clone(&self.rules),
        }
    }
}

impl<S, T> fmt::Debug for AsyncTransform<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncTransform")
            .field("rules", &self.rules)
            .finish()
    }
}

/// Source-to-target transform built only from synchronous rules.
pub struct SyncTransform<S, T> {
    rules: Arc<[Rule<S, T>]>,
}

impl<S, T> SyncTransform<S, T>
where
    S: Send + Sync + 'static,
    T: Default + Send + 'static,
{
    pub(crate) fn new(rules: Arc<[Rule<S, T>]>) -> Self {
        Self { rules }
    }

    /// Map a source, or return `T::default()` for an absent source.
    pub fn apply(&self, source: Option<&S>) -> Result<T> {
        let Some(source) = source else {
            trace!("absent source, returning default target");
            return Ok(T::default());
        };

        trace!(rules = self.rules.len(), "running sync transform");
        let mut target = T::default();
        for rule in self.rules.iter() {
            rule.apply_sync(source, &mut target)?;
        }
        Ok(target)
    }

    /// Map a present source.
    pub fn map(&self, source: &S) -> Result<T> {
        self.apply(Some(source))
    }

    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl<S, T> Clone for SyncTransform<S, T> {
    fn clone(&self) -> Self {
        Self {
            rules: Arc::clone(&self.rules),
        }
    }
}

impl<S, T> fmt::Debug for SyncTransform<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncTransform")
            .field("rules", &self.rules)
            .finish()
    }
}

/// A finalized async transform can be the compute of a rule in an outer builder.
impl<S, V> From<AsyncTransform<S, V>> for Compute<S, V>
where
    S: Send + Sync + 'static,
    V: Default + Send + 'static,
{
    fn from(transform: AsyncTransform<S, V>) -> Self {
        Compute::Async(Arc::new(move |source: Arc<S>| {
            let transform = transform.clone();
            async move { transform.map(source).await.map_err(BoxError::from) }.boxed()
        }))
    }
}

/// A finalized sync transform composes as a synchronous compute.
impl<S, V> From<SyncTransform<S, V>> for Compute<S, V>
where
    S: Send + Sync + 'static,
    V: Default + Send + 'static,
{
    fn from(transform: SyncTransform<S, V>) -> Self {
        Compute::try_from_fn(move |source: &S| transform.map(source))
    }
}
