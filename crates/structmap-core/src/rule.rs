//! Mapping rules
//!
//! A rule pairs one [`SlotBinder`] with one [`Compute`]. The value type is
//! erased behind [`ApplyRule`] so that rules writing different slot types can
//! live in the same builder.

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::lock::Mutex;
use tracing::debug;

use crate::compute::{Compute, ComputeMode};
use crate::slot::{SlotBinder, SlotKey, SlotShape};
use crate::{Error, Result};

/// Type-erased rule execution.
pub trait ApplyRule<S, T>: Send + Sync {
    /// Compute the value and write it into the shared target.
    fn apply<'a>(&'a self, source: Arc<S>, target: &'a Mutex<T>) -> BoxFuture<'a, Result<()>>;

    /// Compute and write without suspending; async computes are rejected.
    fn apply_sync(&self, source: &S, target: &mut T) -> Result<()>;
}

/// Binder and compute for one slot.
pub struct BoundRule<S, T, V> {
    binder: SlotBinder<T, V>,
    compute: Compute<S, V>,
}

impl<S, T, V> BoundRule<S, T, V> {
    pub fn new(binder: SlotBinder<T, V>, compute: Compute<S, V>) -> Self {
        Self { binder, compute }
    }
}

impl<S, T, V> BoundRule<S, T, V>
where
    S: 'static,
    T: 'static,
    V: 'static,
{
    fn failed(&self, source: crate::BoxError) -> Error {
        debug!(slot = %self.binder.key(), error = %source, "rule computation failed");
        Error::rule_compute(self.binder.key().clone(), source)
    }
}

impl<S, T, V> ApplyRule<S, T> for BoundRule<S, T, V>
where
    S: Send + Sync + 'static,
    T: Send + 'static,
    V: Send + 'static,
{
    fn apply<'a>(&'a self, source: Arc<S>, target: &'a Mutex<T>) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let value = self
                .compute
                .evaluate(source)
                .await
                .map_err(|err| self.failed(err))?;

            let mut target = target.lock().await;
            self.binder.write(&mut target, value);
            Ok(())
        })
    }

    fn apply_sync(&self, source: &S, target: &mut T) -> Result<()> {
        let value = match &self.compute {
            Compute::Sync(f) => f(source).map_err(|err| self.failed(err))?,
            Compute::Async(_) => {
                return Err(Error::AsynchronousRuleDeclared {
                    slot: self.binder.key().clone(),
                });
            }
        };

        self.binder.write(target, value);
        Ok(())
    }
}

/// A registered rule: slot metadata plus its erased executor.
pub struct Rule<S, T> {
    slot: SlotKey,
    mode: ComputeMode,
    exec: Arc<dyn ApplyRule<S, T>>,
}

impl<S, T> Rule<S, T>
where
    S: Send + Sync + 'static,
    T: Send + 'static,
{
    pub fn new<V>(binder: SlotBinder<T, V>, compute: Compute<S, V>) -> Self
    where
        V: Send + 'static,
    {
        Self {
            slot: binder.key().clone(),
            mode: compute.mode(),
            exec: Arc::new(BoundRule::new(binder, compute)),
        }
    }
}

impl<S, T> Rule<S, T> {
    #[must_use]
    pub fn slot(&self) -> &SlotKey {
        &self.slot
    }

    #[must_use]
    pub fn shape(&self) -> SlotShape {
        self.slot.shape()
    }

    #[must_use]
    pub fn mode(&self) -> ComputeMode {
        self.mode
    }

    pub fn apply<'a>(&'a self, source: Arc<S>, target: &'a Mutex<T>) -> BoxFuture<'a, Result<()>> {
        self.exec.apply(source, target)
    }

    pub fn apply_sync(&self, source: &S, target: &mut T) -> Result<()> {
        self.exec.apply_sync(source, target)
    }
}

impl<S, T> Clone for Rule<S, T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
            mode: self.mode,
            exec: Arc::clone(&self.exec),
        }
    }
}

impl<S, T> fmt::Debug for Rule<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("slot", &self.slot)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::FieldPath;

    #[derive(Debug, Default)]
    struct Contact {
        first: String,
    }

    struct Customer {
        first_name: String,
    }

    fn first_name_rule(compute: Compute<Customer, String>) -> Rule<Customer, Contact> {
        let binder = SlotBinder::field(FieldPath::new(
            "to.first",
            "to",
            |t: &mut Contact, v: String| t.first = v,
        ))
        .unwrap();
        Rule::new(binder, compute)
    }

    fn customer() -> Customer {
        Customer {
            first_name: "Mike".to_string(),
        }
    }

    #[tokio::test]
    async fn test_apply_writes_resolved_value() {
        let rule = first_name_rule(Compute::from_async_fn(|c: Arc<Customer>| async move {
            Ok::<_, std::io::Error>(c.first_name.clone())
        }));
        let target = Mutex::new(Contact::default());

        rule.apply(Arc::new(customer()), &target).await.unwrap();

        assert_eq!(target.into_inner().first, "Mike");
        assert_eq!(rule.mode(), ComputeMode::Async);
        assert_eq!(rule.shape(), SlotShape::Field);
    }

    #[test]
    fn test_apply_sync_writes_value() {
        let rule = first_name_rule(Compute::from_fn(|c: &Customer| c.first_name.clone()));
        let mut target = Contact::default();

        rule.apply_sync(&customer(), &mut target).unwrap();

        assert_eq!(target.first, "Mike");
    }

    #[test]
    fn test_apply_sync_rejects_async_compute() {
        let rule = first_name_rule(Compute::future_literal(async { "Mike".to_string() }));
        let mut target = Contact::default();

        let result = rule.apply_sync(&customer(), &mut target);

        assert!(matches!(result, Err(Error::AsynchronousRuleDeclared { .. })));
        assert!(target.first.is_empty());
    }

    #[tokio::test]
    async fn test_failure_leaves_slot_untouched() {
        let rule = first_name_rule(Compute::try_from_fn(|_: &Customer| {
            Err::<String, _>(std::io::Error::other("formatter unavailable"))
        }));
        let target = Mutex::new(Contact::default());

        let error = rule.apply(Arc::new(customer()), &target).await.unwrap_err();

        assert_eq!(error.failed_slot(), Some(&SlotKey::field(["first"])));
        assert_eq!(
            error.compute_source().map(ToString::to_string),
            Some("formatter unavailable".to_string())
        );
        assert!(target.into_inner().first.is_empty());
    }
}
