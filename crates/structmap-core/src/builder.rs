//! Mapping builder
//!
//! Collects rules one slot at a time and finalizes them into transforms.
//! Registration failures leave the builder exactly as it was.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::compute::{Compute, ComputeMode};
use crate::rule::Rule;
use crate::slot::{FieldPath, ObjectPath, SlotBinder, SlotKey};
use crate::transform::{AsyncTransform, SyncTransform};
use crate::{Error, Result};

/// Fluent registration surface for `Source -> Target` mappings.
pub struct MappingBuilder<S, T> {
    rules: Vec<Rule<S, T>>,
    claimed: HashSet<SlotKey>,
}

impl<S, T> MappingBuilder<S, T>
where
    S: Send + Sync + 'static,
    T: Default + Send + 'static,
{
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            claimed: HashSet::new(),
        }
    }

    /// Register a rule writing one field of the target.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSlotShape`] if `path` is not a member chain below the
    /// target parameter, [`Error::DuplicateSlot`] if the slot (or the whole
    /// object) is already claimed.
    pub fn for_field<V>(
        &mut self,
        path: FieldPath<T, V>,
        compute: impl Into<Compute<S, V>>,
    ) -> Result<&mut Self>
    where
        V: Send + 'static,
    {
        let binder = SlotBinder::field(path)?;
        self.claim(binder.key())?;
        self.push(Rule::new(binder, compute.into()));
        Ok(self)
    }

    /// Register a rule replacing the whole target.
    ///
    /// A whole-object rule cannot share a builder with any other rule.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSlotShape`] if `path` is anything but the bare target
    /// parameter, [`Error::DuplicateSlot`] if any rule is already registered.
    pub fn for_object(
        &mut self,
        path: ObjectPath<T>,
        compute: impl Into<Compute<S, T>>,
    ) -> Result<&mut Self> {
        let binder = SlotBinder::whole_object(path)?;
        self.claim(binder.key())?;
        self.push(Rule::new(binder, compute.into()));
        Ok(self)
    }

    /// Finalize into a transform that runs every rule concurrently.
    ///
    /// # Errors
    ///
    /// [`Error::NoRulesDefined`] if no rule has been registered.
    pub fn build(&self) -> Result<AsyncTransform<S, T>> {
        let rules = self.snapshot()?;
        debug!(rules = rules.len(), "built async transform");
        Ok(AsyncTransform::new(rules))
    }

    /// Finalize into a transform that runs every rule in place.
    ///
    /// # Errors
    ///
    /// [`Error::NoRulesDefined`] if no rule has been registered,
    /// [`Error::AsynchronousRuleDeclared`] if any rule computes asynchronously.
    pub fn build_sync(&self) -> Result<SyncTransform<S, T>> {
        if let Some(rule) = self.rules.iter().find(|rule| rule.mode() == ComputeMode::Async) {
            return Err(Error::AsynchronousRuleDeclared {
                slot: rule.slot().clone(),
            });
        }

        let rules = self.snapshot()?;
        debug!(rules = rules.len(), "built sync transform");
        Ok(SyncTransform::new(rules))
    }
}

impl<S, T> MappingBuilder<S, T> {
    /// Number of registered rules
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Claimed slots, in registration order
    pub fn slots(&self) -> impl Iterator<Item = &SlotKey> {
        self.rules.iter().map(Rule::slot)
    }

    /// Check a slot against every claimed slot and record it.
    fn claim(&mut self, slot: &SlotKey) -> Result<()> {
        let conflict = self.claimed.iter().find(|claimed| claimed.overlaps(slot));

        if let Some(claimed) = conflict.cloned() {
            return Err(Error::DuplicateSlot {
                slot: slot.clone(),
                claimed,
            });
        }

        self.claimed.insert(slot.clone());
        Ok(())
    }

    fn push(&mut self, rule: Rule<S, T>) {
        debug!(
            slot = %rule.slot(),
            shape = ?rule.shape(),
            mode = ?rule.mode(),
            "registered mapping rule"
        );
        self.rules.push(rule);
    }

    fn snapshot(&self) -> Result<Arc<[Rule<S, T>]>> {
        if self.rules.is_empty() {
            return Err(Error::NoRulesDefined);
        }
        Ok(self.rules.iter().cloned().collect())
    }
}

impl<S, T> Default for MappingBuilder<S, T>
where
    S: Send + Sync + 'static,
    T: Default + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, T> fmt::Debug for MappingBuilder<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingBuilder")
            .field("rules", &self.rules)
            .finish()
    }
}
