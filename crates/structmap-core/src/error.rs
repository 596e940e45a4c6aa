//! Error types for rule registration, finalization and invocation

use thiserror::Error;

use crate::slot::{SlotKey, SlotShape};

/// Failure raised by a rule's compute function.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while building or running a mapping
#[derive(Error, Debug)]
pub enum Error {
    /// Slot descriptor does not have the shape the registration expects
    #[error("Invalid slot '{descriptor}': expected {expected}. {hint}")]
    InvalidSlotShape {
        descriptor: String,
        expected: SlotShape,
        hint: String,
    },

    /// A rule already claims this slot (or a slot overlapping it)
    #[error("Multiple rules given for slot {slot} (already claimed by {claimed})")]
    DuplicateSlot { slot: SlotKey, claimed: SlotKey },

    /// Finalization requested before any rule was registered
    #[error("Nothing to map: register a rule with for_field or for_object before building")]
    NoRulesDefined,

    /// Synchronous finalization requested while an asynchronous rule is registered
    #[error("Rule for slot {slot} is asynchronous; use build() instead of build_sync()")]
    AsynchronousRuleDeclared { slot: SlotKey },

    /// A rule's compute function failed during invocation
    #[error("Rule for slot {slot} failed: {source}")]
    RuleCompute {
        slot: SlotKey,
        #[source]
        source: BoxError,
    },
}

impl Error {
    /// Create an invalid-shape error for a descriptor.
    pub fn invalid_shape(
        descriptor: impl Into<String>,
        expected: SlotShape,
        hint: impl Into<String>,
    ) -> Self {
        Self::InvalidSlotShape {
            descriptor: descriptor.into(),
            expected,
            hint: hint.into(),
        }
    }

    /// Wrap a compute failure with the slot it was computing.
    pub fn rule_compute(slot: SlotKey, source: impl Into<BoxError>) -> Self {
        Self::RuleCompute {
            slot,
            source: source.into(),
        }
    }

    /// The collaborator failure carried by a [`Error::RuleCompute`].
    ///
    /// Nested transforms wrap once per level; this walks down to the
    /// innermost failure that is not itself a rule failure.
    #[must_use]
    pub fn compute_source(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::RuleCompute { source, .. } => match source.downcast_ref::<Error>() {
                Some(inner @ Error::RuleCompute { .. }) => inner.compute_source(),
                _ => Some(source.as_ref()),
            },
            _ => None,
        }
    }

    /// Slot whose rule failed, for invocation errors.
    #[must_use]
    pub fn failed_slot(&self) -> Option<&SlotKey> {
        match self {
            Self::RuleCompute { slot, .. } => Some(slot),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("lookup refused")]
    struct LookupRefused;

    #[test]
    fn compute_source_returns_original_failure() {
        let error = Error::rule_compute(SlotKey::field(["home_address"]), LookupRefused);

        let source = error.compute_source().expect("compute failure");
        assert!(source.downcast_ref::<LookupRefused>().is_some());
        assert_eq!(error.failed_slot(), Some(&SlotKey::field(["home_address"])));
    }

    #[test]
    fn compute_source_unwraps_nested_rule_failures() {
        let inner = Error::rule_compute(SlotKey::field(["phone_number"]), LookupRefused);
        let outer = Error::rule_compute(SlotKey::field(["contact"]), inner);

        let source = outer.compute_source().expect("compute failure");
        assert!(source.downcast_ref::<LookupRefused>().is_some());
        assert_eq!(outer.failed_slot(), Some(&SlotKey::field(["contact"])));
    }

    #[test]
    fn registration_errors_carry_no_compute_source() {
        assert!(Error::NoRulesDefined.compute_source().is_none());
        assert!(Error::NoRulesDefined.failed_slot().is_none());
    }

    #[test]
    fn display_mentions_slot_and_hint() {
        let error = Error::invalid_shape("to", SlotShape::Field, "Use for_object instead.");
        let message = error.to_string();
        assert!(message.contains("'to'"));
        assert!(message.contains("for_object"));

        let error = Error::DuplicateSlot {
            slot: SlotKey::field(["first"]),
            claimed: SlotKey::Root,
        };
        assert_eq!(
            error.to_string(),
            "Multiple rules given for slot $.first (already claimed by $)"
        );
    }
}
