//! # structmap-core
//!
//! Declarative mapping-rule builder and concurrent transform executor.
//!
//! A [`MappingBuilder`] collects explicit rules, one per target slot, and
//! finalizes them into an [`AsyncTransform`] (rules run concurrently) or a
//! [`SyncTransform`] (rules run in turn, no async machinery involved).
//!
//! ```ignore
//! let mut contact = MappingBuilder::<Customer, ContactDto>::new();
//! contact
//!     .for_field(field!(|to: ContactDto| to.first), Compute::literal("Mike".to_string()))?
//!     .for_field(field!(|to: ContactDto| to.last), Compute::from_fn(|c: &Customer| c.surname.clone()))?;
//! let contact = contact.build()?;
//!
//! let mut customer = MappingBuilder::<Customer, CustomerDto>::new();
//! customer.for_field(field!(|to: CustomerDto| to.contact), contact)?;
//! let dto = customer.build()?.map(source).await?;
//! ```

pub mod builder;
pub mod compute;
mod error;
pub mod rule;
pub mod slot;
pub mod transform;

pub use builder::MappingBuilder;
pub use compute::{Compute, ComputeMode};
pub use error::{BoxError, Error};
pub use slot::{FieldPath, ObjectPath, SlotBinder, SlotKey, SlotShape};
pub use transform::{AsyncTransform, SyncTransform};

pub type Result<T> = std::result::Result<T, Error>;

/// Describe a field slot on the target type.
///
/// `field!(|to: CustomerDto| to.contact.first)` yields a [`FieldPath`] whose
/// descriptor is `"to.contact.first"` and whose setter assigns the computed
/// value to that member chain.
///
/// Passing the bare parameter (`field!(|to: CustomerDto| to)`) still produces a
/// `FieldPath`, which registration then rejects as
/// [`Error::InvalidSlotShape`].
#[macro_export]
macro_rules! field {
    (|$param:ident : $target:ty| $root:ident $(. $member:ident)+) => {
        $crate::FieldPath::<$target, _>::new(
            stringify!($root $(. $member)+),
            stringify!($param),
            |$param: &mut $target, value| {
                $root $(. $member)+ = value;
            },
        )
    };
    (|$param:ident : $target:ty| $root:ident) => {
        $crate::FieldPath::<$target, $target>::new(
            stringify!($root),
            stringify!($param),
            |$param: &mut $target, value: $target| {
                *$param = value;
            },
        )
    };
}

/// Describe the whole target as a slot: `object!(|to: AddressDto| to)`.
#[macro_export]
macro_rules! object {
    (|$param:ident : $target:ty| $($body:tt)+) => {
        $crate::ObjectPath::<$target>::new(stringify!($($body)+), stringify!($param))
    };
}
