//! Target slots and their binders
//!
//! A slot is an address in the target: either a member chain below the target
//! parameter (`to.contact.first`) or the target itself (`to`). Descriptors are
//! explicit text plus a setter closure; the [`field!`](crate::field) and
//! [`object!`](crate::object) macros generate both from a path expression.

use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::trace;

use crate::{Error, Result};

/// Writes a computed value into a target instance.
pub type Setter<T, V> = Arc<dyn Fn(&mut T, V) + Send + Sync>;

type SetterFactory<T, V> = Arc<dyn Fn() -> Setter<T, V> + Send + Sync>;

/// Kind of slot a registration expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotShape {
    /// One member chain below the target
    Field,
    /// The target itself
    WholeObject,
}

impl fmt::Display for SlotShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field => write!(f, "a field path such as `to.member`"),
            Self::WholeObject => write!(f, "the bare target parameter such as `to`"),
        }
    }
}

/// Canonical, parameter-independent slot identity.
///
/// `to.contact.first` and `dto.contact.first` map to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SlotKey {
    /// The whole target
    Root,
    /// Member chain below the target
    Field(Vec<String>),
}

impl SlotKey {
    /// Build a field key from member names.
    pub fn field<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Field(segments.into_iter().map(Into::into).collect())
    }

    /// Whether two rules writing these slots would conflict.
    ///
    /// The root overlaps every slot. Field slots conflict only on equal keys.
    #[must_use]
    pub fn overlaps(&self, other: &SlotKey) -> bool {
        match (self, other) {
            (Self::Root, _) | (_, Self::Root) => true,
            (Self::Field(a), Self::Field(b)) => a == b,
        }
    }

    #[must_use]
    pub fn shape(&self) -> SlotShape {
        match self {
            Self::Root => SlotShape::WholeObject,
            Self::Field(_) => SlotShape::Field,
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "$"),
            Self::Field(segments) => write!(f, "$.{}", segments.join(".")),
        }
    }
}

/// Uncompiled field slot: descriptor text, parameter name and setter.
pub struct FieldPath<T, V> {
    descriptor: String,
    param: String,
    setter: SetterFactory<T, V>,
}

impl<T, V> FieldPath<T, V>
where
    T: 'static,
    V: 'static,
{
    /// Create a field path with a ready setter.
    pub fn new(
        descriptor: impl Into<String>,
        param: impl Into<String>,
        setter: impl Fn(&mut T, V) + Send + Sync + 'static,
    ) -> Self {
        let setter: Setter<T, V> = Arc::new(setter);
        Self {
            descriptor: descriptor.into(),
            param: param.into(),
            setter: Arc::new(move || Arc::clone(&setter)),
        }
    }

    /// Create a field path whose setter is constructed on first write.
    ///
    /// The factory runs at most once per binder, even when several
    /// invocations of a transform race to the first write.
    pub fn deferred<F>(
        descriptor: impl Into<String>,
        param: impl Into<String>,
        factory: impl Fn() -> F + Send + Sync + 'static,
    ) -> Self
    where
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        Self {
            descriptor: descriptor.into(),
            param: param.into(),
            setter: Arc::new(move || Arc::new(factory()) as Setter<T, V>),
        }
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }
}

impl<T, V> fmt::Debug for FieldPath<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldPath")
            .field("descriptor", &self.descriptor)
            .field("param", &self.param)
            .finish_non_exhaustive()
    }
}

/// Uncompiled whole-object slot.
pub struct ObjectPath<T> {
    descriptor: String,
    param: String,
    _target: std::marker::PhantomData<fn(&mut T)>,
}

impl<T> ObjectPath<T> {
    pub fn new(descriptor: impl Into<String>, param: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            param: param.into(),
            _target: std::marker::PhantomData,
        }
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }
}

impl<T> fmt::Debug for ObjectPath<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPath")
            .field("descriptor", &self.descriptor)
            .field("param", &self.param)
            .finish()
    }
}

/// Compiled slot writer for one rule.
pub struct SlotBinder<T, V> {
    key: SlotKey,
    factory: SetterFactory<T, V>,
    setter: OnceLock<Setter<T, V>>,
}

impl<T, V> SlotBinder<T, V>
where
    T: 'static,
    V: 'static,
{
    /// Compile a field path, rejecting anything but `param.member(.member)*`.
    pub fn field(path: FieldPath<T, V>) -> Result<Self> {
        let segments = parse_descriptor(&path.descriptor, &path.param, SlotShape::Field)?;
        if segments.is_empty() {
            return Err(Error::invalid_shape(
                path.descriptor,
                SlotShape::Field,
                "Got the target parameter itself. Did you mean to use for_object instead?",
            ));
        }

        Ok(Self {
            key: SlotKey::Field(segments),
            factory: path.setter,
            setter: OnceLock::new(),
        })
    }

    #[must_use]
    pub fn key(&self) -> &SlotKey {
        &self.key
    }

    #[must_use]
    pub fn shape(&self) -> SlotShape {
        self.key.shape()
    }

    /// Setter for this slot, constructed once on first use.
    pub fn setter(&self) -> &Setter<T, V> {
        self.setter.get_or_init(|| {
            trace!(slot = %self.key, "compiling slot setter");
            (self.factory)()
        })
    }

    /// Write a value into the target.
    pub fn write(&self, target: &mut T, value: V) {
        trace!(slot = %self.key, "writing slot");
        (self.setter())(target, value);
    }
}

impl<T> SlotBinder<T, T>
where
    T: 'static,
{
    /// Compile a whole-object path; only the bare parameter is accepted.
    pub fn whole_object(path: ObjectPath<T>) -> Result<Self> {
        let segments = parse_descriptor(&path.descriptor, &path.param, SlotShape::WholeObject)?;
        if !segments.is_empty() {
            return Err(Error::invalid_shape(
                path.descriptor,
                SlotShape::WholeObject,
                "Got a member access. Did you mean to use for_field instead?",
            ));
        }

        let replace: SetterFactory<T, T> = Arc::new(|| {
            Arc::new(|target: &mut T, value: T| {
                *target = value;
            }) as Setter<T, T>
        });

        Ok(Self {
            key: SlotKey::Root,
            factory: replace,
            setter: OnceLock::new(),
        })
    }
}

impl<T, V> fmt::Debug for SlotBinder<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotBinder")
            .field("key", &self.key)
            .field("compiled", &self.setter.get().is_some())
            .finish()
    }
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is a valid regex")
    })
}

/// Split a descriptor into member names below `param`.
///
/// Whitespace is allowed around the dots only; each segment must be a plain
/// identifier.
fn parse_descriptor(descriptor: &str, param: &str, expected: SlotShape) -> Result<Vec<String>> {
    let hint = match expected {
        SlotShape::Field => "Expected a member chain such as `to.member.nested`.",
        SlotShape::WholeObject => {
            "Expected the bare target parameter. Did you mean to use for_field instead?"
        }
    };

    let segments: Vec<&str> = descriptor.split('.').map(str::trim).collect();
    if !segments
        .iter()
        .all(|segment| identifier_pattern().is_match(segment))
    {
        return Err(Error::invalid_shape(descriptor, expected, hint));
    }

    let mut parts = segments.into_iter();
    match parts.next() {
        Some(root) if root == param.trim() => Ok(parts.map(str::to_string).collect()),
        _ => Err(Error::invalid_shape(
            descriptor,
            expected,
            format!("The path must start at the target parameter `{}`.", param.trim()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct Contact {
        first: String,
    }

    #[derive(Debug, Default)]
    struct Customer {
        contact: Contact,
        id: u32,
    }

    #[test]
    fn test_field_key_ignores_parameter_name_and_spacing() {
        let a = SlotBinder::field(FieldPath::new(
            "to.contact.first",
            "to",
            |t: &mut Customer, v: String| t.contact.first = v,
        ))
        .unwrap();
        let b = SlotBinder::field(FieldPath::new(
            "dto . contact . first",
            "dto",
            |t: &mut Customer, v: String| t.contact.first = v,
        ))
        .unwrap();

        assert_eq!(a.key(), b.key());
        assert_eq!(a.key().to_string(), "$.contact.first");
        assert_eq!(a.shape(), SlotShape::Field);
    }

    #[test]
    fn test_field_binder_writes_nested_member() {
        let binder = SlotBinder::field(crate::field!(|to: Customer| to.contact.first)).unwrap();
        let mut target = Customer::default();

        binder.write(&mut target, "Mike".to_string());

        assert_eq!(target.contact.first, "Mike");
    }

    #[test]
    fn test_field_binder_rejects_bare_parameter_with_object_hint() {
        let result = SlotBinder::field(crate::field!(|to: Customer| to));

        match result {
            Err(Error::InvalidSlotShape { expected, hint, .. }) => {
                assert_eq!(expected, SlotShape::Field);
                assert!(hint.contains("for_object"));
            }
            other => panic!("Expected InvalidSlotShape, got {other:?}"),
        }
    }

    #[test]
    fn test_field_binder_rejects_computed_expression() {
        let result = SlotBinder::field(FieldPath::new(
            "to.contact.first.len()",
            "to",
            |_: &mut Customer, _: usize| {},
        ));
        assert!(matches!(result, Err(Error::InvalidSlotShape { .. })));

        let result = SlotBinder::field(FieldPath::new("to.id + 1", "to", |_: &mut Customer, _: u32| {}));
        assert!(matches!(result, Err(Error::InvalidSlotShape { .. })));
    }

    #[test]
    fn test_field_binder_rejects_whitespace_inside_member() {
        let result = SlotBinder::field(FieldPath::new(
            "to.first name",
            "to",
            |t: &mut Customer, v: String| t.contact.first = v,
        ));

        assert!(matches!(result, Err(Error::InvalidSlotShape { .. })));
    }

    #[test]
    fn test_field_binder_rejects_foreign_root() {
        let result = SlotBinder::field(FieldPath::new(
            "other.id",
            "to",
            |t: &mut Customer, v: u32| t.id = v,
        ));

        match result {
            Err(Error::InvalidSlotShape { hint, .. }) => assert!(hint.contains("`to`")),
            other => panic!("Expected InvalidSlotShape, got {other:?}"),
        }
    }

    #[test]
    fn test_whole_object_binder_replaces_target() {
        let binder = SlotBinder::whole_object(crate::object!(|to: Customer| to)).unwrap();
        let mut target = Customer::default();

        binder.write(
            &mut target,
            Customer {
                id: 7,
                ..Customer::default()
            },
        );

        assert_eq!(target.id, 7);
        assert_eq!(binder.key(), &SlotKey::Root);
        assert_eq!(binder.shape(), SlotShape::WholeObject);
    }

    #[test]
    fn test_whole_object_binder_rejects_member_access_with_field_hint() {
        let result = SlotBinder::whole_object(crate::object!(|to: Customer| to.contact));

        match result {
            Err(Error::InvalidSlotShape { expected, hint, .. }) => {
                assert_eq!(expected, SlotShape::WholeObject);
                assert!(hint.contains("for_field"));
            }
            other => panic!("Expected InvalidSlotShape, got {other:?}"),
        }
    }

    #[test]
    fn test_deferred_setter_is_compiled_once() {
        let compiled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&compiled);
        let binder = SlotBinder::field(FieldPath::deferred("to.id", "to", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            |t: &mut Customer, v: u32| t.id = v
        }))
        .unwrap();

        assert_eq!(compiled.load(Ordering::SeqCst), 0);

        let mut target = Customer::default();
        binder.write(&mut target, 1);
        binder.write(&mut target, 2);

        assert_eq!(target.id, 2);
        assert_eq!(compiled.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(binder.setter(), binder.setter()));
    }

    #[test]
    fn test_deferred_setter_compiles_once_under_concurrent_first_use() {
        let compiled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&compiled);
        let binder = Arc::new(
            SlotBinder::field(FieldPath::deferred("to.id", "to", move || {
                counter.fetch_add(1, Ordering::SeqCst);
                |t: &mut Customer, v: u32| t.id = v
            }))
            .unwrap(),
        );

        let handles: Vec<_> = (0..8u32)
            .map(|i| {
                let binder = Arc::clone(&binder);
                std::thread::spawn(move || {
                    let mut target = Customer::default();
                    binder.write(&mut target, i);
                    target.id
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), i as u32);
        }
        assert_eq!(compiled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_root_overlaps_every_slot() {
        let first = SlotKey::field(["contact", "first"]);
        let contact = SlotKey::field(["contact"]);

        assert!(SlotKey::Root.overlaps(&first));
        assert!(first.overlaps(&SlotKey::Root));
        assert!(first.overlaps(&first.clone()));
        assert!(!first.overlaps(&contact));
    }
}
