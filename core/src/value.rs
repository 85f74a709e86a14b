//! Dynamic values flowing through member getters and setters.
//!
//! A [`Value`] is what a reflected getter returns and a setter accepts.
//! Primitive variants are plain data. Composite variants wrap an
//! [`Instance`], a shared box around a `dyn Reflect`:
//!
//! - [`Value::Struct`] is a boxed *copy* of a value-type member. Every live
//!   read produces a fresh box, and writing it back into an owner copies it
//!   again.
//! - [`Value::Object`] is a shared reference. Mutations through it are
//!   visible to every holder.
//!
//! Cloning a `Value` never deep-copies an instance; it aliases the box.
//! This is what lets a cached struct keep a stable identity across reads.

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::reflect::Reflect;
use crate::type_info::{EnumInfo, TypeInfo};

/// Shared, interior-mutable box around a reflected object.
///
/// Two `Instance`s are the same object iff [`ptr_eq`](Self::ptr_eq) holds.
#[derive(Clone)]
pub struct Instance(Rc<RefCell<Box<dyn Reflect>>>);

impl Instance {
    /// Boxes a reflected value.
    pub fn new<T: Reflect>(value: T) -> Self {
        Self::from_boxed(Box::new(value))
    }

    /// Wraps an already boxed reflected value.
    pub fn from_boxed(value: Box<dyn Reflect>) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    /// Immutably borrows the inner object.
    ///
    /// # Panics
    ///
    /// Panics if the instance is currently mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, dyn Reflect> {
        Ref::map(self.0.borrow(), |b| &**b)
    }

    /// Mutably borrows the inner object.
    ///
    /// # Panics
    ///
    /// Panics if the instance is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, dyn Reflect> {
        RefMut::map(self.0.borrow_mut(), |b| &mut **b)
    }

    /// Descriptor of the runtime type held by this instance.
    pub fn type_info(&self) -> &'static TypeInfo {
        self.borrow().type_info()
    }

    /// Reference identity.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Stable address of the shared box, usable as a memo key.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    /// Shallow value copy into a new box (shared references inside are aliased).
    pub fn copy(&self) -> Self {
        Self::from_boxed(self.borrow().clone_boxed())
    }

    /// Runs `f` against the inner object if it is a `T`.
    ///
    /// Returns `None` on a type mismatch or when the instance is mutably
    /// borrowed elsewhere.
    pub fn with<T: Any, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let guard = self.0.try_borrow().ok()?;
        guard.as_any().downcast_ref::<T>().map(f)
    }

    /// Runs `f` against the inner object mutably if it is a `T`.
    pub fn with_mut<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut guard = self.0.try_borrow_mut().ok()?;
        guard.as_any_mut().downcast_mut::<T>().map(f)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(inner) => write!(f, "Instance({})", inner.type_info().name),
            Err(_) => write!(f, "Instance(<borrowed>)"),
        }
    }
}

/// An enum value tagged with its descriptor.
#[derive(Clone, Copy)]
pub struct EnumValue {
    pub info: &'static EnumInfo,
    pub discriminant: i64,
}

impl EnumValue {
    pub fn new(info: &'static EnumInfo, discriminant: i64) -> Self {
        Self { info, discriminant }
    }

    /// Variant name, if the discriminant is declared.
    pub fn variant_name(&self) -> Option<&'static str> {
        self.info.variant(self.discriminant).map(|v| v.name)
    }
}

impl PartialEq for EnumValue {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.info, other.info) && self.discriminant == other.discriminant
    }
}

impl fmt::Debug for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant_name() {
            Some(name) => write!(f, "{}::{}", self.info.name, name),
            None => write!(f, "{}({})", self.info.name, self.discriminant),
        }
    }
}

/// Dynamic value representation.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Enum(EnumValue),
    /// A resolved type reference.
    Type(&'static TypeInfo),
    /// Boxed copy of a value-type member.
    Struct(Instance),
    /// Shared reference to an object.
    Object(Instance),
    /// Growable sequence.
    List(Vec<Value>),
    /// Fixed-size sequence.
    Array(Vec<Value>),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Enum(_) => "enum",
            Self::Type(_) => "type",
            Self::Struct(_) => "struct",
            Self::Object(_) => "object",
            Self::List(_) => "list",
            Self::Array(_) => "array",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The boxed instance behind a struct or object value.
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Self::Struct(i) | Self::Object(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integral view of `Int`, `UInt` (when it fits) and `Enum` values.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::UInt(v) => i64::try_from(*v).ok(),
            Self::Enum(e) => Some(e.discriminant),
            _ => None,
        }
    }

    /// Numeric view of any number variant.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::UInt(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of a list or array value.
    pub fn as_elements(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) | Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Consumes a list or array value into its elements.
    pub fn into_elements(self) -> Option<Vec<Value>> {
        match self {
            Self::List(items) | Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// True if both values hold the same boxed instance.
    pub fn same_instance(&self, other: &Value) -> bool {
        match (self.as_instance(), other.as_instance()) {
            (Some(a), Some(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// Structural equality for data variants; instances compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::UInt(a), Self::UInt(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::Type(a), Self::Type(b)) => std::ptr::eq(*a, *b),
            (Self::Struct(a), Self::Struct(b)) | (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::List(a), Self::List(b)) | (Self::Array(a), Self::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}
