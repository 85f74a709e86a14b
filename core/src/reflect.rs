//! Reflection traits.
//!
//! [`Reflect`] is the object-safe half: what a boxed `dyn Reflect` can tell
//! about itself at runtime. [`Reflected`] is the static half, implemented
//! for every type that may appear as a member: it knows its declared
//! [`TypeDesc`] and converts to and from [`Value`]. [`Inspectable`] ties the
//! two together for types with their own descriptor table, and is what
//! `#[derive(Inspectable)]` implements.

use std::any::Any;

use crate::coerce::{CoercionError, coerce};
use crate::type_info::{EnumInfo, Primitive, TypeDesc, TypeInfo};
use crate::value::{Instance, Value};

/// Runtime view of a reflected object.
pub trait Reflect: Any {
    /// Descriptor of the concrete type.
    fn type_info(&self) -> &'static TypeInfo;
    /// Value copy of `self` in a new box.
    fn clone_boxed(&self) -> Box<dyn Reflect>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Static conversion contract for member types.
pub trait Reflected: Sized + 'static {
    /// Declared type of a member of this Rust type.
    fn type_desc() -> TypeDesc;
    fn to_value(&self) -> Value;
    /// Builds `Self` from a value, coercing it to [`type_desc`](Self::type_desc) first.
    fn from_value(value: Value) -> Result<Self, CoercionError>;
}

/// A type with its own descriptor table.
pub trait Inspectable: Reflect + Reflected + Clone + Default {
    fn static_type_info() -> &'static TypeInfo;
}

/// A fieldless enum with a variant table.
pub trait ReflectEnum: Reflected {
    fn enum_info() -> &'static EnumInfo;
}

/// Return types a button method may have.
pub trait MethodReturn {
    fn return_desc() -> TypeDesc;
    fn into_return_value(self) -> Value;
}

impl MethodReturn for () {
    fn return_desc() -> TypeDesc {
        TypeDesc::Unit
    }

    fn into_return_value(self) -> Value {
        Value::Null
    }
}

impl<T: Reflected> MethodReturn for T {
    fn return_desc() -> TypeDesc {
        T::type_desc()
    }

    fn into_return_value(self) -> Value {
        self.to_value()
    }
}

/// A nullable reference to a type descriptor.
///
/// Assignable from a type name, which is resolved through the global
/// [`TypeRegistry`](crate::TypeRegistry).
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeRef(pub Option<&'static TypeInfo>);

impl TypeRef {
    pub fn of<T: Inspectable>() -> Self {
        Self(Some(T::static_type_info()))
    }

    pub fn get(&self) -> Option<&'static TypeInfo> {
        self.0
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        match (self.0, other.0) {
            (Some(a), Some(b)) => std::ptr::eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

fn mismatch(value: &Value, desc: &TypeDesc) -> CoercionError {
    CoercionError::InvalidCast {
        from: value.kind_name(),
        to: desc.display_name(),
    }
}

macro_rules! reflected_signed {
    ($($ty:ty => $prim:ident),* $(,)?) => {$(
        impl Reflected for $ty {
            fn type_desc() -> TypeDesc {
                TypeDesc::Primitive(Primitive::$prim)
            }

            fn to_value(&self) -> Value {
                Value::Int(*self as i64)
            }

            fn from_value(value: Value) -> Result<Self, CoercionError> {
                let desc = Self::type_desc();
                match coerce(value, &desc)? {
                    Value::Int(v) => Ok(v as $ty),
                    other => Err(mismatch(&other, &desc)),
                }
            }
        }
    )*};
}

macro_rules! reflected_unsigned {
    ($($ty:ty => $prim:ident),* $(,)?) => {$(
        impl Reflected for $ty {
            fn type_desc() -> TypeDesc {
                TypeDesc::Primitive(Primitive::$prim)
            }

            fn to_value(&self) -> Value {
                Value::UInt(*self as u64)
            }

            fn from_value(value: Value) -> Result<Self, CoercionError> {
                let desc = Self::type_desc();
                match coerce(value, &desc)? {
                    Value::UInt(v) => Ok(v as $ty),
                    other => Err(mismatch(&other, &desc)),
                }
            }
        }
    )*};
}

reflected_signed!(i8 => I8, i16 => I16, i32 => I32, i64 => I64);
reflected_unsigned!(u8 => U8, u16 => U16, u32 => U32, u64 => U64);

impl Reflected for f32 {
    fn type_desc() -> TypeDesc {
        TypeDesc::Primitive(Primitive::F32)
    }

    fn to_value(&self) -> Value {
        Value::Float(*self as f64)
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        let desc = Self::type_desc();
        match coerce(value, &desc)? {
            Value::Float(v) => Ok(v as f32),
            other => Err(mismatch(&other, &desc)),
        }
    }
}

impl Reflected for f64 {
    fn type_desc() -> TypeDesc {
        TypeDesc::Primitive(Primitive::F64)
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        let desc = Self::type_desc();
        match coerce(value, &desc)? {
            Value::Float(v) => Ok(v),
            other => Err(mismatch(&other, &desc)),
        }
    }
}

impl Reflected for bool {
    fn type_desc() -> TypeDesc {
        TypeDesc::Primitive(Primitive::Bool)
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        let desc = Self::type_desc();
        match coerce(value, &desc)? {
            Value::Bool(v) => Ok(v),
            other => Err(mismatch(&other, &desc)),
        }
    }
}

impl Reflected for String {
    fn type_desc() -> TypeDesc {
        TypeDesc::Primitive(Primitive::String)
    }

    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        let desc = Self::type_desc();
        match coerce(value, &desc)? {
            Value::Str(v) => Ok(v),
            other => Err(mismatch(&other, &desc)),
        }
    }
}

impl<T: Reflected> Reflected for Vec<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::List(Box::new(T::type_desc()))
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(Reflected::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::List(items) | Value::Array(items) => {
                items.into_iter().map(T::from_value).collect()
            }
            other => Err(mismatch(&other, &Self::type_desc())),
        }
    }
}

impl<T: Reflected> Reflected for Box<[T]> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Array(Box::new(T::type_desc()))
    }

    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(Reflected::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::List(items) | Value::Array(items) => items
                .into_iter()
                .map(T::from_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Vec::into_boxed_slice),
            other => Err(mismatch(&other, &Self::type_desc())),
        }
    }
}

impl<T: Reflected> Reflected for Option<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Optional(Box::new(T::type_desc()))
    }

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl Reflected for Instance {
    fn type_desc() -> TypeDesc {
        TypeDesc::Object
    }

    fn to_value(&self) -> Value {
        Value::Object(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match coerce(value, &TypeDesc::Object)? {
            Value::Object(instance) => Ok(instance),
            other => Err(mismatch(&other, &TypeDesc::Object)),
        }
    }
}

impl Reflected for TypeRef {
    fn type_desc() -> TypeDesc {
        TypeDesc::TypeRef
    }

    fn to_value(&self) -> Value {
        self.0.map_or(Value::Null, Value::Type)
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match coerce(value, &TypeDesc::TypeRef)? {
            Value::Type(info) => Ok(Self(Some(info))),
            Value::Null => Ok(Self(None)),
            other => Err(mismatch(&other, &TypeDesc::TypeRef)),
        }
    }
}

// Helpers called from `#[derive(Inspectable)]` output.

/// Extracts a value copy of `T` from a struct or object value.
#[doc(hidden)]
pub fn instance_from_value<T: Inspectable>(value: Value) -> Result<T, CoercionError> {
    let desc = T::type_desc();
    match coerce(value, &desc)? {
        Value::Struct(instance) | Value::Object(instance) => {
            let from = instance.type_info().name;
            instance
                .with(|inner: &T| inner.clone())
                .ok_or_else(|| CoercionError::InvalidCast {
                    from,
                    to: desc.display_name(),
                })
        }
        other => Err(mismatch(&other, &desc)),
    }
}

/// Coerces `value` into an enum and returns its discriminant.
#[doc(hidden)]
pub fn enum_discriminant(value: Value, info: &'static EnumInfo) -> Result<i64, CoercionError> {
    let desc = TypeDesc::Enum(info);
    match coerce(value, &desc)? {
        Value::Enum(e) => Ok(e.discriminant),
        other => Err(mismatch(&other, &desc)),
    }
}

/// Downcasts a member owner to its declaring type for a setter.
#[doc(hidden)]
pub fn target_mut<T: Reflect>(object: &mut dyn Reflect) -> Result<&mut T, CoercionError> {
    let from = object.type_info().name;
    object
        .as_any_mut()
        .downcast_mut::<T>()
        .ok_or_else(|| CoercionError::InvalidCast {
            from,
            to: std::any::type_name::<T>().to_owned(),
        })
}

#[doc(hidden)]
pub fn return_desc_of<S, R: MethodReturn>(_method: impl FnOnce(&mut S) -> R) -> TypeDesc {
    R::return_desc()
}

#[doc(hidden)]
pub fn getter_desc<S, T: Reflected>(_getter: impl FnOnce(&S) -> T) -> TypeDesc {
    T::type_desc()
}

#[doc(hidden)]
pub fn setter_arg<S, T: Reflected>(
    setter: impl FnOnce(&mut S, T),
    target: &mut S,
    value: Value,
) -> Result<(), CoercionError> {
    setter(target, T::from_value(value)?);
    Ok(())
}
