//! Static type descriptors.
//!
//! A [`TypeInfo`] is the registration-time schema of one inspectable type:
//! its members in declaration order, each with a declared [`TypeDesc`],
//! visibility, attributes and accessor function pointers. Tables are built
//! once (the derive macro stores them in a `LazyLock`) and live for the
//! whole process, so identity of a type is pointer identity of its
//! `&'static TypeInfo`.
//!
//! Single inheritance is expressed through [`BaseInfo`]: the derived type
//! embeds its base as a field, and the base accessors let callers reach
//! the embedded part to run the base type's own member accessors.

use std::fmt;

use crate::attributes::Attribute;
use crate::coerce::CoercionError;
use crate::reflect::Reflect;
use crate::value::{EnumValue, Instance, Value};

/// Primitive member types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
}

impl Primitive {
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::String => "String",
        }
    }

    /// Inclusive range of a signed integer primitive.
    pub(crate) fn signed_range(self) -> Option<(i128, i128)> {
        match self {
            Self::I8 => Some((i8::MIN as i128, i8::MAX as i128)),
            Self::I16 => Some((i16::MIN as i128, i16::MAX as i128)),
            Self::I32 => Some((i32::MIN as i128, i32::MAX as i128)),
            Self::I64 => Some((i64::MIN as i128, i64::MAX as i128)),
            _ => None,
        }
    }

    /// Upper bound of an unsigned integer primitive.
    pub(crate) fn unsigned_max(self) -> Option<u128> {
        match self {
            Self::U8 => Some(u8::MAX as u128),
            Self::U16 => Some(u16::MAX as u128),
            Self::U32 => Some(u32::MAX as u128),
            Self::U64 => Some(u64::MAX as u128),
            _ => None,
        }
    }
}

/// Declared type of a member.
#[derive(Clone)]
pub enum TypeDesc {
    Primitive(Primitive),
    Enum(&'static EnumInfo),
    /// A reference to a type, assignable from a type-name string.
    TypeRef,
    /// Non-primitive value type. Reads produce copies.
    Struct(&'static TypeInfo),
    /// Shared reference to any reflected object.
    Object,
    /// Growable sequence.
    List(Box<TypeDesc>),
    /// Fixed-size sequence.
    Array(Box<TypeDesc>),
    /// Nullable wrapper.
    Optional(Box<TypeDesc>),
    /// No value, the return type of methods returning `()`.
    Unit,
}

impl TypeDesc {
    /// Human-readable type name (`Vec<i32>`, `Option<Transform>`, ...).
    pub fn display_name(&self) -> String {
        match self {
            Self::Primitive(p) => p.name().to_owned(),
            Self::Enum(info) => info.name.to_owned(),
            Self::TypeRef => "TypeRef".to_owned(),
            Self::Struct(info) => info.name.to_owned(),
            Self::Object => "Instance".to_owned(),
            Self::List(elem) => format!("Vec<{}>", elem.display_name()),
            Self::Array(elem) => format!("Box<[{}]>", elem.display_name()),
            Self::Optional(inner) => format!("Option<{}>", inner.display_name()),
            Self::Unit => "()".to_owned(),
        }
    }

    /// Strips any [`Optional`](Self::Optional) wrappers.
    pub fn unwrap_optional(&self) -> &TypeDesc {
        let mut desc = self;
        while let Self::Optional(inner) = desc {
            desc = inner;
        }
        desc
    }

    /// Whether `Value::Null` is a legal value of this type.
    pub fn is_nullable(&self) -> bool {
        matches!(self, Self::Optional(_) | Self::TypeRef | Self::Unit)
    }

    pub fn is_array_like(&self) -> bool {
        matches!(self.unwrap_optional(), Self::List(_) | Self::Array(_))
    }

    /// Non-primitive value type (the "struct" classification).
    pub fn is_struct(&self) -> bool {
        matches!(self.unwrap_optional(), Self::Struct(_))
    }

    /// Struct or object: something with members of its own.
    pub fn is_composite(&self) -> bool {
        matches!(self.unwrap_optional(), Self::Struct(_) | Self::Object)
    }

    pub fn struct_info(&self) -> Option<&'static TypeInfo> {
        match self.unwrap_optional() {
            Self::Struct(info) => Some(*info),
            _ => None,
        }
    }

    /// Element type of a list or array.
    pub fn element(&self) -> Option<&TypeDesc> {
        match self.unwrap_optional() {
            Self::List(elem) | Self::Array(elem) => Some(elem),
            _ => None,
        }
    }

    /// Default value per type category: zero, empty, first variant or a
    /// default-constructed struct.
    pub fn default_value(&self) -> Value {
        match self {
            Self::Primitive(Primitive::Bool) => Value::Bool(false),
            Self::Primitive(Primitive::String) => Value::Str(String::new()),
            Self::Primitive(Primitive::F32 | Primitive::F64) => Value::Float(0.0),
            Self::Primitive(p) if p.unsigned_max().is_some() => Value::UInt(0),
            Self::Primitive(_) => Value::Int(0),
            Self::Enum(info) => Value::Enum(EnumValue::new(
                *info,
                info.variants.first().map_or(0, |v| v.discriminant),
            )),
            Self::Struct(info) => Value::Struct(Instance::from_boxed((info.construct)())),
            Self::List(_) => Value::List(Vec::new()),
            Self::Array(_) => Value::Array(Vec::new()),
            Self::TypeRef | Self::Object | Self::Optional(_) | Self::Unit => Value::Null,
        }
    }
}

impl PartialEq for TypeDesc {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Primitive(a), Self::Primitive(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => std::ptr::eq(*a, *b),
            (Self::TypeRef, Self::TypeRef)
            | (Self::Object, Self::Object)
            | (Self::Unit, Self::Unit) => true,
            (Self::Struct(a), Self::Struct(b)) => std::ptr::eq(*a, *b),
            (Self::List(a), Self::List(b))
            | (Self::Array(a), Self::Array(b))
            | (Self::Optional(a), Self::Optional(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// Member visibility as declared in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// Member getter: `None` if the object is not the declaring type.
pub type GetFn = fn(&dyn Reflect) -> Option<Value>;

/// Member setter: coerces the value to the member's type and assigns it.
pub type SetFn = fn(&mut dyn Reflect, Value) -> Result<(), CoercionError>;

/// Accessors reaching the embedded base part of a derived type.
pub struct BaseInfo {
    pub info: fn() -> &'static TypeInfo,
    pub get: fn(&dyn Reflect) -> Option<&dyn Reflect>,
    pub get_mut: fn(&mut dyn Reflect) -> Option<&mut dyn Reflect>,
}

/// A declared field.
pub struct FieldInfo {
    pub name: &'static str,
    pub visibility: Visibility,
    pub ty: fn() -> TypeDesc,
    pub attributes: Vec<Box<dyn Attribute>>,
    pub get: GetFn,
    pub set: SetFn,
}

/// A getter/setter pair exposed as a member.
pub struct PropertyInfo {
    pub name: &'static str,
    pub ty: fn() -> TypeDesc,
    pub attributes: Vec<Box<dyn Attribute>>,
    pub get: GetFn,
    /// `None` for read-only properties.
    pub set: Option<SetFn>,
}

/// A zero-argument method.
pub struct MethodInfo {
    pub name: &'static str,
    /// Declared return type, [`TypeDesc::Unit`] for `()`.
    pub returns: fn() -> TypeDesc,
    pub attributes: Vec<Box<dyn Attribute>>,
    pub invoke: fn(&mut dyn Reflect) -> Option<Value>,
}

/// Static descriptor of an inspectable type.
pub struct TypeInfo {
    /// Short name (`Transform`).
    pub name: &'static str,
    /// Fully qualified path (`my_crate::scene::Transform`).
    pub type_path: &'static str,
    pub base: Option<BaseInfo>,
    /// Fields declared on this level only, in declaration order.
    pub fields: Vec<FieldInfo>,
    pub properties: Vec<PropertyInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Vec<Box<dyn Attribute>>,
    pub construct: fn() -> Box<dyn Reflect>,
}

impl TypeInfo {
    /// The immediate base type, if any.
    pub fn base_info(&self) -> Option<&'static TypeInfo> {
        self.base.as_ref().map(|b| (b.info)())
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// True if `self` is `other` or derives from it.
    pub fn is_or_derives_from(&'static self, other: &'static TypeInfo) -> bool {
        let mut current = Some(self);
        while let Some(info) = current {
            if std::ptr::eq(info, other) {
                return true;
            }
            current = info.base_info();
        }
        false
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("type_path", &self.type_path)
            .field("fields", &self.fields.len())
            .field("properties", &self.properties.len())
            .field("methods", &self.methods.len())
            .finish()
    }
}

/// One enum variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumVariant {
    pub name: &'static str,
    pub discriminant: i64,
}

/// Static descriptor of a fieldless enum.
#[derive(Debug)]
pub struct EnumInfo {
    pub name: &'static str,
    pub type_path: &'static str,
    pub variants: Vec<EnumVariant>,
}

impl EnumInfo {
    pub fn variant(&self, discriminant: i64) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.discriminant == discriminant)
    }

    pub fn variant_by_name(&self, name: &str) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.name == name)
    }
}

/// Walks from `object` down its base chain to the part declared by `declaring`.
pub fn declaring_part<'a>(
    object: &'a dyn Reflect,
    declaring: &'static TypeInfo,
) -> Option<&'a dyn Reflect> {
    let mut current = object;
    loop {
        if std::ptr::eq(current.type_info(), declaring) {
            return Some(current);
        }
        let base = current.type_info().base.as_ref()?;
        current = (base.get)(current)?;
    }
}

/// Mutable counterpart of [`declaring_part`].
pub fn declaring_part_mut<'a>(
    object: &'a mut dyn Reflect,
    declaring: &'static TypeInfo,
) -> Option<&'a mut dyn Reflect> {
    let mut current = object;
    loop {
        if std::ptr::eq(current.type_info(), declaring) {
            return Some(current);
        }
        let base = current.type_info().base.as_ref()?;
        current = (base.get_mut)(current)?;
    }
}
