//! # Inspector Core
//!
//! Reflection substrate for the inspector tree.
//!
//! Rust has no runtime member enumeration, so every inspectable type
//! carries a static descriptor table ([`TypeInfo`]) built once on first use.
//! `#[derive(Inspectable)]` generates the table. It can also be written by
//! hand.
//!
//! ## Core Types
//!
//! - [`Value`] - dynamic value passed through getters and setters
//! - [`Instance`] - shared box around a `dyn Reflect`, with reference identity
//! - [`TypeDesc`] - declared type of a member (primitive, struct, list, ...)
//! - [`TypeInfo`] - per-type descriptor: fields, properties, methods, base
//! - [`Reflect`] / [`Reflected`] / [`Inspectable`] - dynamic and static halves
//!   of the reflection contract
//! - [`Attribute`] / [`Attributes`] - marker queries used by the UI layer
//! - [`coerce`] - conversion of a [`Value`] into a declared [`TypeDesc`]
//! - [`TypeRegistry`] - process-wide lookup of type descriptors by name

extern crate self as inspector_core;

pub mod attributes;
pub mod coerce;
pub mod reflect;
pub mod registry;
pub mod type_info;
pub mod value;

pub use attributes::{
    Attribute, Attributes, Button, CustomRenderer, DisplayName, HideInInspector, NonSerialized,
    Range, SerializeField, SerializeReference, ShowInInspector, Tooltip,
};
pub use coerce::{CoercionError, coerce};
pub use inspector_macro::Inspectable;
pub use reflect::{Inspectable, MethodReturn, Reflect, ReflectEnum, Reflected, TypeRef};
pub use registry::TypeRegistry;
pub use type_info::{
    BaseInfo, EnumInfo, EnumVariant, FieldInfo, GetFn, MethodInfo, Primitive, PropertyInfo,
    SetFn, TypeDesc, TypeInfo, Visibility, declaring_part, declaring_part_mut,
};
pub use value::{EnumValue, Instance, Value};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
