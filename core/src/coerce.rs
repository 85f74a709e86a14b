//! Conversion of dynamic values into declared member types.

use thiserror::Error;

use crate::registry::TypeRegistry;
use crate::type_info::{EnumInfo, Primitive, TypeDesc};
use crate::value::{EnumValue, Value};

/// A value could not be converted to a member's declared type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    #[error("Cannot assign null to non-nullable type {expected}")]
    NullIntoValueType { expected: String },
    #[error("Cannot convert {from} into {to}")]
    InvalidCast { from: &'static str, to: String },
    #[error("Value {value} is out of range for {to}")]
    OutOfRange { value: String, to: String },
    #[error("Unknown type name '{0}'")]
    UnknownType(String),
}

fn invalid(value: &Value, desc: &TypeDesc) -> CoercionError {
    CoercionError::InvalidCast {
        from: value.kind_name(),
        to: desc.display_name(),
    }
}

/// Converts `value` into a value of type `desc`.
///
/// Values already of the right shape pass through unchanged (instances
/// keep their identity). Otherwise:
///
/// - enums accept an integral discriminant or a variant name,
/// - [`TypeDesc::TypeRef`] accepts a type name resolved through the global
///   [`TypeRegistry`],
/// - primitives convert between numbers, strings and booleans, with
///   floats rounded half to even into integers and every integer
///   range-checked,
/// - lists and arrays coerce element-wise.
///
/// Null into anything but an optional or a type reference fails with
/// [`CoercionError::NullIntoValueType`].
pub fn coerce(value: Value, desc: &TypeDesc) -> Result<Value, CoercionError> {
    if value.is_null() {
        return if desc.is_nullable() {
            Ok(Value::Null)
        } else {
            Err(CoercionError::NullIntoValueType {
                expected: desc.display_name(),
            })
        };
    }

    match desc {
        TypeDesc::Primitive(p) => coerce_primitive(value, *p, desc),
        TypeDesc::Enum(info) => coerce_enum(value, *info, desc),
        TypeDesc::TypeRef => match value {
            Value::Type(_) => Ok(value),
            Value::Str(name) => TypeRegistry::global()
                .resolve(&name)
                .map(Value::Type)
                .ok_or(CoercionError::UnknownType(name)),
            other => Err(invalid(&other, desc)),
        },
        TypeDesc::Struct(info) => match value {
            Value::Struct(instance) | Value::Object(instance)
                if std::ptr::eq(instance.type_info(), *info) =>
            {
                Ok(Value::Struct(instance))
            }
            other => Err(invalid(&other, desc)),
        },
        TypeDesc::Object => match value {
            Value::Object(instance) | Value::Struct(instance) => Ok(Value::Object(instance)),
            other => Err(invalid(&other, desc)),
        },
        TypeDesc::List(elem) => match value {
            Value::List(items) | Value::Array(items) => Ok(Value::List(coerce_all(items, elem)?)),
            other => Err(invalid(&other, desc)),
        },
        TypeDesc::Array(elem) => match value {
            Value::List(items) | Value::Array(items) => Ok(Value::Array(coerce_all(items, elem)?)),
            other => Err(invalid(&other, desc)),
        },
        TypeDesc::Optional(inner) => coerce(value, inner),
        TypeDesc::Unit => Err(invalid(&value, desc)),
    }
}

fn coerce_all(items: Vec<Value>, elem: &TypeDesc) -> Result<Vec<Value>, CoercionError> {
    items.into_iter().map(|v| coerce(v, elem)).collect()
}

fn coerce_enum(
    value: Value,
    info: &'static EnumInfo,
    desc: &TypeDesc,
) -> Result<Value, CoercionError> {
    let discriminant = match &value {
        Value::Enum(e) if std::ptr::eq(e.info, info) => return Ok(value),
        Value::Int(v) => *v,
        Value::UInt(v) => i64::try_from(*v).map_err(|_| out_of_range(&value, desc))?,
        Value::Str(name) => match info.variant_by_name(name) {
            Some(variant) => variant.discriminant,
            None => return Err(invalid(&value, desc)),
        },
        _ => return Err(invalid(&value, desc)),
    };
    if info.variant(discriminant).is_none() {
        return Err(out_of_range(&value, desc));
    }
    Ok(Value::Enum(EnumValue::new(info, discriminant)))
}

fn out_of_range(value: &Value, desc: &TypeDesc) -> CoercionError {
    let shown = match value {
        Value::Int(v) => v.to_string(),
        Value::UInt(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Str(s) => s.clone(),
        other => other.kind_name().to_owned(),
    };
    CoercionError::OutOfRange {
        value: shown,
        to: desc.display_name(),
    }
}

fn coerce_primitive(value: Value, p: Primitive, desc: &TypeDesc) -> Result<Value, CoercionError> {
    match p {
        Primitive::Bool => match &value {
            Value::Bool(_) => Ok(value),
            Value::Int(v) => Ok(Value::Bool(*v != 0)),
            Value::UInt(v) => Ok(Value::Bool(*v != 0)),
            Value::Str(s) => s
                .trim()
                .parse::<bool>()
                .map(Value::Bool)
                .map_err(|_| invalid(&value, desc)),
            _ => Err(invalid(&value, desc)),
        },
        Primitive::F32 | Primitive::F64 => match &value {
            Value::Float(_) => Ok(value),
            Value::Int(v) => Ok(Value::Float(*v as f64)),
            Value::UInt(v) => Ok(Value::Float(*v as f64)),
            Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
            Value::Str(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| invalid(&value, desc)),
            _ => Err(invalid(&value, desc)),
        },
        Primitive::String => match value {
            Value::Str(_) => Ok(value),
            Value::Bool(b) => Ok(Value::Str(b.to_string())),
            Value::Int(v) => Ok(Value::Str(v.to_string())),
            Value::UInt(v) => Ok(Value::Str(v.to_string())),
            Value::Float(v) => Ok(Value::Str(v.to_string())),
            Value::Enum(e) => match e.variant_name() {
                Some(name) => Ok(Value::Str(name.to_owned())),
                None => Ok(Value::Str(e.discriminant.to_string())),
            },
            Value::Type(info) => Ok(Value::Str(info.type_path.to_owned())),
            other => Err(invalid(&other, desc)),
        },
        _ => coerce_integer(value, p, desc),
    }
}

fn coerce_integer(value: Value, p: Primitive, desc: &TypeDesc) -> Result<Value, CoercionError> {
    let wide: i128 = match &value {
        Value::Int(v) => *v as i128,
        Value::UInt(v) => *v as i128,
        Value::Bool(b) => *b as i128,
        Value::Enum(e) => e.discriminant as i128,
        Value::Float(f) => float_to_wide(*f).ok_or_else(|| out_of_range(&value, desc))?,
        Value::Str(s) => {
            let s = s.trim();
            match s.parse::<i128>() {
                Ok(v) => v,
                Err(_) => {
                    let f = s.parse::<f64>().map_err(|_| invalid(&value, desc))?;
                    float_to_wide(f).ok_or_else(|| out_of_range(&value, desc))?
                }
            }
        }
        _ => return Err(invalid(&value, desc)),
    };

    if let Some((min, max)) = p.signed_range() {
        if wide < min || wide > max {
            return Err(out_of_range(&value, desc));
        }
        return Ok(Value::Int(wide as i64));
    }
    match p.unsigned_max() {
        Some(max) if wide >= 0 && (wide as u128) <= max => Ok(Value::UInt(wide as u64)),
        Some(_) => Err(out_of_range(&value, desc)),
        None => Err(invalid(&value, desc)),
    }
}

fn float_to_wide(f: f64) -> Option<i128> {
    if !f.is_finite() {
        return None;
    }
    let rounded = f.round_ties_even();
    // Beyond u64/i64 territory anyway; keeps the cast well defined.
    if rounded.abs() > 1.0e30 {
        return None;
    }
    Some(rounded as i128)
}
