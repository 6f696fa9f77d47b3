use std::{cmp::Ordering, fmt::Write};
use time::{Date, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Dynamically typed value exchanged with the drivers.
///
/// Every variant except `Null` carries an `Option`, the `None` payload is a
/// typed null which is also used as the type prototype of a field.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    Uuid(Option<Uuid>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int8(l), Self::Int8(r)) => l == r,
            (Self::Int16(l), Self::Int16(r)) => l == r,
            (Self::Int32(l), Self::Int32(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::UInt8(l), Self::UInt8(r)) => l == r,
            (Self::UInt16(l), Self::UInt16(r)) => l == r,
            (Self::UInt32(l), Self::UInt32(r)) => l == r,
            (Self::UInt64(l), Self::UInt64(r)) => l == r,
            (Self::Float32(l), Self::Float32(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Time(l), Self::Time(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

/// Hashable normalization of a [`Value`].
///
/// Integers of any width collapse into the same key so that a foreign key
/// decoded as `i32` matches an identifier decoded as `i64`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Null,
    Boolean(bool),
    Integer(i128),
    Float(u64),
    Text(String),
    Blob(Box<[u8]>),
    Date(Date),
    Time(Time),
    Timestamp(PrimitiveDateTime),
    Uuid(Uuid),
}

impl Value {
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => v.is_none(),
            Value::Int8(v) => v.is_none(),
            Value::Int16(v) => v.is_none(),
            Value::Int32(v) => v.is_none(),
            Value::Int64(v) => v.is_none(),
            Value::UInt8(v) => v.is_none(),
            Value::UInt16(v) => v.is_none(),
            Value::UInt32(v) => v.is_none(),
            Value::UInt64(v) => v.is_none(),
            Value::Float32(v) => v.is_none(),
            Value::Float64(v) => v.is_none(),
            Value::Varchar(v) => v.is_none(),
            Value::Blob(v) => v.is_none(),
            Value::Date(v) => v.is_none(),
            Value::Time(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
            Value::Uuid(v) => v.is_none(),
        }
    }

    pub fn same_type(&self, other: &Self) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }

    /// Typed null of the same variant.
    pub fn as_null(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Boolean(..) => Value::Boolean(None),
            Value::Int8(..) => Value::Int8(None),
            Value::Int16(..) => Value::Int16(None),
            Value::Int32(..) => Value::Int32(None),
            Value::Int64(..) => Value::Int64(None),
            Value::UInt8(..) => Value::UInt8(None),
            Value::UInt16(..) => Value::UInt16(None),
            Value::UInt32(..) => Value::UInt32(None),
            Value::UInt64(..) => Value::UInt64(None),
            Value::Float32(..) => Value::Float32(None),
            Value::Float64(..) => Value::Float64(None),
            Value::Varchar(..) => Value::Varchar(None),
            Value::Blob(..) => Value::Blob(None),
            Value::Date(..) => Value::Date(None),
            Value::Time(..) => Value::Time(None),
            Value::Timestamp(..) => Value::Timestamp(None),
            Value::Uuid(..) => Value::Uuid(None),
        }
    }

    /// Integer content, regardless of the width.
    pub fn as_integer(&self) -> Option<i128> {
        match *self {
            Value::Boolean(Some(v)) => Some(v as i128),
            Value::Int8(Some(v)) => Some(v as i128),
            Value::Int16(Some(v)) => Some(v as i128),
            Value::Int32(Some(v)) => Some(v as i128),
            Value::Int64(Some(v)) => Some(v as i128),
            Value::UInt8(Some(v)) => Some(v as i128),
            Value::UInt16(Some(v)) => Some(v as i128),
            Value::UInt32(Some(v)) => Some(v as i128),
            Value::UInt64(Some(v)) => Some(v as i128),
            _ => None,
        }
    }

    /// Numeric content as a float, integers included.
    pub fn as_float(&self) -> Option<f64> {
        match *self {
            Value::Float32(Some(v)) => Some(v as f64),
            Value::Float64(Some(v)) => Some(v),
            _ => self.as_integer().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Varchar(Some(v)) => Some(v),
            _ => None,
        }
    }

    pub fn key(&self) -> ValueKey {
        if let Some(v) = self.as_integer() {
            return ValueKey::Integer(v);
        }
        match self {
            Value::Float32(Some(v)) => float_key(*v as f64),
            Value::Float64(Some(v)) => float_key(*v),
            Value::Varchar(Some(v)) => ValueKey::Text(v.clone()),
            Value::Blob(Some(v)) => ValueKey::Blob(v.clone()),
            Value::Date(Some(v)) => ValueKey::Date(*v),
            Value::Time(Some(v)) => ValueKey::Time(*v),
            Value::Timestamp(Some(v)) => ValueKey::Timestamp(*v),
            Value::Uuid(Some(v)) => ValueKey::Uuid(*v),
            _ => ValueKey::Null,
        }
    }

    /// Ordering between two non null values of compatible types.
    ///
    /// Numbers compare across widths, text lexicographically. `None` when
    /// either side is null or the types cannot be compared.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        if self.is_null() || other.is_null() {
            return None;
        }
        if let (Some(l), Some(r)) = (self.as_integer(), other.as_integer()) {
            return Some(l.cmp(&r));
        }
        if let (Some(l), Some(r)) = (self.as_float(), other.as_float()) {
            return l.partial_cmp(&r);
        }
        match (self, other) {
            (Value::Varchar(Some(l)), Value::Varchar(Some(r))) => Some(l.cmp(r)),
            (Value::Blob(Some(l)), Value::Blob(Some(r))) => Some(l.cmp(r)),
            (Value::Date(Some(l)), Value::Date(Some(r))) => Some(l.cmp(r)),
            (Value::Time(Some(l)), Value::Time(Some(r))) => Some(l.cmp(r)),
            (Value::Timestamp(Some(l)), Value::Timestamp(Some(r))) => Some(l.cmp(r)),
            (Value::Uuid(Some(l)), Value::Uuid(Some(r))) => Some(l.cmp(r)),
            _ => None,
        }
    }

    /// Equality used by filters: numeric across widths, otherwise structural.
    pub fn matches(&self, other: &Value) -> bool {
        if self.is_null() || other.is_null() {
            return false;
        }
        match self.compare(other) {
            Some(ordering) => ordering == Ordering::Equal,
            None => self.key() == other.key(),
        }
    }

    /// Short textual rendering used in logs and error messages.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = match self {
            v if v.is_null() => write!(out, "NULL"),
            Value::Varchar(Some(v)) => write!(out, "'{}'", v),
            Value::Blob(Some(v)) => write!(out, "<{} bytes>", v.len()),
            Value::Date(Some(v)) => write!(out, "{}", v),
            Value::Time(Some(v)) => write!(out, "{}", v),
            Value::Timestamp(Some(v)) => write!(out, "{}", v),
            Value::Uuid(Some(v)) => write!(out, "{}", v),
            v => match (v.as_integer(), v.as_float()) {
                (Some(i), _) => write!(out, "{}", i),
                (_, Some(f)) => write!(out, "{}", f),
                _ => write!(out, "{:?}", v),
            },
        };
        out
    }
}

fn float_key(value: f64) -> ValueKey {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        ValueKey::Integer(value as i128)
    } else {
        ValueKey::Float(value.to_bits())
    }
}
