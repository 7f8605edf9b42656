//! Owned argument and cell values.
//!
//! [`Value`] is what flows between the compilers and the execution collaborator:
//! every bound argument is a `Value`, and every scanned cell comes back as one.
//! [`ToValue`] flattens a single model field, [`FromValue`] materializes it again.

use crate::error::{OrmError, OrmResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A bound argument or a scanned column value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Uuid(Uuid),
    Json(serde_json::Value),
}

impl Value {
    /// Whether this is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short type name, used in decode errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Uuid(_) => "uuid",
            Value::Json(_) => "json",
        }
    }

    /// Borrow textual content, including UTF-8 byte strings.
    fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v:?}"),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Date(v) => write!(f, "{v}"),
            Value::DateTime(v) => write!(f, "{v}"),
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Json(v) => write!(f, "{v}"),
        }
    }
}

/// Flatten a field into a bound argument.
///
/// Fallible so that fields needing serialization (see [`Json`]) can report a
/// per-row failure instead of aborting a batch.
pub trait ToValue {
    fn to_value(&self) -> OrmResult<Value>;
}

/// Materialize a field from a scanned cell.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> OrmResult<Self>;
}

fn mismatch<T>(expected: &str, got: &Value) -> OrmResult<T> {
    Err(OrmError::decode(
        expected,
        format!("cannot convert {} value into {expected}", got.kind()),
    ))
}

// ==================== Integers ====================

macro_rules! impl_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(v as i64)
            }
        }

        impl ToValue for $t {
            fn to_value(&self) -> OrmResult<Value> {
                Ok(Value::Int(*self as i64))
            }
        }

        impl FromValue for $t {
            fn from_value(value: Value) -> OrmResult<Self> {
                let name = stringify!($t);
                let out_of_range = || OrmError::decode(name, "integer out of range");
                match value {
                    Value::Int(v) => <$t>::try_from(v).map_err(|_| out_of_range()),
                    Value::UInt(v) => <$t>::try_from(v).map_err(|_| out_of_range()),
                    Value::Bool(v) => Ok(v as $t),
                    ref other => match other.as_text() {
                        Some(s) => s
                            .trim()
                            .parse::<$t>()
                            .map_err(|e| OrmError::decode(name, e.to_string())),
                        None => mismatch(name, other),
                    },
                }
            }
        }
    )*};
}

macro_rules! impl_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::UInt(v as u64)
            }
        }

        impl ToValue for $t {
            fn to_value(&self) -> OrmResult<Value> {
                Ok(Value::UInt(*self as u64))
            }
        }

        impl FromValue for $t {
            fn from_value(value: Value) -> OrmResult<Self> {
                let name = stringify!($t);
                let out_of_range = || OrmError::decode(name, "integer out of range");
                match value {
                    Value::Int(v) => <$t>::try_from(v).map_err(|_| out_of_range()),
                    Value::UInt(v) => <$t>::try_from(v).map_err(|_| out_of_range()),
                    Value::Bool(v) => Ok(v as $t),
                    ref other => match other.as_text() {
                        Some(s) => s
                            .trim()
                            .parse::<$t>()
                            .map_err(|e| OrmError::decode(name, e.to_string())),
                        None => mismatch(name, other),
                    },
                }
            }
        }
    )*};
}

impl_signed!(i8, i16, i32, i64, isize);
impl_unsigned!(u8, u16, u32, u64, usize);

// ==================== Floats ====================

macro_rules! impl_float {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Float(v as f64)
            }
        }

        impl ToValue for $t {
            fn to_value(&self) -> OrmResult<Value> {
                Ok(Value::Float(*self as f64))
            }
        }

        impl FromValue for $t {
            fn from_value(value: Value) -> OrmResult<Self> {
                let name = stringify!($t);
                match value {
                    Value::Float(v) => Ok(v as $t),
                    Value::Int(v) => Ok(v as $t),
                    Value::UInt(v) => Ok(v as $t),
                    ref other => match other.as_text() {
                        Some(s) => s
                            .trim()
                            .parse::<$t>()
                            .map_err(|e| OrmError::decode(name, e.to_string())),
                        None => mismatch(name, other),
                    },
                }
            }
        }
    )*};
}

impl_float!(f32, f64);

// ==================== Other scalars ====================

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl ToValue for bool {
    fn to_value(&self) -> OrmResult<Value> {
        Ok(Value::Bool(*self))
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Bool(v) => Ok(v),
            Value::Int(v) => Ok(v != 0),
            Value::UInt(v) => Ok(v != 0),
            ref other => match other.as_text() {
                Some("1") | Some("true") => Ok(true),
                Some("0") | Some("false") => Ok(false),
                _ => mismatch("bool", other),
            },
        }
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl ToValue for String {
    fn to_value(&self) -> OrmResult<Value> {
        Ok(Value::Text(self.clone()))
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Bytes(b) => {
                String::from_utf8(b).map_err(|e| OrmError::decode("String", e.to_string()))
            }
            Value::Int(v) => Ok(v.to_string()),
            Value::UInt(v) => Ok(v.to_string()),
            Value::Float(v) => Ok(v.to_string()),
            Value::Uuid(v) => Ok(v.to_string()),
            Value::Json(v) => Ok(v.to_string()),
            other => mismatch("String", &other),
        }
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> OrmResult<Value> {
        Ok(Value::Bytes(self.clone()))
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::Text(s) => Ok(s.into_bytes()),
            other => mismatch("Vec<u8>", &other),
        }
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl ToValue for NaiveDate {
    fn to_value(&self) -> OrmResult<Value> {
        Ok(Value::Date(*self))
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Date(d) => Ok(d),
            Value::DateTime(dt) => Ok(dt.date()),
            ref other => match other.as_text() {
                Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map_err(|e| OrmError::decode("NaiveDate", e.to_string())),
                None => mismatch("NaiveDate", other),
            },
        }
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl ToValue for NaiveDateTime {
    fn to_value(&self) -> OrmResult<Value> {
        Ok(Value::DateTime(*self))
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::DateTime(dt) => Ok(dt),
            Value::Date(d) => Ok(d.and_time(chrono::NaiveTime::MIN)),
            ref other => match other.as_text() {
                Some(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                    .map_err(|e| OrmError::decode("NaiveDateTime", e.to_string())),
                None => mismatch("NaiveDateTime", other),
            },
        }
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v.naive_utc())
    }
}

impl ToValue for DateTime<Utc> {
    fn to_value(&self) -> OrmResult<Value> {
        Ok(Value::DateTime(self.naive_utc()))
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> OrmResult<Self> {
        NaiveDateTime::from_value(value).map(|dt| dt.and_utc())
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl ToValue for Uuid {
    fn to_value(&self) -> OrmResult<Value> {
        Ok(Value::Uuid(*self))
    }
}

impl FromValue for Uuid {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Uuid(u) => Ok(u),
            Value::Bytes(ref b) if b.len() == 16 => {
                Uuid::from_slice(b).map_err(|e| OrmError::decode("Uuid", e.to_string()))
            }
            ref other => match other.as_text() {
                Some(s) => Uuid::parse_str(s).map_err(|e| OrmError::decode("Uuid", e.to_string())),
                None => mismatch("Uuid", other),
            },
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl ToValue for serde_json::Value {
    fn to_value(&self) -> OrmResult<Value> {
        Ok(Value::Json(self.clone()))
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Json(v) => Ok(v),
            Value::Null => Ok(serde_json::Value::Null),
            ref other => match other.as_text() {
                Some(s) => {
                    serde_json::from_str(s).map_err(|e| OrmError::decode("json", e.to_string()))
                }
                None => mismatch("json", other),
            },
        }
    }
}

impl ToValue for Value {
    fn to_value(&self) -> OrmResult<Value> {
        Ok(self.clone())
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> OrmResult<Self> {
        Ok(value)
    }
}

// ==================== Option ====================

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> OrmResult<Value> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

// ==================== Json ====================

/// Stores any serde type in a JSON text column.
///
/// ```ignore
/// #[derive(Default, Model)]
/// struct Profile {
///     #[orm(primary)]
///     id: i64,
///     settings: Json<Settings>,
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Json<T>(pub T);

impl<T: Serialize> ToValue for Json<T> {
    fn to_value(&self) -> OrmResult<Value> {
        serde_json::to_string(&self.0)
            .map(Value::Text)
            .map_err(|e| OrmError::decode("json", e.to_string()))
    }
}

impl<T: DeserializeOwned> FromValue for Json<T> {
    fn from_value(value: Value) -> OrmResult<Self> {
        let parsed = match value {
            Value::Json(v) => serde_json::from_value(v),
            ref other => match other.as_text() {
                Some(s) => serde_json::from_str(s),
                None => return mismatch("json", other),
            },
        };
        parsed
            .map(Json)
            .map_err(|e| OrmError::decode("json", e.to_string()))
    }
}
