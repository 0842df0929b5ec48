//! Runtime column values.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use tokio_postgres::types::{FromSql, Type};
use uuid::Uuid;

/// A runtime SQL value.
///
/// Holds one column of a row read from the archival database, carried to the
/// merge database without interpretation. Maps to Postgres types.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL
    Null,

    /// Boolean
    Bool(bool),

    /// 16-bit signed integer (SMALLINT)
    I16(i16),

    /// 32-bit signed integer (INTEGER)
    I32(i32),

    /// 64-bit signed integer (BIGINT)
    I64(i64),

    /// 32-bit float (REAL)
    F32(f32),

    /// 64-bit float (DOUBLE PRECISION)
    F64(f64),

    /// Decimal (NUMERIC)
    Decimal(Decimal),

    /// Text (TEXT, VARCHAR, CHAR, NAME, CITEXT)
    String(String),

    /// Binary data (BYTEA)
    Bytes(Vec<u8>),

    /// JSON/JSONB document text
    Json(String),

    /// TIMESTAMPTZ
    Timestamptz(DateTime<Utc>),

    /// TIMESTAMP (without time zone)
    Timestamp(NaiveDateTime),

    /// DATE
    Date(NaiveDate),

    /// TIME
    Time(NaiveTime),

    /// UUID
    Uuid(Uuid),

    /// Any other column, kept as the binary wire value Postgres sent.
    ///
    /// Covers enums, arrays, ranges, network and geometric types, and values
    /// the typed variants cannot hold (`NaN` numerics, infinite timestamps).
    Raw { ty: Type, bytes: Vec<u8> },
}

impl Value {
    /// Returns true if this is a NULL value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer view of the value, for identifier and scope columns.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I16(v) => Some(i64::from(*v)),
            Value::I32(v) => Some(i64::from(*v)),
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }
}

impl<'a> FromSql<'a> for Value {
    fn from_sql(
        ty: &Type,
        raw: &'a [u8],
    ) -> Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        // Anything without a typed variant, or out of its range, passes through.
        match decode_typed(ty, raw) {
            Ok(Some(value)) => Ok(value),
            Ok(None) | Err(_) => Ok(Value::Raw {
                ty: ty.clone(),
                bytes: raw.to_vec(),
            }),
        }
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        Ok(Value::Null)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

fn decode_typed(
    ty: &Type,
    raw: &[u8],
) -> Result<Option<Value>, Box<dyn std::error::Error + Sync + Send>> {
    let value = match *ty {
        Type::BOOL => Value::Bool(bool::from_sql(ty, raw)?),
        Type::INT2 => Value::I16(i16::from_sql(ty, raw)?),
        Type::INT4 => Value::I32(i32::from_sql(ty, raw)?),
        Type::INT8 => Value::I64(i64::from_sql(ty, raw)?),
        Type::FLOAT4 => Value::F32(f32::from_sql(ty, raw)?),
        Type::FLOAT8 => Value::F64(f64::from_sql(ty, raw)?),
        Type::NUMERIC => Value::Decimal(Decimal::from_sql(ty, raw)?),
        Type::BYTEA => Value::Bytes(Vec::<u8>::from_sql(ty, raw)?),
        Type::JSON => Value::Json(String::from_utf8(raw.to_vec())?),
        Type::JSONB => {
            // JSONB wire format has a 1-byte version prefix
            match raw.split_first() {
                Some((&1, json)) => Value::Json(String::from_utf8(json.to_vec())?),
                _ => return Ok(None),
            }
        }
        Type::TIMESTAMPTZ => Value::Timestamptz(DateTime::<Utc>::from_sql(ty, raw)?),
        Type::TIMESTAMP => Value::Timestamp(NaiveDateTime::from_sql(ty, raw)?),
        Type::DATE => Value::Date(NaiveDate::from_sql(ty, raw)?),
        Type::TIME => Value::Time(NaiveTime::from_sql(ty, raw)?),
        Type::UUID => Value::Uuid(Uuid::from_sql(ty, raw)?),
        _ if <String as FromSql>::accepts(ty) => Value::String(String::from_sql(ty, raw)?),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

// Convenient From impls
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::I16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamptz(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
