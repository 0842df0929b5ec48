//! Row mapping between Postgres and schema-agnostic rows.

use super::Value;
use crate::{Error, RecordId, Role};
use indexmap::IndexMap;
use std::error::Error as StdError;
use tokio_postgres::types::{IsNull, Kind, ToSql, Type, WrongType};

/// One record, every column in table order.
///
/// The engine never looks inside the values; they are read from one
/// database and written to another exactly as decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub table: String,
    pub id: RecordId,
    pub columns: IndexMap<String, Value>,
}

impl Row {
    pub fn new(table: impl Into<String>, id: RecordId) -> Self {
        Self {
            table: table.into(),
            id,
            columns: IndexMap::new(),
        }
    }

    /// Append a column, keeping insertion order.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.insert(column.into(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Column values as insert parameters, in column order.
    pub fn params(&self) -> Vec<SqlParam<'_>> {
        self.columns.values().map(SqlParam).collect()
    }

    /// Convert a tokio_postgres Row, using the column types Postgres reports.
    pub fn from_pg(
        pg_row: &tokio_postgres::Row,
        table: &str,
        id: RecordId,
        role: Role,
    ) -> Result<Row, Error> {
        let mut columns = IndexMap::with_capacity(pg_row.len());

        for (idx, column) in pg_row.columns().iter().enumerate() {
            let read_error = |e: tokio_postgres::Error| Error::Scan {
                role,
                table: table.to_string(),
                column: column.name().to_string(),
                message: e.to_string(),
            };

            let value: Value = pg_row.try_get(idx).map_err(read_error)?;
            columns.insert(column.name().to_string(), value);
        }

        Ok(Row {
            table: table.to_string(),
            id,
            columns,
        })
    }
}

/// Whether a raw value read as `source` can be written to a `target` column.
///
/// Built-in types share OIDs across databases. User-defined enums, domains
/// and ranges get a fresh OID in every database, so those match by schema,
/// name and shape instead. Composites must share the OID.
fn same_type(source: &Type, target: &Type) -> bool {
    if source.oid() == target.oid() {
        return true;
    }
    if source.name() != target.name() || source.schema() != target.schema() {
        return false;
    }
    match (source.kind(), target.kind()) {
        (Kind::Enum(a), Kind::Enum(b)) => a == b,
        (Kind::Array(a), Kind::Array(b))
        | (Kind::Domain(a), Kind::Domain(b))
        | (Kind::Range(a), Kind::Range(b)) => same_type(a, b),
        _ => false,
    }
}

/// Array values embed their element OID in the header (bytes 8..12);
/// rewrite it when the element type is user-defined.
fn retag_array(encoded: &mut [u8], from: &Type, to: &Type) {
    if from.oid() != to.oid() && encoded.len() >= 12 {
        encoded[8..12].copy_from_slice(&to.oid().to_be_bytes());
    }
}

/// Wrapper to make our Value usable as a ToSql parameter.
///
/// Each variant is encoded with the checked encoder of its Rust type, so a
/// value headed for a column of a different type fails instead of writing
/// mis-encoded bytes. Raw values are written back as received, into a column
/// of the same type only.
#[derive(Debug)]
pub struct SqlParam<'a>(pub &'a Value);

impl ToSql for SqlParam<'_> {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        match self.0 {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql_checked(ty, out),
            Value::I16(v) => v.to_sql_checked(ty, out),
            Value::I32(v) => v.to_sql_checked(ty, out),
            Value::I64(v) => v.to_sql_checked(ty, out),
            Value::F32(v) => v.to_sql_checked(ty, out),
            Value::F64(v) => v.to_sql_checked(ty, out),
            Value::Decimal(v) => v.to_sql_checked(ty, out),
            Value::String(v) => v.to_sql_checked(ty, out),
            Value::Bytes(v) => v.to_sql_checked(ty, out),
            Value::Timestamptz(v) => v.to_sql_checked(ty, out),
            Value::Timestamp(v) => v.to_sql_checked(ty, out),
            Value::Date(v) => v.to_sql_checked(ty, out),
            Value::Time(v) => v.to_sql_checked(ty, out),
            Value::Uuid(v) => v.to_sql_checked(ty, out),
            Value::Json(v) => {
                match *ty {
                    Type::JSONB => out.extend_from_slice(&[1]), // JSONB version 1
                    Type::JSON => {}
                    _ => return Err(Box::new(WrongType::new::<Value>(ty.clone()))),
                }
                out.extend_from_slice(v.as_bytes());
                Ok(IsNull::No)
            }
            Value::Raw { ty: source, bytes } => {
                if !same_type(source, ty) {
                    return Err(Box::new(WrongType::new::<Value>(ty.clone())));
                }
                let start = out.len();
                out.extend_from_slice(bytes);
                if let (Kind::Array(from), Kind::Array(to)) = (source.kind(), ty.kind()) {
                    retag_array(&mut out[start..], from, to);
                }
                Ok(IsNull::No)
            }
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // Checked per variant in to_sql.
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use chrono::{TimeZone, Utc};
    use tokio_postgres::types::FromSql;

    fn encode(value: &Value, ty: &Type) -> Result<Vec<u8>, Box<dyn StdError + Sync + Send>> {
        let mut buf = BytesMut::new();
        match SqlParam(value).to_sql_checked(ty, &mut buf)? {
            IsNull::Yes => Ok(Vec::new()),
            IsNull::No => Ok(buf.to_vec()),
        }
    }

    #[test]
    fn encodes_integers_in_network_order() {
        assert_eq!(encode(&Value::I32(7), &Type::INT4).unwrap(), vec![0, 0, 0, 7]);
        assert_eq!(
            encode(&Value::I64(258), &Type::INT8).unwrap(),
            vec![0, 0, 0, 0, 0, 0, 1, 2]
        );
    }

    #[test]
    fn refuses_to_encode_into_a_different_column_type() {
        assert!(encode(&Value::I32(7), &Type::INT8).is_err());
        assert!(encode(&Value::String("x".into()), &Type::INT4).is_err());
        assert!(encode(&Value::Json("{}".into()), &Type::TEXT).is_err());
    }

    #[test]
    fn null_is_sent_as_sql_null() {
        let mut buf = BytesMut::new();
        let is_null = SqlParam(&Value::Null)
            .to_sql_checked(&Type::TIMESTAMPTZ, &mut buf)
            .unwrap();
        assert!(matches!(is_null, IsNull::Yes));
        assert!(buf.is_empty());
    }

    #[test]
    fn jsonb_gets_version_prefix() {
        assert_eq!(
            encode(&Value::Json("{}".into()), &Type::JSONB).unwrap(),
            b"\x01{}".to_vec()
        );
        assert_eq!(
            encode(&Value::Json("{}".into()), &Type::JSON).unwrap(),
            b"{}".to_vec()
        );
    }

    #[test]
    fn timestamps_survive_the_wire() {
        let at = Utc.with_ymd_and_hms(2019, 3, 14, 15, 9, 26).unwrap();
        let raw = encode(&Value::Timestamptz(at), &Type::TIMESTAMPTZ).unwrap();
        assert_eq!(
            Value::from_sql(&Type::TIMESTAMPTZ, &raw).unwrap(),
            Value::Timestamptz(at)
        );
    }

    fn status_enum(oid: u32) -> Type {
        Type::new(
            "status".into(),
            oid,
            Kind::Enum(vec!["open".into(), "closed".into()]),
            "public".into(),
        )
    }

    fn status_array(oid: u32, element: Type) -> Type {
        Type::new("_status".into(), oid, Kind::Array(element), "public".into())
    }

    #[test]
    fn raw_values_are_written_back_verbatim() {
        let nan = vec![0, 0, 0, 0, 0xc0, 0, 0, 0];
        let value = Value::Raw {
            ty: Type::NUMERIC,
            bytes: nan.clone(),
        };
        assert_eq!(encode(&value, &Type::NUMERIC).unwrap(), nan);
        assert!(encode(&value, &Type::INT4).is_err());
    }

    #[test]
    fn enums_match_by_name_across_databases() {
        let value = Value::Raw {
            ty: status_enum(16_390),
            bytes: b"open".to_vec(),
        };
        assert_eq!(encode(&value, &status_enum(24_577)).unwrap(), b"open".to_vec());

        let renamed = Type::new(
            "state".into(),
            24_577,
            Kind::Enum(vec!["open".into(), "closed".into()]),
            "public".into(),
        );
        assert!(encode(&value, &renamed).is_err());

        let other_labels = Type::new(
            "status".into(),
            24_577,
            Kind::Enum(vec!["open".into()]),
            "public".into(),
        );
        assert!(encode(&value, &other_labels).is_err());
    }

    #[test]
    fn enum_arrays_get_the_target_element_oid() {
        // one dimension, no nulls, element oid 16390, length 1, lower bound 1,
        // then a single 4-byte element
        let mut bytes = vec![0, 0, 0, 1, 0, 0, 0, 0];
        bytes.extend_from_slice(&16_390u32.to_be_bytes());
        bytes.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 4]);
        bytes.extend_from_slice(b"open");

        let value = Value::Raw {
            ty: status_array(16_389, status_enum(16_390)),
            bytes: bytes.clone(),
        };
        let encoded = encode(&value, &status_array(24_576, status_enum(24_577))).unwrap();

        assert_eq!(&encoded[8..12], &24_577u32.to_be_bytes());
        assert_eq!(&encoded[..8], &bytes[..8]);
        assert_eq!(&encoded[12..], &bytes[12..]);
    }

    #[test]
    fn builtin_arrays_are_untouched() {
        let mut bytes = vec![0, 0, 0, 1, 0, 0, 0, 0];
        bytes.extend_from_slice(&Type::TEXT.oid().to_be_bytes());
        bytes.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, b'a']);
        let value = Value::Raw {
            ty: Type::TEXT_ARRAY,
            bytes: bytes.clone(),
        };
        assert_eq!(encode(&value, &Type::TEXT_ARRAY).unwrap(), bytes);
        assert!(encode(&value, &Type::INT4_ARRAY).is_err());
    }

    #[test]
    fn row_keeps_column_order() {
        let row = Row::new("orders", 2)
            .with("id", 2i64)
            .with("user_id", 42i64)
            .with("note", None::<String>);

        assert_eq!(
            row.column_names().collect::<Vec<_>>(),
            vec!["id", "user_id", "note"]
        );
        assert_eq!(row.get("note"), Some(&Value::Null));
        assert_eq!(row.params().len(), 3);
    }
}
