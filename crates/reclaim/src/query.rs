//! Runtime row data.
//!
//! Rows are copied without compile-time knowledge of any table: each column
//! is decoded into a [`Value`] according to the type Postgres reports for it,
//! and encoded back unchanged on insert.

mod row;
mod value;

pub use row::{Row, SqlParam};
pub use value::Value;
