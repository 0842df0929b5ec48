//! SQL text for reclaim.
//!
//! Every statement the Postgres backend sends is built here. Table and
//! column names come from the catalog at runtime, so they are always quoted;
//! values always travel as `$n` parameters.

use std::fmt;

mod stmt;
pub use stmt::*;

/// A PostgreSQL identifier wrapper.
///
/// Display writes the value escaped and quoted with double quotes.
///
/// # Example
/// ```
/// use reclaim_sql::Ident;
/// assert_eq!(format!("{}", Ident("user")), "\"user\"");
/// assert_eq!(format!("{}", Ident("bla\"h")), "\"bla\"\"h\"");
/// ```
pub struct Ident<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> fmt::Display for Ident<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"")?;
        for c in self.0.as_ref().chars() {
            if c == '"' {
                f.write_str("\"\"")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        f.write_str("\"")
    }
}

/// Quote a PostgreSQL identifier.
///
/// Always quotes, so reserved words (`user`, `order`, `group`) and
/// mixed-case names (`userId`) survive. Doubles any embedded quotes.
pub fn quote_ident(name: &str) -> String {
    Ident(name).to_string()
}

/// A table name qualified by its schema, rendered as `"schema"."table"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualifiedTable<'a> {
    pub schema: &'a str,
    pub table: &'a str,
}

impl<'a> QualifiedTable<'a> {
    pub fn new(schema: &'a str, table: &'a str) -> Self {
        Self { schema, table }
    }
}

impl fmt::Display for QualifiedTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", Ident(self.schema), Ident(self.table))
    }
}
