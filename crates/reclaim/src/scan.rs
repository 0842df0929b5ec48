//! Discovery of user-scoped tables.

use crate::{Database, Result};
use std::io::Write;

/// Tables in `schema` that declare `column`, distinct and sorted.
///
/// Only the catalog is consulted; whether a table holds any rows is
/// irrelevant here.
pub async fn discover_scoped_tables<D: Database>(
    db: &D,
    schema: &str,
    column: &str,
) -> Result<Vec<String>> {
    let mut tables = db.tables_with_column(schema, column).await?;
    tables.sort();
    tables.dedup();

    tracing::info!(
        db = %db.role(),
        schema,
        column,
        tables = tables.len(),
        "discovered scoped tables"
    );
    Ok(tables)
}

/// Print the discovered tables with a trailing total.
pub fn write_tables(
    out: &mut impl Write,
    schema: &str,
    column: &str,
    tables: &[String],
) -> std::io::Result<()> {
    writeln!(
        out,
        "The following tables in schema '{}' contain the column '{}':",
        schema, column
    )?;
    for table in tables {
        writeln!(out, "{}", table)?;
    }
    writeln!(out, "Total {} tables.", tables.len())?;
    writeln!(out)
}
