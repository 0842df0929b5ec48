//! Statement builders.

use crate::{Ident, QualifiedTable};

/// Catalog lookup for the tables of a schema that declare a given column.
///
/// Parameters: `$1` column name, `$2` schema name. Yields one `text` column
/// of distinct table names in lexicographic order. The catalog columns are
/// `sql_identifier` domains, hence the casts.
pub const TABLES_WITH_COLUMN: &str = "SELECT DISTINCT table_name::text FROM information_schema.columns \
     WHERE column_name::text = $1 AND table_schema::text = $2 ORDER BY 1";

/// `SELECT COUNT(*)` of the rows owned by `$1`.
pub fn count_scoped(table: QualifiedTable<'_>, scope_column: &str) -> String {
    format!(
        "SELECT COUNT(*) FROM {} WHERE {} = $1::bigint",
        table,
        Ident(scope_column)
    )
}

/// Identifiers of the rows owned by `$1`, ascending.
pub fn scoped_ids(table: QualifiedTable<'_>, scope_column: &str, id_column: &str) -> String {
    format!(
        "SELECT {id}::bigint FROM {} WHERE {} = $1::bigint ORDER BY {id}",
        table,
        Ident(scope_column),
        id = Ident(id_column),
    )
}

/// Every column of the row whose identifier is `$1`.
pub fn row_by_id(table: QualifiedTable<'_>, id_column: &str) -> String {
    format!(
        "SELECT * FROM {} WHERE {} = $1::bigint",
        table,
        Ident(id_column)
    )
}

/// Positional insert of one row, one placeholder per column.
pub fn insert_row(table: QualifiedTable<'_>, columns: &[impl AsRef<str>]) -> String {
    if columns.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES", table);
    }

    let names: Vec<String> = columns
        .iter()
        .map(|c| Ident(c.as_ref()).to_string())
        .collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${}", i)).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        names.join(", "),
        placeholders.join(", ")
    )
}
