//! Copy missing rows from the archival database into the merge database.
//!
//! Each row is fetched with `SELECT *` and re-inserted column for column, so
//! no table needs to be known ahead of time. The merge database is expected
//! to start empty: an identifier that already exists there fails the insert
//! and ends the run. Rows are independent; nothing is wrapped in a
//! transaction, and rows inserted before a failure stay in place.

use crate::{Database, Error, MissingRecordSet, RecordId, Result};
use std::io::Write;
use tracing::Instrument;

/// Copy every `(table, id)` in `missing` from `source` into `target`.
///
/// Writes a progress line per table and per record before touching it, and
/// a final success line. Returns the number of rows inserted.
pub async fn copy_records<S: Database, T: Database>(
    missing: &MissingRecordSet,
    id_column: &str,
    source: &S,
    target: &T,
    out: &mut impl Write,
) -> Result<usize> {
    writeln!(out, "Merge begins:")?;

    let mut copied = 0;
    for (table, ids) in missing.iter() {
        writeln!(out, "Merging table {}...", table)?;
        let span = tracing::info_span!("copy.table", table = %table, records = ids.len());
        copied += copy_table(table, ids, id_column, source, target, out)
            .instrument(span)
            .await?;
    }

    writeln!(out, "Merge successful!")?;
    writeln!(out)?;

    tracing::info!(copied, "merge finished");
    Ok(copied)
}

async fn copy_table<S: Database, T: Database>(
    table: &str,
    ids: &[RecordId],
    id_column: &str,
    source: &S,
    target: &T,
    out: &mut impl Write,
) -> Result<usize> {
    for &id in ids {
        writeln!(out, "  record with ID {}", id)?;

        // Absent here means it vanished after the diff; never skipped.
        let row = source
            .fetch_row(table, id_column, id)
            .await?
            .ok_or_else(|| Error::MissingRow {
                role: source.role(),
                table: table.to_string(),
                id,
            })?;

        target.insert_row(&row).await?;
        tracing::debug!(id, columns = row.columns.len(), "copied record");
    }
    Ok(ids.len())
}
