//! Per-table record counts for one user, old vs. current.
//!
//! The summary counters only look at tables where the archival database
//! holds at least one of the user's rows. `total_missing` is a signed sum of
//! `archival - live` over those tables and is not clamped per table: a
//! table that gained rows in the live database offsets losses elsewhere.

use crate::{Database, Result, UserId};
use std::io::Write;

/// Record counts for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts<'a> {
    pub table: &'a str,
    /// Rows in the archival database.
    pub source: i64,
    /// Rows in the live database.
    pub target: i64,
}

impl TableCounts<'_> {
    pub fn has_data(&self) -> bool {
        self.source > 0
    }

    pub fn is_identical(&self) -> bool {
        self.source == self.target
    }

    pub fn is_zeroed(&self) -> bool {
        self.source > 0 && self.target == 0
    }

    pub fn is_reduced(&self) -> bool {
        self.source > self.target && self.target > 0
    }
}

/// Count comparison across every scoped table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsReport {
    pub user_id: UserId,
    /// `(table, archival count, live count)`, in table order.
    pub tables: Vec<(String, i64, i64)>,
}

impl StatsReport {
    /// Per-table counts, including tables where the user has no rows.
    pub fn counts(&self) -> impl Iterator<Item = TableCounts<'_>> {
        self.tables
            .iter()
            .map(|(table, source, target)| TableCounts {
                table,
                source: *source,
                target: *target,
            })
    }

    fn with_data(&self) -> impl Iterator<Item = TableCounts<'_>> {
        self.counts().filter(TableCounts::has_data)
    }

    /// Tables where the archival database has rows for the user.
    pub fn tables_with_data(&self) -> usize {
        self.with_data().count()
    }

    pub fn tables_identical(&self) -> usize {
        self.with_data().filter(TableCounts::is_identical).count()
    }

    pub fn tables_different(&self) -> usize {
        self.with_data().filter(|c| !c.is_identical()).count()
    }

    /// Tables with rows in the archive and none in the live database.
    pub fn tables_zeroed(&self) -> usize {
        self.with_data().filter(TableCounts::is_zeroed).count()
    }

    /// Tables that still have rows, but fewer than the archive.
    pub fn tables_reduced(&self) -> usize {
        self.with_data().filter(TableCounts::is_reduced).count()
    }

    /// Signed sum of `archival - live` over tables with data. May be negative.
    pub fn total_missing(&self) -> i64 {
        self.with_data().map(|c| c.source - c.target).sum()
    }

    /// Print the per-table lines and the summary counters.
    pub fn write_to(&self, out: &mut impl Write) -> std::io::Result<()> {
        writeln!(
            out,
            "The following tables contain data for user ID {}:",
            self.user_id
        )?;

        for c in self.with_data() {
            if c.is_identical() {
                writeln!(
                    out,
                    "{}: {} (same number of records in both databases)",
                    c.table, c.source
                )?;
            } else {
                writeln!(
                    out,
                    "{}: {} -> {} (number of records in old -> current database)",
                    c.table, c.source, c.target
                )?;
            }
        }

        writeln!(
            out,
            "Number of tables containing user's data: {}",
            self.tables_with_data()
        )?;
        writeln!(
            out,
            "Number of tables in which the number of records is identical: {}",
            self.tables_identical()
        )?;
        writeln!(
            out,
            "Number of tables in which the number of records is different: {}",
            self.tables_different()
        )?;
        writeln!(
            out,
            "Number of tables which contained data in the old database, but are empty in the current database: {}",
            self.tables_zeroed()
        )?;
        writeln!(
            out,
            "Number of tables which contained data in the old database, but contain fewer records in the current database: {}",
            self.tables_reduced()
        )?;
        writeln!(
            out,
            "Number of records missing in the current database: {}",
            self.total_missing()
        )?;
        writeln!(out)
    }
}

/// Count the user's rows in every table, in both databases.
///
/// Read-only. Tables are visited in the order given.
pub async fn compute_stats<S: Database, T: Database>(
    user_id: UserId,
    tables: &[String],
    scope_column: &str,
    source: &S,
    target: &T,
) -> Result<StatsReport> {
    let mut report = StatsReport {
        user_id,
        tables: Vec::with_capacity(tables.len()),
    };

    for table in tables {
        let source_count = source.count_scoped(table, scope_column, user_id).await?;
        let target_count = target.count_scoped(table, scope_column, user_id).await?;
        tracing::debug!(table = %table, source_count, target_count, "counted records");
        report
            .tables
            .push((table.clone(), source_count, target_count));
    }

    tracing::info!(
        tables_with_data = report.tables_with_data(),
        total_missing = report.total_missing(),
        "computed record counts"
    );
    Ok(report)
}
