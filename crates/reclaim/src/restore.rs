//! The restore workflow.

use crate::copy::copy_records;
use crate::diff::find_missing;
use crate::scan::{discover_scoped_tables, write_tables};
use crate::stats::compute_stats;
use crate::{Database, MissingRecordSet, Result, ScopeOptions, StatsReport, UserId};
use std::io::Write;

/// Whether a run may write to the merge database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Report only; the merge database is not touched.
    #[default]
    DryRun,
    /// Report, then copy the missing rows into the merge database.
    Real,
}

/// Everything one run needs. Lives for a single invocation.
pub struct RestoreJob<'a, A, L, M> {
    pub user_id: UserId,
    /// Old snapshot, presumed complete.
    pub archival: &'a A,
    /// Current database, checked against the archive.
    pub live: &'a L,
    /// Receives the copied rows in [`Mode::Real`].
    pub merge: &'a M,
    pub options: ScopeOptions,
    pub mode: Mode,
}

/// What a run found and did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreOutcome {
    /// Scoped tables in the archival schema, sorted.
    pub tables: Vec<String>,
    pub stats: StatsReport,
    /// Missing records as reported, without the parent entry.
    pub missing: MissingRecordSet,
    /// Rows inserted into the merge database; zero for a dry run.
    pub copied: usize,
}

impl<A: Database, L: Database, M: Database> RestoreJob<'_, A, L, M> {
    /// Discover, count, diff, and in real mode copy.
    ///
    /// Both modes run the same read-only steps, so a dry run's report lists
    /// exactly what a real run will copy, plus the user's parent record.
    pub async fn run(&self, out: &mut impl Write) -> Result<RestoreOutcome> {
        let ScopeOptions {
            schema,
            scope_column,
            id_column,
            parent_table,
        } = &self.options;

        tracing::info!(user_id = %self.user_id, mode = ?self.mode, "starting restore");

        match self.mode {
            Mode::DryRun => writeln!(out, "Just stats, merge database won't be touched...")?,
            Mode::Real => writeln!(out, "Merging!")?,
        }
        writeln!(out)?;

        let tables = discover_scoped_tables(self.archival, schema, scope_column).await?;
        write_tables(out, schema, scope_column, &tables)?;

        let stats = compute_stats(
            self.user_id,
            &tables,
            scope_column,
            self.archival,
            self.live,
        )
        .await?;
        stats.write_to(out)?;

        let missing = find_missing(
            self.user_id,
            &tables,
            scope_column,
            id_column,
            self.archival,
            self.live,
        )
        .await?;
        missing.write_to(out)?;

        let copied = match self.mode {
            Mode::DryRun => 0,
            Mode::Real => {
                let mut plan = missing.clone();
                plan.add_parent(parent_table, self.user_id);
                copy_records(&plan, id_column, self.archival, self.merge, out).await?
            }
        };

        Ok(RestoreOutcome {
            tables,
            stats,
            missing,
            copied,
        })
    }
}
