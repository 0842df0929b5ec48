//! Which of the user's records the live database lost.
//!
//! For each table, the missing identifiers are the archival identifiers that
//! the live database no longer has. A table only makes it into the
//! [`MissingRecordSet`] when the archive holds *more* of the user's rows than
//! the live database does:
//!
//! ```text
//! orders         archival {1, 2, 3}  live {1, 3}  -> included, missing [2]
//! profile_notes  archival {5, 6}     live {6, 7}  -> left out, counts are equal
//! ```
//!
//! The second case loses record 5 without it ever being reported. Restores
//! depend on this exact shape, so the count check stays in front of the set
//! difference; a warning is logged whenever it hides a real difference.

use crate::{Database, RecordId, Result, UserId};
use std::collections::{BTreeMap, HashSet};
use std::io::Write;

/// Identifiers to restore, grouped by table.
///
/// Tables iterate in lexicographic order, except for the parent entry added
/// by [`MissingRecordSet::add_parent`], which always comes first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingRecordSet {
    tables: BTreeMap<String, Vec<RecordId>>,
    parent: Option<String>,
}

impl MissingRecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identifiers for `table`, replacing any previous entry.
    pub fn insert(&mut self, table: impl Into<String>, ids: Vec<RecordId>) {
        self.tables.insert(table.into(), ids);
    }

    pub fn get(&self, table: &str) -> Option<&[RecordId]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    pub fn contains_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Number of tables with an entry.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Number of identifiers across all tables.
    pub fn record_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    /// Add the user's own record: `table` maps to exactly `[user_id]`.
    ///
    /// Replaces whatever the differ computed for that table, and moves the
    /// entry to the front of the iteration order.
    pub fn add_parent(&mut self, table: &str, user_id: UserId) {
        self.tables.insert(table.to_string(), vec![user_id.get()]);
        self.parent = Some(table.to_string());
    }

    /// Entries in copy order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RecordId])> {
        let parent = self
            .parent
            .as_deref()
            .and_then(|p| self.tables.get_key_value(p));
        let rest = self
            .tables
            .iter()
            .filter(move |(table, _)| Some(table.as_str()) != self.parent.as_deref());

        parent
            .into_iter()
            .chain(rest)
            .map(|(table, ids)| (table.as_str(), ids.as_slice()))
    }

    /// Print the per-table identifier lists.
    pub fn write_to(&self, out: &mut impl Write) -> std::io::Result<()> {
        writeln!(out, "IDs of missing records by table:")?;
        for (table, ids) in self.iter() {
            writeln!(out, "{}: {:?}", table, ids)?;
        }
        writeln!(out)
    }
}

/// Outcome of comparing one table's identifier lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDiff {
    /// Archival identifiers absent from the live list, in archival order.
    pub missing: Vec<RecordId>,
    /// Whether the table passes the count check and gets reported.
    pub included: bool,
}

/// Compare one table's identifier lists.
pub fn diff_ids(source: &[RecordId], target: &[RecordId]) -> TableDiff {
    let present: HashSet<RecordId> = target.iter().copied().collect();
    let missing = source
        .iter()
        .copied()
        .filter(|id| !present.contains(id))
        .collect();

    TableDiff {
        missing,
        included: source.len() > target.len(),
    }
}

/// Find the user's records that exist in `source` but not in `target`.
pub async fn find_missing<S: Database, T: Database>(
    user_id: UserId,
    tables: &[String],
    scope_column: &str,
    id_column: &str,
    source: &S,
    target: &T,
) -> Result<MissingRecordSet> {
    let mut missing = MissingRecordSet::new();

    for table in tables {
        let source_ids = source
            .scoped_ids(table, scope_column, id_column, user_id)
            .await?;
        let target_ids = target
            .scoped_ids(table, scope_column, id_column, user_id)
            .await?;

        let diff = diff_ids(&source_ids, &target_ids);
        if diff.included {
            tracing::debug!(table = %table, missing = diff.missing.len(), "table has missing records");
            missing.insert(table.as_str(), diff.missing);
        } else if !diff.missing.is_empty() {
            tracing::warn!(
                table = %table,
                hidden = diff.missing.len(),
                source_count = source_ids.len(),
                target_count = target_ids.len(),
                "identifier sets differ but the live database has as many records; table not restored"
            );
        }
    }

    tracing::info!(
        tables = missing.len(),
        records = missing.record_count(),
        "computed missing records"
    );
    Ok(missing)
}
