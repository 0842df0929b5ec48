//! Recover a single user's records after data loss.
//!
//! Given an archival ("old") database that still holds everything and a live
//! ("current") database that lost some rows, reclaim:
//! - finds every table carrying a user-scoping column ([`scan`])
//! - compares per-table record counts for one user ([`stats`])
//! - works out which record identifiers the live database is missing ([`diff`])
//! - copies those rows verbatim into an empty merge database ([`copy`])
//!
//! [`RestoreJob`] drives the whole sequence, either as a dry run that only
//! reports, or as a real run that also writes to the merge database.
//!
//! ```ignore
//! let archival = PgDatabase::new(old_client, Role::Archival, "public");
//! let live = PgDatabase::new(current_client, Role::Live, "public");
//! let merge = PgDatabase::new(merge_client, Role::Merge, "public");
//!
//! let job = RestoreJob {
//!     user_id: UserId::new(42)?,
//!     archival: &archival,
//!     live: &live,
//!     merge: &merge,
//!     options: ScopeOptions::default(),
//!     mode: Mode::DryRun,
//! };
//! job.run(&mut std::io::stdout()).await?;
//! ```
//!
//! Nothing is retried and nothing is rolled back: the first error ends the
//! run, and rows already copied into the merge database stay there.

use std::fmt;

pub mod copy;
mod database;
pub mod diff;
mod error;
pub mod query;
pub mod restore;
pub mod scan;
pub mod stats;
mod traced;

pub use database::{Database, PgDatabase};
pub use diff::MissingRecordSet;
pub use error::{BoxError, Error};
pub use query::{Row, Value};
pub use restore::{Mode, RestoreJob, RestoreOutcome};
pub use stats::{StatsReport, TableCounts};
pub use traced::{Connection, ConnectionExt, TracedConn};

/// Result type for reclaim operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Primary-key value of a record. Unique within its table.
pub type RecordId = i64;

/// The user whose records are being reconciled.
///
/// Always positive; [`UserId::new`] rejects anything else before a single
/// query is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(i64);

impl UserId {
    pub fn new(id: i64) -> Result<Self> {
        if id <= 0 {
            return Err(Error::InvalidUserId(id));
        }
        Ok(Self(id))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which of the three databases a handle points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The older snapshot, presumed complete.
    Archival,
    /// The current database, possibly missing rows.
    Live,
    /// Initially empty; receives the recovered rows.
    Merge,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Archival => write!(f, "archival"),
            Role::Live => write!(f, "live"),
            Role::Merge => write!(f, "merge"),
        }
    }
}

/// Names that tie a user to their rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeOptions {
    /// Schema searched for scoped tables.
    pub schema: String,
    /// Column holding the owning user's id.
    pub scope_column: String,
    /// Primary-key column, assumed to share a name across tables.
    pub id_column: String,
    /// Table holding the user record itself, keyed by the user id.
    pub parent_table: String,
}

impl Default for ScopeOptions {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
            scope_column: "user_id".to_string(),
            id_column: "id".to_string(),
            parent_table: "users".to_string(),
        }
    }
}
