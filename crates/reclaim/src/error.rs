use crate::{RecordId, Role};
use thiserror::Error;

/// Boxed driver error, so backends other than tokio-postgres can report failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid user id {0}: must be a positive integer")]
    InvalidUserId(i64),

    #[error("could not connect to {role} database: {source}")]
    Connection {
        role: Role,
        #[source]
        source: BoxError,
    },

    #[error("query failed on {role} database: {source}\n  sql: {sql}")]
    Query {
        role: Role,
        sql: String,
        #[source]
        source: BoxError,
    },

    #[error("cannot read column {table}.{column} from {role} database: {message}")]
    Scan {
        role: Role,
        table: String,
        column: String,
        message: String,
    },

    #[error("insert of {table} record {id} into {role} database failed: {source}")]
    Exec {
        role: Role,
        table: String,
        id: RecordId,
        #[source]
        source: BoxError,
    },

    #[error("{table} record {id} disappeared from {role} database")]
    MissingRow {
        role: Role,
        table: String,
        id: RecordId,
    },

    #[error("failed to write report: {0}")]
    Report(#[from] std::io::Error),
}

impl Error {
    /// Wrap a driver error raised by a read query.
    pub fn query(role: Role, sql: &str, source: impl Into<BoxError>) -> Self {
        Error::Query {
            role,
            sql: sql.to_string(),
            source: source.into(),
        }
    }
}
