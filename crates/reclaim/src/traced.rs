//! Query logging, tagged with the role of the database being hit.
//!
//! Every statement the engine sends goes through [`TracedConn`], so a
//! `RUST_LOG=reclaim=debug` run shows each SQL text with the database it ran
//! against and how many rows came back.

use crate::Role;
use std::future::Future;
use std::pin::Pin;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Error, Row};
use tracing::{Instrument, Span};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send + 'a>>;
type Params<'a> = &'a [&'a (dyn ToSql + Sync)];

/// Borrowed connection that wraps each call in a `db.query` or `db.execute`
/// debug span.
///
/// ```ignore
/// use reclaim::{ConnectionExt, Role};
///
/// let merge = client.traced(Role::Merge);
/// merge.execute("INSERT INTO \"public\".\"users\" (\"id\") VALUES ($1)", &[&42i64]).await?;
/// ```
pub struct TracedConn<'a, C: Connection> {
    conn: &'a C,
    role: Role,
}

impl<'a, C: Connection> TracedConn<'a, C> {
    pub fn new(conn: &'a C, role: Role) -> Self {
        Self { conn, role }
    }

    fn query_span(&self, sql: &str, params: usize) -> Span {
        tracing::debug_span!(
            "db.query",
            db = %self.role,
            sql = %sql,
            params,
            rows = tracing::field::Empty,
        )
    }

    /// Run a statement, returning the number of rows affected.
    pub async fn execute(&self, sql: &str, params: Params<'_>) -> Result<u64, Error> {
        let span = tracing::debug_span!(
            "db.execute",
            db = %self.role,
            sql = %sql,
            params = params.len(),
            affected = tracing::field::Empty,
        );
        let affected = self
            .conn
            .execute(sql, params)
            .instrument(span.clone())
            .await?;
        span.record("affected", affected);
        Ok(affected)
    }

    pub async fn query(&self, sql: &str, params: Params<'_>) -> Result<Vec<Row>, Error> {
        let span = self.query_span(sql, params.len());
        let rows = self
            .conn
            .query(sql, params)
            .instrument(span.clone())
            .await?;
        span.record("rows", rows.len());
        Ok(rows)
    }

    pub async fn query_opt(&self, sql: &str, params: Params<'_>) -> Result<Option<Row>, Error> {
        let span = self.query_span(sql, params.len());
        let row = self
            .conn
            .query_opt(sql, params)
            .instrument(span.clone())
            .await?;
        span.record("rows", usize::from(row.is_some()));
        Ok(row)
    }

    /// Fails unless the query returns exactly one row.
    pub async fn query_one(&self, sql: &str, params: Params<'_>) -> Result<Row, Error> {
        let span = self.query_span(sql, params.len());
        let row = self
            .conn
            .query_one(sql, params)
            .instrument(span.clone())
            .await?;
        span.record("rows", 1usize);
        Ok(row)
    }
}

pub trait ConnectionExt: Connection + Sized {
    /// Log every call made through the returned handle under `role`.
    fn traced(&self, role: Role) -> TracedConn<'_, Self> {
        TracedConn::new(self, role)
    }
}

impl<C: Connection> ConnectionExt for C {}

/// The statements [`PgDatabase`](crate::PgDatabase) needs from a client.
///
/// Implemented for `tokio_postgres::Client`; anything else that speaks the
/// same protocol (a pooled client, a transaction) can plug in here.
pub trait Connection: Send + Sync {
    fn execute<'a>(&'a self, sql: &'a str, params: Params<'a>) -> BoxFuture<'a, u64>;

    fn query<'a>(&'a self, sql: &'a str, params: Params<'a>) -> BoxFuture<'a, Vec<Row>>;

    fn query_opt<'a>(&'a self, sql: &'a str, params: Params<'a>) -> BoxFuture<'a, Option<Row>>;

    fn query_one<'a>(&'a self, sql: &'a str, params: Params<'a>) -> BoxFuture<'a, Row>;
}

impl Connection for tokio_postgres::Client {
    fn execute<'a>(&'a self, sql: &'a str, params: Params<'a>) -> BoxFuture<'a, u64> {
        Box::pin(tokio_postgres::Client::execute(self, sql, params))
    }

    fn query<'a>(&'a self, sql: &'a str, params: Params<'a>) -> BoxFuture<'a, Vec<Row>> {
        Box::pin(tokio_postgres::Client::query(self, sql, params))
    }

    fn query_opt<'a>(&'a self, sql: &'a str, params: Params<'a>) -> BoxFuture<'a, Option<Row>> {
        Box::pin(tokio_postgres::Client::query_opt(self, sql, params))
    }

    fn query_one<'a>(&'a self, sql: &'a str, params: Params<'a>) -> BoxFuture<'a, Row> {
        Box::pin(tokio_postgres::Client::query_one(self, sql, params))
    }
}
