//! The four questions the engine asks of a database, and the one write.

use crate::{Connection, ConnectionExt, Error, RecordId, Result, Role, Row, UserId};
use reclaim_sql::QualifiedTable;
use std::future::Future;
use tokio_postgres::types::ToSql;

/// A database the engine can read user-scoped records from, and insert rows into.
///
/// Table names are unqualified; implementations resolve them in their own
/// schema. Every call runs to completion before the engine issues the next.
pub trait Database: Send + Sync {
    /// Which database this is, for error messages and logs.
    fn role(&self) -> Role;

    /// Distinct names of the tables in `schema` declaring `column`, sorted.
    fn tables_with_column(
        &self,
        schema: &str,
        column: &str,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Number of rows in `table` whose `scope_column` equals `user_id`.
    fn count_scoped(
        &self,
        table: &str,
        scope_column: &str,
        user_id: UserId,
    ) -> impl Future<Output = Result<i64>> + Send;

    /// Identifiers of the rows in `table` owned by `user_id`, ascending.
    fn scoped_ids(
        &self,
        table: &str,
        scope_column: &str,
        id_column: &str,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<RecordId>>> + Send;

    /// The full row with the given identifier, or `None` if there is none.
    fn fetch_row(
        &self,
        table: &str,
        id_column: &str,
        id: RecordId,
    ) -> impl Future<Output = Result<Option<Row>>> + Send;

    /// Insert `row` into its table verbatim. Never updates or replaces.
    fn insert_row(&self, row: &Row) -> impl Future<Output = Result<()>> + Send;
}

/// A Postgres database reached through a tokio-postgres connection.
pub struct PgDatabase<C = tokio_postgres::Client> {
    conn: C,
    role: Role,
    schema: String,
}

impl<C: Connection> PgDatabase<C> {
    /// Wrap a connection; tables are looked up in `schema`.
    pub fn new(conn: C, role: Role, schema: impl Into<String>) -> Self {
        Self {
            conn,
            role,
            schema: schema.into(),
        }
    }

    /// The underlying connection.
    pub fn connection(&self) -> &C {
        &self.conn
    }

    fn table<'a>(&'a self, name: &'a str) -> QualifiedTable<'a> {
        QualifiedTable::new(&self.schema, name)
    }
}

impl<C: Connection> Database for PgDatabase<C> {
    fn role(&self) -> Role {
        self.role
    }

    async fn tables_with_column(&self, schema: &str, column: &str) -> Result<Vec<String>> {
        let sql = reclaim_sql::TABLES_WITH_COLUMN;
        let rows = self
            .conn
            .traced(self.role)
            .query(sql, &[&column, &schema])
            .await
            .map_err(|e| Error::query(self.role, sql, e))?;

        rows.iter()
            .map(|row| row.try_get::<_, String>(0))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::query(self.role, sql, e))
    }

    async fn count_scoped(&self, table: &str, scope_column: &str, user_id: UserId) -> Result<i64> {
        let sql = reclaim_sql::count_scoped(self.table(table), scope_column);
        let user_id = user_id.get();
        let row = self
            .conn
            .traced(self.role)
            .query_one(&sql, &[&user_id])
            .await
            .map_err(|e| Error::query(self.role, &sql, e))?;

        row.try_get::<_, i64>(0)
            .map_err(|e| Error::query(self.role, &sql, e))
    }

    async fn scoped_ids(
        &self,
        table: &str,
        scope_column: &str,
        id_column: &str,
        user_id: UserId,
    ) -> Result<Vec<RecordId>> {
        let sql = reclaim_sql::scoped_ids(self.table(table), scope_column, id_column);
        let user_id = user_id.get();
        let rows = self
            .conn
            .traced(self.role)
            .query(&sql, &[&user_id])
            .await
            .map_err(|e| Error::query(self.role, &sql, e))?;

        rows.iter()
            .map(|row| row.try_get::<_, RecordId>(0))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::query(self.role, &sql, e))
    }

    async fn fetch_row(&self, table: &str, id_column: &str, id: RecordId) -> Result<Option<Row>> {
        let sql = reclaim_sql::row_by_id(self.table(table), id_column);
        let pg_row = self
            .conn
            .traced(self.role)
            .query_opt(&sql, &[&id])
            .await
            .map_err(|e| Error::query(self.role, &sql, e))?;

        pg_row
            .map(|pg_row| Row::from_pg(&pg_row, table, id, self.role))
            .transpose()
    }

    async fn insert_row(&self, row: &Row) -> Result<()> {
        let columns: Vec<&str> = row.column_names().collect();
        let sql = reclaim_sql::insert_row(self.table(&row.table), &columns);
        let params = row.params();
        let params: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        self.conn
            .traced(self.role)
            .execute(&sql, &params)
            .await
            .map_err(|e| Error::Exec {
                role: self.role,
                table: row.table.clone(),
                id: row.id,
                source: e.into(),
            })?;

        Ok(())
    }
}
