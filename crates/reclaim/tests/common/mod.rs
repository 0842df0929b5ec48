//! In-memory stand-in for a Postgres database.
//!
//! Behaves like the real backend where the engine can tell the difference:
//! unknown tables and columns are errors, inserts never overwrite, and a
//! duplicate identifier fails the insert.

#![allow(dead_code)]

use chrono::NaiveDate;
use reclaim::{Database, Error, RecordId, Result, Role, Row, UserId, Value};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Mutex;

pub const USER: i64 = 42;
pub const OTHER_USER: i64 = 7;

pub fn user() -> UserId {
    UserId::new(USER).unwrap()
}

struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

pub struct MemoryDatabase {
    role: Role,
    schema: String,
    tables: Mutex<BTreeMap<String, Table>>,
}

impl MemoryDatabase {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            schema: "public".to_string(),
            tables: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn create_table(&self, name: &str, columns: &[&str]) {
        self.tables.lock().unwrap().insert(
            name.to_string(),
            Table {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows: Vec::new(),
            },
        );
    }

    /// Seed a row, bypassing the engine.
    pub fn put(&self, row: Row) {
        let mut tables = self.tables.lock().unwrap();
        let table = tables.get_mut(&row.table).expect("seeding an unknown table");
        table.rows.push(row);
    }

    /// Rows of `table`, ordered by identifier.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        let tables = self.tables.lock().unwrap();
        let mut rows = tables.get(table).map(|t| t.rows.clone()).unwrap_or_default();
        rows.sort_by_key(|r| r.id);
        rows
    }

    pub fn ids(&self, table: &str) -> Vec<RecordId> {
        self.rows(table).iter().map(|r| r.id).collect()
    }

    pub fn total_rows(&self) -> usize {
        let tables = self.tables.lock().unwrap();
        tables.values().map(|t| t.rows.len()).sum()
    }

    fn no_such_table(&self, table: &str) -> Error {
        Error::query(
            self.role,
            table,
            format!("relation \"{}\" does not exist", table),
        )
    }
}

fn owned_by(row: &Row, scope_column: &str, user_id: UserId) -> bool {
    row.get(scope_column).and_then(Value::as_i64) == Some(user_id.get())
}

impl Database for MemoryDatabase {
    fn role(&self) -> Role {
        self.role
    }

    async fn tables_with_column(&self, schema: &str, column: &str) -> Result<Vec<String>> {
        if schema != self.schema {
            return Ok(Vec::new());
        }
        let tables = self.tables.lock().unwrap();
        // Reverse order, like a catalog with no ORDER BY might.
        Ok(tables
            .iter()
            .rev()
            .filter(|(_, t)| t.columns.iter().any(|c| c == column))
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn count_scoped(&self, table: &str, scope_column: &str, user_id: UserId) -> Result<i64> {
        let tables = self.tables.lock().unwrap();
        let t = tables.get(table).ok_or_else(|| self.no_such_table(table))?;
        Ok(t.rows
            .iter()
            .filter(|r| owned_by(r, scope_column, user_id))
            .count() as i64)
    }

    async fn scoped_ids(
        &self,
        table: &str,
        scope_column: &str,
        id_column: &str,
        user_id: UserId,
    ) -> Result<Vec<RecordId>> {
        let tables = self.tables.lock().unwrap();
        let t = tables.get(table).ok_or_else(|| self.no_such_table(table))?;
        let mut ids: Vec<RecordId> = t
            .rows
            .iter()
            .filter(|r| owned_by(r, scope_column, user_id))
            .filter_map(|r| r.get(id_column).and_then(Value::as_i64))
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn fetch_row(&self, table: &str, id_column: &str, id: RecordId) -> Result<Option<Row>> {
        let tables = self.tables.lock().unwrap();
        let t = tables.get(table).ok_or_else(|| self.no_such_table(table))?;
        Ok(t.rows
            .iter()
            .find(|r| r.get(id_column).and_then(Value::as_i64) == Some(id))
            .cloned())
    }

    async fn insert_row(&self, row: &Row) -> Result<()> {
        let exec_error = |message: String| Error::Exec {
            role: self.role,
            table: row.table.clone(),
            id: row.id,
            source: message.into(),
        };

        let mut tables = self.tables.lock().unwrap();
        let t = tables
            .get_mut(&row.table)
            .ok_or_else(|| exec_error(format!("relation \"{}\" does not exist", row.table)))?;

        if let Some(unknown) = row.column_names().find(|c| !t.columns.iter().any(|k| k == c)) {
            return Err(exec_error(format!("column \"{}\" does not exist", unknown)));
        }
        if t.rows.iter().any(|r| r.id == row.id) {
            return Err(exec_error(format!(
                "duplicate key value violates unique constraint \"{}_pkey\"",
                row.table
            )));
        }

        t.rows.push(row.clone());
        Ok(())
    }
}

pub fn user_row(id: i64, name: &str) -> Row {
    Row::new("users", id)
        .with("id", id)
        .with("name", name)
        .with("email", format!("{}@example.com", name))
}

pub fn order(id: i64, user_id: i64) -> Row {
    Row::new("orders", id)
        .with("id", id)
        .with("user_id", user_id)
        .with("total", Decimal::new(1999 + id, 2))
        .with("placed_on", NaiveDate::from_ymd_opt(2019, 3, id as u32).unwrap())
        .with("paid", id % 2 == 0)
        .with("note", None::<String>)
        .with("receipt", vec![0xde, 0xad, id as u8])
}

pub fn note(id: i64, user_id: i64) -> Row {
    Row::new("profile_notes", id)
        .with("id", id)
        .with("user_id", user_id)
        .with("body", format!("note {}", id))
}

pub fn audit(id: i64, user_id: i64) -> Row {
    Row::new("audit_log", id)
        .with("id", id)
        .with("user_id", user_id)
        .with("action", "login")
}

const ORDER_COLUMNS: &[&str] = &[
    "id",
    "user_id",
    "total",
    "placed_on",
    "paid",
    "note",
    "receipt",
];

fn create_schema(db: &MemoryDatabase) {
    db.create_table("users", &["id", "name", "email"]);
    db.create_table("orders", ORDER_COLUMNS);
    db.create_table("profile_notes", &["id", "user_id", "body"]);
    db.create_table("audit_log", &["id", "user_id", "action"]);
}

/// User 42 lost order 2; their notes were shuffled (5 deleted, 7 added)
/// without changing the count. User 7's audit rows are untouched.
pub fn scenario() -> (MemoryDatabase, MemoryDatabase, MemoryDatabase) {
    let archival = MemoryDatabase::new(Role::Archival);
    let live = MemoryDatabase::new(Role::Live);
    let merge = MemoryDatabase::new(Role::Merge);
    for db in [&archival, &live, &merge] {
        create_schema(db);
    }

    archival.put(user_row(USER, "ada"));
    archival.put(user_row(OTHER_USER, "bob"));
    for id in [1, 2, 3] {
        archival.put(order(id, USER));
    }
    archival.put(order(4, OTHER_USER));
    for id in [5, 6] {
        archival.put(note(id, USER));
    }
    archival.put(audit(1, OTHER_USER));

    live.put(user_row(USER, "ada"));
    live.put(user_row(OTHER_USER, "bob"));
    for id in [1, 3] {
        live.put(order(id, USER));
    }
    live.put(order(4, OTHER_USER));
    for id in [6, 7] {
        live.put(note(id, USER));
    }
    live.put(audit(1, OTHER_USER));

    (archival, live, merge)
}
