use crate::db::SeedDatabase;
use crate::error::{Result, SeedError};
use crate::types::{Row, SeedValue, TableColumnSet};
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde_json::{Map, Number, Value};
use std::path::Path;
use tracing::debug;

/// SQLite-backed seed target
pub struct SqliteDatabase {
    conn: Connection,
    name: String,
}

impl SqliteDatabase {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            SeedError::Database(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Ok(Self::from_connection(conn, path.display().to_string()))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SeedError::Database(format!("Failed to open database: {}", e)))?;
        Ok(Self::from_connection(conn, ":memory:"))
    }

    pub fn from_connection(conn: Connection, name: impl Into<String>) -> Self {
        SqliteDatabase {
            conn,
            name: name.into(),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn execute_row(&self, sql: &str, table: &str, row: &Row) -> Result<()> {
        debug!(table, sql, "writing row");
        self.conn
            .execute(sql, params_from_iter(row.values()))
            .map_err(|e| SeedError::Database(format!("Failed to write to {}: {}", table, e)))?;
        Ok(())
    }
}

impl SeedDatabase for SqliteDatabase {
    fn database_name(&self) -> String {
        self.name.clone()
    }

    fn has_table(&self, table: &str) -> Result<bool> {
        self.conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |_| Ok(()),
            )
            .optional()
            .map(|found| found.is_some())
            .map_err(|e| SeedError::Database(format!("Failed to look up table {}: {}", table, e)))
    }

    fn column_listing(&self, table: &str) -> Result<TableColumnSet> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
            .map_err(|e| SeedError::Database(format!("Failed to list columns: {}", e)))?;

        let columns = stmt
            .query_map([table], |row| row.get::<_, String>(0))
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| {
                SeedError::Database(format!("Failed to list columns of {}: {}", table, e))
            })?;

        Ok(TableColumnSet::new(columns))
    }

    fn truncate(&mut self, table: &str) -> Result<()> {
        let sql = format!("DELETE FROM {}", quote_identifier(table));
        self.conn
            .execute(&sql, [])
            .map_err(|e| SeedError::Database(format!("Failed to truncate {}: {}", table, e)))?;
        Ok(())
    }

    fn insert(&mut self, table: &str, row: &Row) -> Result<()> {
        let sql = insert_sql(table, row);
        self.execute_row(&sql, table, row)
    }

    fn upsert(
        &mut self,
        table: &str,
        row: &Row,
        unique_by: &[&str],
        update_columns: &[&str],
    ) -> Result<()> {
        let mut sql = insert_sql(table, row);
        sql.push_str(" ON CONFLICT");
        if !unique_by.is_empty() {
            sql.push_str(&format!(" ({})", column_list(unique_by.iter().copied())));
        }
        if update_columns.is_empty() {
            sql.push_str(" DO NOTHING");
        } else {
            let assignments: Vec<String> = update_columns
                .iter()
                .map(|c| {
                    let quoted = quote_identifier(c);
                    format!("{} = excluded.{}", quoted, quoted)
                })
                .collect();
            sql.push_str(" DO UPDATE SET ");
            sql.push_str(&assignments.join(", "));
        }
        self.execute_row(&sql, table, row)
    }

    fn disable_foreign_key_constraints(&mut self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = OFF")
            .map_err(|e| SeedError::Database(format!("Failed to disable foreign keys: {}", e)))
    }

    fn enable_foreign_key_constraints(&mut self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON")
            .map_err(|e| SeedError::Database(format!("Failed to enable foreign keys: {}", e)))
    }

    fn foreign_key_constraints_enabled(&self) -> Result<bool> {
        self.conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get::<_, i64>(0))
            .map(|flag| flag != 0)
            .map_err(|e| SeedError::Database(format!("Failed to read foreign key mode: {}", e)))
    }

    fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )
            .map_err(|e| SeedError::Database(format!("Failed to list tables: {}", e)))?;

        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| SeedError::Database(format!("Failed to list tables: {}", e)))?;
        Ok(names)
    }

    fn for_each_row(
        &self,
        table: &str,
        visit: &mut dyn FnMut(Map<String, Value>) -> Result<()>,
    ) -> Result<()> {
        let sql = format!("SELECT * FROM {}", quote_identifier(table));
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| SeedError::Database(format!("Failed to read {}: {}", table, e)))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt
            .query([])
            .map_err(|e| SeedError::Database(format!("Failed to read {}: {}", table, e)))?;

        while let Some(row) = rows
            .next()
            .map_err(|e| SeedError::Database(format!("Failed to read {}: {}", table, e)))?
        {
            let mut object = Map::new();
            for (i, column) in columns.iter().enumerate() {
                let value = row
                    .get_ref(i)
                    .map_err(|e| SeedError::Database(format!("Failed to read {}: {}", table, e)))?;
                object.insert(column.clone(), json_from_sql(value));
            }
            visit(object)?;
        }
        Ok(())
    }
}

impl ToSql for SeedValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SeedValue::Null => ToSqlOutput::Owned(SqlValue::Null),
            SeedValue::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            SeedValue::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            SeedValue::Float(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            SeedValue::Text(s) | SeedValue::Json(s) => {
                ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes()))
            }
        })
    }
}

fn json_from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Number(i.into()),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn column_list<'a>(columns: impl Iterator<Item = &'a str>) -> String {
    columns.map(quote_identifier).collect::<Vec<_>>().join(", ")
}

fn insert_sql(table: &str, row: &Row) -> String {
    let table = quote_identifier(table);
    if row.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES", table);
    }
    let placeholders: Vec<String> = (1..=row.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        column_list(row.columns()),
        placeholders.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database() -> SqliteDatabase {
        let db = SqliteDatabase::open_in_memory().unwrap();
        db.connection()
            .execute_batch(
                "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, email TEXT);
                 CREATE TABLE posts (id INTEGER PRIMARY KEY, user_id INTEGER REFERENCES users(id), title TEXT);",
            )
            .unwrap();
        db
    }

    fn count(db: &SqliteDatabase, table: &str) -> i64 {
        db.connection()
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_introspection() {
        let db = database();
        assert!(db.has_table("users").unwrap());
        assert!(!db.has_table("ghosts").unwrap());

        let columns = db.column_listing("users").unwrap();
        assert_eq!(columns.iter().collect::<Vec<_>>(), vec!["id", "name", "email"]);
        assert_eq!(db.table_names().unwrap(), vec!["posts", "users"]);
    }

    #[test]
    fn test_insert_and_truncate() {
        let mut db = database();
        let row = Row::new().with("id", SeedValue::Integer(1)).with("name", "Alice");
        db.insert("users", &row).unwrap();
        assert_eq!(count(&db, "users"), 1);

        assert!(db.insert("users", &row).is_err());

        db.truncate("users").unwrap();
        assert_eq!(count(&db, "users"), 0);
    }

    #[test]
    fn test_upsert_without_target_uses_primary_key() {
        let mut db = database();
        let first = Row::new().with("id", SeedValue::Integer(1)).with("name", "Alice");
        db.upsert("users", &first, &[], &["id", "name"]).unwrap();

        let second = Row::new().with("id", SeedValue::Integer(1)).with("name", "Alicia");
        db.upsert("users", &second, &[], &["id", "name"]).unwrap();

        assert_eq!(count(&db, "users"), 1);
        let name: String = db
            .connection()
            .query_row("SELECT name FROM users WHERE id = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(name, "Alicia");
    }

    #[test]
    fn test_upsert_keeps_columns_outside_update_set() {
        let mut db = database();
        let full = Row::new()
            .with("id", SeedValue::Integer(1))
            .with("name", "Alice")
            .with("email", "alice@example.com");
        db.insert("users", &full).unwrap();

        let partial = Row::new().with("id", SeedValue::Integer(1)).with("name", "Al");
        db.upsert("users", &partial, &["id"], &["name"]).unwrap();

        let email: String = db
            .connection()
            .query_row("SELECT email FROM users WHERE id = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(email, "alice@example.com");
    }

    #[test]
    fn test_foreign_key_switch() {
        let mut db = database();
        db.enable_foreign_key_constraints().unwrap();
        assert!(db.foreign_key_constraints_enabled().unwrap());

        let orphan = Row::new()
            .with("id", SeedValue::Integer(1))
            .with("user_id", SeedValue::Integer(99));
        assert!(db.insert("posts", &orphan).is_err());

        db.disable_foreign_key_constraints().unwrap();
        assert!(!db.foreign_key_constraints_enabled().unwrap());
        db.insert("posts", &orphan).unwrap();
    }

    #[test]
    fn test_for_each_row_maps_types() {
        let db = database();
        db.connection()
            .execute_batch("INSERT INTO users (id, name, email) VALUES (7, 'Bob', NULL)")
            .unwrap();

        let mut seen = Vec::new();
        db.for_each_row("users", &mut |row| {
            seen.push(Value::Object(row));
            Ok(())
        })
        .unwrap();

        assert_eq!(seen, vec![serde_json::json!({"id": 7, "name": "Bob", "email": null})]);
    }

    #[test]
    fn test_identifiers_are_quoted() {
        assert_eq!(quote_identifier("order"), "\"order\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }
}
