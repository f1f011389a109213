use crate::db::SeedDatabase;
use crate::types::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Plain insert into a freshly truncated table
    Insert,
    /// Insert or update every supplied column on key conflict
    Upsert,
}

impl WriteMode {
    pub fn from_upsert(use_upsert: bool) -> Self {
        if use_upsert {
            WriteMode::Upsert
        } else {
            WriteMode::Insert
        }
    }
}

/// What happened to a single row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Written,
    /// Nothing was left to write after normalization
    Skipped,
    Failed(String),
}

/// Write one normalized row. Failures are returned, never raised.
pub fn write_row<D>(db: &mut D, table: &str, row: &Row, mode: WriteMode) -> RowOutcome
where
    D: SeedDatabase + ?Sized,
{
    if row.is_empty() {
        return RowOutcome::Skipped;
    }

    let result = match mode {
        WriteMode::Upsert => {
            let update_columns: Vec<&str> = row.columns().collect();
            db.upsert(table, row, &[], &update_columns)
        }
        WriteMode::Insert => db.insert(table, row),
    };

    match result {
        Ok(()) => RowOutcome::Written,
        Err(e) => RowOutcome::Failed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteDatabase;
    use crate::types::SeedValue;

    fn database() -> SqliteDatabase {
        let db = SqliteDatabase::open_in_memory().unwrap();
        db.connection()
            .execute_batch(
                "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL, stock INTEGER DEFAULT 5)",
            )
            .unwrap();
        db
    }

    fn item(id: i64, name: &str) -> Row {
        Row::new().with("id", SeedValue::Integer(id)).with("name", name)
    }

    #[test]
    fn test_insert_then_duplicate_fails() {
        let mut db = database();
        assert_eq!(write_row(&mut db, "items", &item(1, "a"), WriteMode::Insert), RowOutcome::Written);

        match write_row(&mut db, "items", &item(1, "b"), WriteMode::Insert) {
            RowOutcome::Failed(message) => assert!(message.contains("items")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_upsert_updates_in_place() {
        let mut db = database();
        write_row(&mut db, "items", &item(1, "a"), WriteMode::Upsert);
        assert_eq!(write_row(&mut db, "items", &item(1, "b"), WriteMode::Upsert), RowOutcome::Written);

        let (count, name): (i64, String) = db
            .connection()
            .query_row("SELECT COUNT(*), MAX(name) FROM items", [], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(name, "b");
    }

    #[test]
    fn test_upsert_leaves_absent_columns_alone() {
        let mut db = database();
        let row = item(1, "a").with("stock", SeedValue::Integer(42));
        write_row(&mut db, "items", &row, WriteMode::Upsert);
        write_row(&mut db, "items", &item(1, "a"), WriteMode::Upsert);

        let stock: i64 = db
            .connection()
            .query_row("SELECT stock FROM items WHERE id = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(stock, 42);
    }

    #[test]
    fn test_constraint_violation_is_failure() {
        let mut db = database();
        let row = Row::new().with("id", SeedValue::Integer(1)).with("name", SeedValue::Null);
        assert!(matches!(
            write_row(&mut db, "items", &row, WriteMode::Upsert),
            RowOutcome::Failed(_)
        ));
    }

    #[test]
    fn test_empty_row_is_skipped() {
        let mut db = database();
        assert_eq!(write_row(&mut db, "items", &Row::new(), WriteMode::Insert), RowOutcome::Skipped);
    }
}
