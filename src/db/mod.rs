//! Database access used by the seeder and the exporter
//!
//! The seeder only needs a handful of primitives: schema introspection,
//! row writes, truncation and the foreign-key enforcement switch.

pub mod sqlite;

pub use sqlite::SqliteDatabase;

use crate::error::Result;
use crate::types::{Row, TableColumnSet};
use serde_json::{Map, Value};

pub trait SeedDatabase {
    /// Human-readable name of the connected database
    fn database_name(&self) -> String;

    fn has_table(&self, table: &str) -> Result<bool>;

    /// Column names of `table`, in declaration order
    fn column_listing(&self, table: &str) -> Result<TableColumnSet>;

    /// Remove every row from `table`
    fn truncate(&mut self, table: &str) -> Result<()>;

    fn insert(&mut self, table: &str, row: &Row) -> Result<()>;

    /// Insert `row`, or update `update_columns` of the conflicting row.
    ///
    /// An empty `unique_by` leaves conflict detection to the table's own
    /// primary key and unique constraints.
    fn upsert(
        &mut self,
        table: &str,
        row: &Row,
        unique_by: &[&str],
        update_columns: &[&str],
    ) -> Result<()>;

    fn disable_foreign_key_constraints(&mut self) -> Result<()>;

    fn enable_foreign_key_constraints(&mut self) -> Result<()>;

    fn foreign_key_constraints_enabled(&self) -> Result<bool>;

    /// User tables, sorted by name
    fn table_names(&self) -> Result<Vec<String>>;

    /// Visit every row of `table` as a JSON object, without collecting them
    fn for_each_row(
        &self,
        table: &str,
        visit: &mut dyn FnMut(Map<String, Value>) -> Result<()>,
    ) -> Result<()>;
}
