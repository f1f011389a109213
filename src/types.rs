use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Suffix every seed file carries; the rest of the filename is the table name.
pub const SEED_FILE_SUFFIX: &str = ".json";

/// A seed file discovered in the seed directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedFile {
    /// File name including the `.json` suffix, e.g. "users.json"
    pub filename: String,

    /// Absolute (or caller-resolved) path to the file
    pub path: PathBuf,

    /// Size in bytes at discovery time, used for progress reporting
    pub size_bytes: u64,

    /// Target table, derived from the filename
    pub table_name: String,
}

impl SeedFile {
    /// Build a seed file from a path on disk.
    ///
    /// Returns `Ok(None)` when the file name does not end in `.json`.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Option<Self>> {
        let path = path.as_ref();
        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => return Ok(None),
        };

        let table_name = match table_name_for(&filename) {
            Some(table) => table.to_string(),
            None => return Ok(None),
        };

        let size_bytes = std::fs::metadata(path)?.len();

        Ok(Some(SeedFile {
            filename,
            path: path.to_path_buf(),
            size_bytes,
            table_name,
        }))
    }
}

/// Strip the `.json` suffix once from the end of a filename
pub fn table_name_for(filename: &str) -> Option<&str> {
    filename.strip_suffix(SEED_FILE_SUFFIX)
}

/// Ordered column names of a target table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableColumnSet {
    columns: Vec<String>,
    lookup: HashSet<String>,
}

impl TableColumnSet {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered = Vec::new();
        let mut lookup = HashSet::new();
        for column in columns {
            let column = column.into();
            if lookup.insert(column.clone()) {
                ordered.push(column);
            }
        }
        TableColumnSet {
            columns: ordered,
            lookup,
        }
    }

    pub fn contains(&self, column: &str) -> bool {
        self.lookup.contains(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A decoded JSON scalar, ready to be bound as a column value.
///
/// Nested arrays and objects are kept as their JSON text.
#[derive(Debug, Clone, PartialEq)]
pub enum SeedValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Json(String),
}

impl SeedValue {
    /// Null or the empty string
    pub fn is_empty(&self) -> bool {
        match self {
            SeedValue::Null => true,
            SeedValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn is_empty_string(&self) -> bool {
        matches!(self, SeedValue::Text(s) if s.is_empty())
    }
}

impl From<Value> for SeedValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => SeedValue::Null,
            Value::Bool(b) => SeedValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    SeedValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    SeedValue::Float(f)
                } else {
                    SeedValue::Text(n.to_string())
                }
            }
            Value::String(s) => SeedValue::Text(s),
            nested @ (Value::Array(_) | Value::Object(_)) => SeedValue::Json(nested.to_string()),
        }
    }
}

impl From<&str> for SeedValue {
    fn from(value: &str) -> Self {
        SeedValue::Text(value.to_string())
    }
}

/// One row headed for a table: column name to value, in table column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, SeedValue)>,
}

impl Row {
    pub fn new() -> Self {
        Row { fields: Vec::new() }
    }

    pub fn push(&mut self, column: impl Into<String>, value: SeedValue) {
        self.fields.push((column.into(), value));
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<SeedValue>) -> Self {
        self.push(column, value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&SeedValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &SeedValue> {
        self.fields.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SeedValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut SeedValue)> {
        self.fields
            .iter_mut()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str, &SeedValue) -> bool,
    {
        self.fields.retain(|(name, value)| keep(name.as_str(), value));
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_name_strips_suffix_once() {
        assert_eq!(table_name_for("users.json"), Some("users"));
        assert_eq!(table_name_for("users.json.json"), Some("users.json"));
        assert_eq!(table_name_for("users.jsonl"), None);
        assert_eq!(table_name_for("users"), None);
    }

    #[test]
    fn test_column_set_keeps_order_and_dedupes() {
        let columns = TableColumnSet::new(["id", "name", "id", "email"]);
        assert_eq!(columns.iter().collect::<Vec<_>>(), vec!["id", "name", "email"]);
        assert!(columns.contains("email"));
        assert!(!columns.contains("age"));
    }

    #[test]
    fn test_seed_value_from_json() {
        assert_eq!(SeedValue::from(json!(null)), SeedValue::Null);
        assert_eq!(SeedValue::from(json!(true)), SeedValue::Bool(true));
        assert_eq!(SeedValue::from(json!(42)), SeedValue::Integer(42));
        assert_eq!(SeedValue::from(json!(1.5)), SeedValue::Float(1.5));
        assert_eq!(SeedValue::from(json!("")), SeedValue::Text(String::new()));
        assert_eq!(
            SeedValue::from(json!({"a": [1, 2]})),
            SeedValue::Json("{\"a\":[1,2]}".to_string())
        );
    }

    #[test]
    fn test_empty_values() {
        assert!(SeedValue::Null.is_empty());
        assert!(SeedValue::Text(String::new()).is_empty());
        assert!(!SeedValue::Text("x".into()).is_empty());
        assert!(!SeedValue::Integer(0).is_empty());
        assert!(!SeedValue::Bool(false).is_empty());
    }
}
