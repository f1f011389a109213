use crate::types::{Row, SeedValue, TableColumnSet};
use serde_json::{Map, Value};

/// A record matched against a table's columns
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Fields that exist as columns, in table column order
    pub payload: Row,

    /// Columns the record has no field for
    pub missing: Vec<String>,

    /// Record fields the table has no column for; dropped from the payload
    pub unknown: Vec<String>,
}

/// Intersect a decoded record with the table's columns.
///
/// Values are carried over as decoded; only the key set changes.
pub fn reconcile(mut record: Map<String, Value>, columns: &TableColumnSet) -> Reconciliation {
    let mut payload = Row::new();
    let mut missing = Vec::new();

    for column in columns.iter() {
        match record.remove(column) {
            Some(value) => payload.push(column, SeedValue::from(value)),
            None => missing.push(column.to_string()),
        }
    }

    let unknown = record.into_iter().map(|(key, _)| key).collect();

    Reconciliation {
        payload,
        missing,
        unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_exact_match() {
        let columns = TableColumnSet::new(["id", "name"]);
        let result = reconcile(object(json!({"name": "Alice", "id": 1})), &columns);

        assert_eq!(result.payload.columns().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(result.payload.get("id"), Some(&SeedValue::Integer(1)));
        assert!(result.missing.is_empty());
        assert!(result.unknown.is_empty());
    }

    #[test]
    fn test_set_relations() {
        let columns = TableColumnSet::new(["id", "name", "email", "created_at"]);
        let record = object(json!({"id": 1, "name": "Alice", "age": 30, "nickname": null}));
        let keys: BTreeSet<String> = record.keys().cloned().collect();
        let column_set: BTreeSet<String> = columns.iter().map(String::from).collect();

        let result = reconcile(record, &columns);

        let payload: BTreeSet<String> = result.payload.columns().map(String::from).collect();
        let missing: BTreeSet<String> = result.missing.iter().cloned().collect();
        let unknown: BTreeSet<String> = result.unknown.iter().cloned().collect();

        assert_eq!(payload, &keys & &column_set);
        assert_eq!(missing, &column_set - &keys);
        assert_eq!(unknown, &keys - &column_set);
    }

    #[test]
    fn test_drift_lists_keep_column_and_record_order() {
        let columns = TableColumnSet::new(["id", "name", "email"]);
        let result = reconcile(object(json!({"id": 1, "age": 30, "zip": "x"})), &columns);

        assert_eq!(result.missing, vec!["name", "email"]);
        assert_eq!(result.unknown, vec!["age", "zip"]);
    }

    fn field(key: &u8) -> String {
        format!("f{}", key % 24)
    }

    quickcheck! {
        fn prop_reconcile_partitions_keys(record_keys: Vec<u8>, column_keys: Vec<u8>) -> bool {
            let record: Map<String, Value> = record_keys
                .iter()
                .map(|k| (field(k), Value::from(*k)))
                .collect();
            let columns = TableColumnSet::new(column_keys.iter().map(field));

            let keys: BTreeSet<String> = record.keys().cloned().collect();
            let column_set: BTreeSet<String> = columns.iter().map(String::from).collect();

            let result = reconcile(record, &columns);
            let payload: BTreeSet<String> = result.payload.columns().map(String::from).collect();
            let missing: BTreeSet<String> = result.missing.iter().cloned().collect();
            let unknown: BTreeSet<String> = result.unknown.iter().cloned().collect();

            payload == &keys & &column_set
                && missing == &column_set - &keys
                && unknown == &keys - &column_set
                && result.payload.len() == payload.len()
        }
    }

    #[test]
    fn test_values_pass_through_unmodified() {
        let columns = TableColumnSet::new(["a", "b", "c"]);
        let result = reconcile(object(json!({"a": "", "b": null, "c": 2.5})), &columns);

        assert_eq!(result.payload.get("a"), Some(&SeedValue::Text(String::new())));
        assert_eq!(result.payload.get("b"), Some(&SeedValue::Null));
        assert_eq!(result.payload.get("c"), Some(&SeedValue::Float(2.5)));
    }
}
