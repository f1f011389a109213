//! Per-file outcomes and the final summary table

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;
use tabled::builder::Builder;
use tabled::settings::Style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Exists,
    NotFound,
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableStatus::Exists => write!(f, "exists"),
            TableStatus::NotFound => write!(f, "not found"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Pending,
    Succeeded,
    Aborted,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Pending => write!(f, "pending"),
            RunStatus::Succeeded => write!(f, "succeeded"),
            RunStatus::Aborted => write!(f, "aborted"),
        }
    }
}

/// Why a single file was aborted. None of these stop the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    TableNotFound,
    FileEmpty,
    SyntaxInvalid,
    Exception,
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::TableNotFound => "Table not found",
            FailureKind::FileEmpty => "File empty or unreadable",
            FailureKind::SyntaxInvalid => "Invalid JSON syntax",
            FailureKind::Exception => "Exception while writing",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Record fields that did not line up with the table's columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDrift {
    /// Columns a record has no field for
    Missing,
    /// Record fields the table has no column for
    Unknown,
}

impl FieldDrift {
    pub fn note(&self, names: &[String]) -> String {
        let label = match self {
            FieldDrift::Missing => "Fields missing",
            FieldDrift::Unknown => "Fields unknown",
        };
        format!("{}: {}", label, names.join(","))
    }
}

/// Field names in first-seen order, each kept once
#[derive(Debug, Clone, Default, PartialEq)]
struct FieldNames {
    ordered: Vec<String>,
    seen: HashSet<String>,
}

impl FieldNames {
    /// Add `names`, returning the ones not seen before
    fn extend(&mut self, names: &[String]) -> Vec<String> {
        let mut added = Vec::new();
        for name in names {
            if !self.seen.contains(name) {
                self.seen.insert(name.clone());
                self.ordered.push(name.clone());
                added.push(name.clone());
            }
        }
        added
    }
}

/// Outcome of seeding one file
#[derive(Debug, Clone, PartialEq)]
pub struct SeederResult {
    pub filename: String,
    pub table_name: String,
    pub table_status: Option<TableStatus>,
    pub run_status: RunStatus,
    pub failure: Option<FailureKind>,
    pub rows_written: u64,
    pub elapsed: Option<Duration>,
    missing_fields: FieldNames,
    unknown_fields: FieldNames,
}

impl SeederResult {
    pub fn new(filename: impl Into<String>, table_name: impl Into<String>) -> Self {
        SeederResult {
            filename: filename.into(),
            table_name: table_name.into(),
            table_status: None,
            run_status: RunStatus::Pending,
            failure: None,
            rows_written: 0,
            elapsed: None,
            missing_fields: FieldNames::default(),
            unknown_fields: FieldNames::default(),
        }
    }

    /// Count a written row; the file stays succeeded unless a later row fails
    pub fn add_row(&mut self) {
        self.rows_written += 1;
        self.run_status = RunStatus::Succeeded;
    }

    pub fn succeed(&mut self) {
        self.run_status = RunStatus::Succeeded;
    }

    pub fn abort(&mut self, kind: FailureKind) {
        self.failure = Some(kind);
        self.run_status = RunStatus::Aborted;
    }

    /// Merge one record's drift into the file-wide union of field names.
    /// Returns the names this file had not reported yet.
    pub fn record_drift(&mut self, drift: FieldDrift, names: &[String]) -> Vec<String> {
        match drift {
            FieldDrift::Missing => self.missing_fields.extend(names),
            FieldDrift::Unknown => self.unknown_fields.extend(names),
        }
    }

    pub fn missing_fields(&self) -> &[String] {
        &self.missing_fields.ordered
    }

    pub fn unknown_fields(&self) -> &[String] {
        &self.unknown_fields.ordered
    }

    /// At most one note per kind of drift, covering the whole file
    pub fn notes(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if !self.missing_fields.ordered.is_empty() {
            notes.push(FieldDrift::Missing.note(self.missing_fields()));
        }
        if !self.unknown_fields.ordered.is_empty() {
            notes.push(FieldDrift::Unknown.note(self.unknown_fields()));
        }
        notes
    }

    pub fn is_aborted(&self) -> bool {
        self.run_status == RunStatus::Aborted
    }

    /// Failure label followed by any notes, or `None` when there is nothing to report
    pub fn error_message(&self) -> Option<String> {
        let parts: Vec<String> = self
            .failure
            .iter()
            .map(|kind| kind.label().to_string())
            .chain(self.notes())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" | "))
        }
    }
}

/// All per-file results of a run, in processing order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeederResultTable {
    results: Vec<SeederResult>,
}

impl SeederResultTable {
    pub const HEADER: [&'static str; 6] = [
        "Filename",
        "Table",
        "Table status",
        "Run status",
        "Rows",
        "Error",
    ];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: SeederResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[SeederResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn header(&self) -> Vec<String> {
        Self::HEADER.iter().map(|h| h.to_string()).collect()
    }

    /// Report cells, one row per file
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.results
            .iter()
            .map(|r| {
                vec![
                    r.filename.clone(),
                    r.table_name.clone(),
                    r.table_status.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
                    r.run_status.to_string(),
                    r.rows_written.to_string(),
                    r.error_message().unwrap_or_default(),
                ]
            })
            .collect()
    }

    pub fn count(&self, status: RunStatus) -> usize {
        self.results.iter().filter(|r| r.run_status == status).count()
    }

    pub fn render(&self) -> String {
        render_table(&self.header(), &self.rows())
    }
}

impl fmt::Display for SeederResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Render an ASCII box table
pub fn render_table(header: &[String], rows: &[Vec<String>]) -> String {
    let mut builder = Builder::default();
    builder.push_record(header.iter().cloned());
    for row in rows {
        builder.push_record(row.iter().cloned());
    }

    let mut table = builder.build();
    table.with(Style::ascii());
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_result_is_pending() {
        let result = SeederResult::new("users.json", "users");
        assert_eq!(result.run_status, RunStatus::Pending);
        assert_eq!(result.table_status, None);
        assert_eq!(result.rows_written, 0);
        assert_eq!(result.error_message(), None);
    }

    #[test]
    fn test_abort_after_rows_keeps_count() {
        let mut result = SeederResult::new("users.json", "users");
        result.add_row();
        result.add_row();
        assert_eq!(result.run_status, RunStatus::Succeeded);

        result.abort(FailureKind::Exception);
        assert!(result.is_aborted());
        assert_eq!(result.rows_written, 2);
        assert_eq!(result.error_message().unwrap(), "Exception while writing");
    }

    #[test]
    fn test_drift_notes_follow_failure() {
        let mut result = SeederResult::new("users.json", "users");
        result.record_drift(FieldDrift::Unknown, &["age".to_string()]);
        result.record_drift(FieldDrift::Missing, &["email".to_string()]);
        result.abort(FailureKind::SyntaxInvalid);

        assert_eq!(
            result.error_message().unwrap(),
            "Invalid JSON syntax | Fields missing: email | Fields unknown: age"
        );
    }

    #[test]
    fn test_drift_is_a_union_of_field_names() {
        let mut result = SeederResult::new("users.json", "users");
        let names = |list: &[&str]| list.iter().map(|n| n.to_string()).collect::<Vec<_>>();

        assert_eq!(
            result.record_drift(FieldDrift::Missing, &names(&["email", "phone"])),
            names(&["email", "phone"])
        );
        assert_eq!(
            result.record_drift(FieldDrift::Missing, &names(&["phone", "zip"])),
            names(&["zip"])
        );
        assert!(result
            .record_drift(FieldDrift::Missing, &names(&["email"]))
            .is_empty());

        assert_eq!(result.missing_fields(), names(&["email", "phone", "zip"]).as_slice());
        assert_eq!(result.notes(), vec!["Fields missing: email,phone,zip".to_string()]);
    }

    #[test]
    fn test_sparse_records_keep_error_bounded() {
        let mut result = SeederResult::new("users.json", "users");
        let columns: Vec<String> = (0..10).map(|i| format!("c{}", i)).collect();

        // every subset of ten optional columns
        for mask in 0u32..1024 {
            let missing: Vec<String> = columns
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, c)| c.clone())
                .collect();
            result.record_drift(FieldDrift::Missing, &missing);
        }

        assert_eq!(result.notes().len(), 1);
        assert_eq!(
            result.error_message().unwrap(),
            "Fields missing: c0,c1,c2,c3,c4,c5,c6,c7,c8,c9"
        );
    }

    #[test]
    fn test_table_rows_in_insertion_order() {
        let mut table = SeederResultTable::new();

        let mut users = SeederResult::new("users.json", "users");
        users.table_status = Some(TableStatus::Exists);
        users.add_row();
        table.push(users);

        let mut ghosts = SeederResult::new("ghosts.json", "ghosts");
        ghosts.table_status = Some(TableStatus::NotFound);
        ghosts.abort(FailureKind::TableNotFound);
        table.push(ghosts);

        let rows = table.rows();
        assert_eq!(rows[0], vec!["users.json", "users", "exists", "succeeded", "1", ""]);
        assert_eq!(
            rows[1],
            vec!["ghosts.json", "ghosts", "not found", "aborted", "0", "Table not found"]
        );
        assert_eq!(table.count(RunStatus::Aborted), 1);
    }

    #[test]
    fn test_render_aligns_columns() {
        let header = vec!["Name".to_string(), "N".to_string()];
        let rows = vec![vec!["a".to_string(), "100".to_string()]];

        let rendered = render_table(&header, &rows);
        let lines: Vec<&str> = rendered.lines().collect();

        assert!(lines.contains(&"| Name | N   |"));
        assert!(lines.contains(&"| a    | 100 |"));
        assert!(lines.iter().all(|l| l.chars().count() == lines[0].chars().count()));
        assert_eq!(lines.first(), Some(&"+------+-----+"));
        assert_eq!(lines.last(), Some(&"+------+-----+"));
    }

    #[test]
    fn test_display_renders_report() {
        let mut table = SeederResultTable::new();
        let mut result = SeederResult::new("users.json", "users");
        result.table_status = Some(TableStatus::Exists);
        result.add_row();
        table.push(result);

        let rendered = table.to_string();
        assert!(rendered.contains("| Filename "));
        assert!(rendered.contains("| users.json "));
        assert!(rendered.contains("| succeeded "));
    }
}
