use crate::config::EmptyValuePolicy;
use crate::console::Console;
use crate::db::SeedDatabase;
use crate::report::{FailureKind, FieldDrift, SeederResult, TableStatus};
use crate::seed::normalize::normalize;
use crate::seed::reconcile::reconcile;
use crate::seed::writer::{write_row, RowOutcome, WriteMode};
use crate::stream::{Element, JsonArrayStream};
use crate::types::{SeedFile, TableColumnSet};
use std::io::BufRead;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Steps of the progress indicator per file
const PROGRESS_STEPS: u64 = 100;

/// Seeds one file into its table, turning every failure into result state
pub struct FileSeeder<'a, D: ?Sized, C: ?Sized> {
    db: &'a mut D,
    console: &'a mut C,
    mode: WriteMode,
    policy: EmptyValuePolicy,
}

impl<'a, D, C> FileSeeder<'a, D, C>
where
    D: SeedDatabase + ?Sized,
    C: Console + ?Sized,
{
    pub fn new(db: &'a mut D, console: &'a mut C, mode: WriteMode, policy: EmptyValuePolicy) -> Self {
        FileSeeder {
            db,
            console,
            mode,
            policy,
        }
    }

    pub fn seed(&mut self, file: &SeedFile) -> SeederResult {
        let started = Instant::now();
        let mut result = SeederResult::new(&file.filename, &file.table_name);
        self.console.line(&format!("Seeding {}", file.filename));

        if let Some(columns) = self.prepare_table(&file.table_name, &mut result) {
            match JsonArrayStream::from_file(&file.path) {
                Ok(mut stream) => {
                    self.console.progress_start(PROGRESS_STEPS);
                    let completed = self.stream_rows(file, &mut stream, &columns, &mut result);
                    self.console.progress_finish();

                    if completed {
                        result.succeed();
                        self.output_info(&format!(
                            "Seeding successful! [in {:.3}sec]",
                            started.elapsed().as_secs_f64()
                        ));
                    }
                }
                Err(e) => {
                    warn!(file = %file.filename, error = %e, "seed file could not be opened");
                    self.abort(&mut result, FailureKind::FileEmpty);
                }
            }
        }

        result.elapsed = Some(started.elapsed());
        info!(
            file = %result.filename,
            status = %result.run_status,
            rows = result.rows_written,
            "file seeded"
        );
        result
    }

    /// Check the table, fetch its columns and truncate it when inserting.
    fn prepare_table(&mut self, table: &str, result: &mut SeederResult) -> Option<TableColumnSet> {
        match self.db.has_table(table) {
            Ok(true) => {}
            Ok(false) => {
                result.table_status = Some(TableStatus::NotFound);
                self.abort(result, FailureKind::TableNotFound);
                return None;
            }
            Err(e) => {
                warn!(table, error = %e, "table lookup failed");
                self.abort(result, FailureKind::Exception);
                return None;
            }
        }
        result.table_status = Some(TableStatus::Exists);

        let columns = match self.db.column_listing(table) {
            Ok(columns) => columns,
            Err(e) => {
                warn!(table, error = %e, "column listing failed");
                self.abort(result, FailureKind::Exception);
                return None;
            }
        };

        if self.mode == WriteMode::Insert {
            self.console.warn(&format!("Truncate table \"{}\".", table));
            if let Err(e) = self.db.truncate(table) {
                warn!(table, error = %e, "truncate failed");
                self.abort(result, FailureKind::Exception);
                return None;
            }
        }

        Some(columns)
    }

    /// Returns false when the file was aborted part-way
    fn stream_rows<R: BufRead>(
        &mut self,
        file: &SeedFile,
        stream: &mut JsonArrayStream<R>,
        columns: &TableColumnSet,
        result: &mut SeederResult,
    ) -> bool {
        let table = file.table_name.as_str();

        while let Some(item) = stream.next() {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    warn!(file = %file.filename, error = %e, "read failed mid-stream");
                    self.abort(result, FailureKind::FileEmpty);
                    return false;
                }
            };

            self.console
                .progress_set(progress(stream.offset(), file.size_bytes));

            let record = match item.element {
                Element::Object(record) => record,
                Element::Invalid(e) => {
                    warn!(file = %file.filename, error = %e, "invalid JSON element");
                    self.abort(result, FailureKind::SyntaxInvalid);
                    return false;
                }
            };

            if record.is_empty() {
                continue;
            }

            let reconciliation = reconcile(record, columns);
            self.record_drift(result, FieldDrift::Missing, &reconciliation.missing);
            self.record_drift(result, FieldDrift::Unknown, &reconciliation.unknown);

            let row = normalize(reconciliation.payload, self.policy);
            match write_row(&mut *self.db, table, &row, self.mode) {
                RowOutcome::Written => result.add_row(),
                RowOutcome::Skipped => debug!(table, key = item.key, "no values left to write"),
                RowOutcome::Failed(message) => {
                    warn!(table, key = item.key, error = %message, "row write failed");
                    self.abort(result, FailureKind::Exception);
                    return false;
                }
            }
        }

        self.console
            .progress_set(progress(stream.offset(), file.size_bytes));
        true
    }

    /// Warn about field names this file has not reported yet
    fn record_drift(&mut self, result: &mut SeederResult, drift: FieldDrift, names: &[String]) {
        let added = result.record_drift(drift, names);
        if !added.is_empty() {
            self.output_warning(&drift.note(&added));
        }
    }

    fn abort(&mut self, result: &mut SeederResult, kind: FailureKind) {
        self.output_error(kind.label());
        result.abort(kind);
    }

    fn output_info(&mut self, message: &str) {
        self.console.info(&format!(" > {}", message));
    }

    fn output_warning(&mut self, message: &str) {
        self.console.warn(&format!(" > {}", message));
    }

    fn output_error(&mut self, message: &str) {
        self.console.error(&format!(" > {}", message));
    }
}

/// Progress step for `offset` bytes out of `size`
fn progress(offset: u64, size: u64) -> u64 {
    if size == 0 {
        return PROGRESS_STEPS;
    }
    (offset.saturating_mul(PROGRESS_STEPS) / size).min(PROGRESS_STEPS)
}
