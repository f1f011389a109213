//! Seed file generation from existing tables
//!
//! The reverse of seeding: every table becomes `<table>.json`, a top-level
//! array with one object per row. Rows are written as they are read.

use crate::db::SeedDatabase;
use crate::error::Result;
use crate::types::SEED_FILE_SUFFIX;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written { table: String, path: PathBuf, rows: u64 },
    /// The seed file exists and overwriting is off
    Skipped { table: String, path: PathBuf },
    TableNotFound { table: String },
}

pub struct SeedExporter<'a, D: ?Sized> {
    db: &'a D,
    directory: PathBuf,
    overwrite: bool,
}

impl<'a, D: SeedDatabase + ?Sized> SeedExporter<'a, D> {
    pub fn new(db: &'a D, directory: impl AsRef<Path>, overwrite: bool) -> Self {
        SeedExporter {
            db,
            directory: directory.as_ref().to_path_buf(),
            overwrite,
        }
    }

    /// Export one table, or every table when `table` is `None`
    pub fn export(&self, table: Option<&str>) -> Result<Vec<ExportOutcome>> {
        let tables = match table {
            Some(table) => {
                if !self.db.has_table(table)? {
                    return Ok(vec![ExportOutcome::TableNotFound {
                        table: table.to_string(),
                    }]);
                }
                vec![table.to_string()]
            }
            None => self.db.table_names()?,
        };

        std::fs::create_dir_all(&self.directory)?;
        tables.iter().map(|t| self.export_table(t)).collect()
    }

    fn export_table(&self, table: &str) -> Result<ExportOutcome> {
        let path = self
            .directory
            .join(format!("{}{}", table, SEED_FILE_SUFFIX));

        if path.exists() && !self.overwrite {
            info!(table, path = %path.display(), "seed file exists, skipping");
            return Ok(ExportOutcome::Skipped {
                table: table.to_string(),
                path,
            });
        }

        let mut writer = BufWriter::new(File::create(&path)?);
        writer.write_all(b"[")?;

        let mut rows = 0u64;
        self.db.for_each_row(table, &mut |row| {
            let separator: &[u8] = if rows == 0 { b"\n    " } else { b",\n    " };
            writer.write_all(separator)?;
            serde_json::to_writer(&mut writer, &row)?;
            rows += 1;
            Ok(())
        })?;

        let closing: &[u8] = if rows == 0 { b"]\n" } else { b"\n]\n" };
        writer.write_all(closing)?;
        writer.flush()?;

        info!(table, rows, path = %path.display(), "seed file written");
        Ok(ExportOutcome::Written {
            table: table.to_string(),
            path,
            rows,
        })
    }
}
