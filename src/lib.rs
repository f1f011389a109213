//! # json-seeder - Streaming JSON database seeder
//!
//! Seeds relational tables from directories of JSON array files, one file
//! per table (`users.json` seeds `users`), without loading whole files
//! into memory.
//!
//! ## Modules
//!
//! - **stream**: Lazy reader for top-level JSON arrays
//! - **seed**: Column reconciliation, empty-value handling, row writes and
//!   the per-file / per-run drivers
//! - **report**: Per-file results and the summary table
//! - **export**: Generate seed files from existing tables
//! - **db**: Database seam, with a SQLite implementation
//!
//! ## Quick Start
//!
//! ```no_run
//! use json_seeder::{Seeder, SeederConfig, SqliteDatabase, TerminalConsole};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut db = SqliteDatabase::open("app.db")?;
//! let mut console = TerminalConsole::new();
//!
//! // Seeds every <table>.json under ./database/json
//! let report = Seeder::new(&mut db, &mut console, SeederConfig::default()).run(".")?;
//! println!("{} files processed", report.len());
//! # Ok(())
//! # }
//! ```

use std::path::Path;

pub mod config;
pub mod console;
pub mod db;
pub mod error;
pub mod export;
pub mod report;
pub mod seed;
pub mod stream;
pub mod types;

// Re-export commonly used types for convenience
pub use config::{EmptyValuePolicy, SeederConfig};
pub use console::{CapturedConsole, Console, TerminalConsole};
pub use db::{SeedDatabase, SqliteDatabase};
pub use error::{Result, SeedError};
pub use export::{ExportOutcome, SeedExporter};
pub use report::{FailureKind, FieldDrift, RunStatus, SeederResult, SeederResultTable, TableStatus};
pub use seed::{FileSeeder, Seeder};
pub use stream::JsonArrayStream;
pub use types::{Row, SeedFile, SeedValue, TableColumnSet};

/// Main entry point: seed every file under `root` and report whether the run could start.
///
/// Returns false only when the seed directory is missing or holds no
/// `.json` files. Individual file failures are in the printed report.
pub fn run_seeders<D, C>(db: &mut D, console: &mut C, config: SeederConfig, root: impl AsRef<Path>) -> bool
where
    D: SeedDatabase + ?Sized,
    C: Console + ?Sized,
{
    Seeder::new(db, console, config).run(root).is_ok()
}
