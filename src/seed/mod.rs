//! Streaming seed engine
//!
//! Each file flows through the same pipeline: stream an element, reconcile
//! it against the table's columns, apply the empty-value policy and write
//! it. A failing file is recorded and skipped; the run moves on.

pub mod file;
pub mod normalize;
pub mod reconcile;
pub mod run;
pub mod writer;

pub use file::FileSeeder;
pub use normalize::{is_date_like, normalize};
pub use reconcile::{reconcile, Reconciliation};
pub use run::{discover_seed_files, Seeder};
pub use writer::{write_row, RowOutcome, WriteMode};
