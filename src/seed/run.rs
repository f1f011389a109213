use crate::config::SeederConfig;
use crate::console::Console;
use crate::db::SeedDatabase;
use crate::error::{Result, SeedError};
use crate::report::{RunStatus, SeederResultTable};
use crate::seed::file::FileSeeder;
use crate::seed::writer::WriteMode;
use crate::types::SeedFile;
use std::path::Path;
use tracing::{info, warn};

/// Drives the file seeder over every seed file of a directory
pub struct Seeder<'a, D: ?Sized, C: ?Sized> {
    db: &'a mut D,
    console: &'a mut C,
    config: SeederConfig,
}

impl<'a, D, C> Seeder<'a, D, C>
where
    D: SeedDatabase + ?Sized,
    C: Console + ?Sized,
{
    pub fn new(db: &'a mut D, console: &'a mut C, config: SeederConfig) -> Self {
        Seeder {
            db,
            console,
            config,
        }
    }

    /// Seed every `.json` file of the configured directory under `root`.
    ///
    /// Only a missing directory or an empty one fails the run; per-file
    /// problems end up in the returned table.
    pub fn run(&mut self, root: impl AsRef<Path>) -> Result<SeederResultTable> {
        let directory = self.config.seed_directory(root);

        if !directory.is_dir() {
            self.console
                .error(&format!("The directory {} was not found.", self.config.directory));
            return Err(SeedError::DirectoryNotFound(directory));
        }

        self.console
            .line(&format!("Database Connection: {}", self.db.database_name()));
        self.console.line(&format!("Directory: {}", self.config.directory));

        let files = match discover_seed_files(&directory) {
            Ok(files) => files,
            Err(e) => {
                self.console.error(&e.to_string());
                return Err(e);
            }
        };
        if files.is_empty() {
            self.console.warn(&format!(
                "The directory {} has no JSON seeds.",
                self.config.directory
            ));
            self.console
                .line("You can create seeds from your database by running `json-seed create`.");
            return Err(SeedError::NoSeedFiles(directory));
        }

        self.console.line(&format!(
            "Found {} JSON files in {}",
            files.len(),
            self.config.directory
        ));

        Ok(self.seed(&files))
    }

    /// Seed the given files in order and render the summary table
    pub fn seed(&mut self, files: &[SeedFile]) -> SeederResultTable {
        let suspend_foreign_keys = self.config.disable_foreign_key_constraints;
        if suspend_foreign_keys {
            if let Err(e) = self.db.disable_foreign_key_constraints() {
                warn!(error = %e, "could not disable foreign key constraints");
                self.console.warn(&e.to_string());
            }
        }

        let mode = WriteMode::from_upsert(self.config.use_upsert);
        let policy = self.config.empty_value_policy();
        let mut table = SeederResultTable::new();
        {
            let mut file_seeder = FileSeeder::new(&mut *self.db, &mut *self.console, mode, policy);
            for file in files {
                table.push(file_seeder.seed(file));
            }
        }

        if suspend_foreign_keys {
            if let Err(e) = self.db.enable_foreign_key_constraints() {
                warn!(error = %e, "could not re-enable foreign key constraints");
                self.console.error(&e.to_string());
            }
        }

        info!(
            files = table.len(),
            succeeded = table.count(RunStatus::Succeeded),
            aborted = table.count(RunStatus::Aborted),
            "seeding run finished"
        );

        self.console.line("");
        self.console.table(&table.header(), &table.rows());
        table
    }
}

/// List the seed files of a directory in the order the filesystem returns them.
///
/// Entries that cannot be read are skipped; only listing the directory
/// itself can fail.
pub fn discover_seed_files(directory: impl AsRef<Path>) -> Result<Vec<SeedFile>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        match SeedFile::from_path(&path) {
            Ok(Some(file)) => files.push(file),
            Ok(None) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable seed file"),
        }
    }
    Ok(files)
}
