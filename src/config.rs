use crate::error::{Result, SeedError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a seeding run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SeederConfig {
    /// Seed directory, relative to the application root
    pub directory: String,

    /// Insert-or-update instead of truncate + insert
    pub use_upsert: bool,

    /// Suspend foreign-key enforcement for the whole run
    pub disable_foreign_key_constraints: bool,

    /// Drop null and empty-string values before writing
    pub ignore_empty_values: bool,
}

impl Default for SeederConfig {
    fn default() -> Self {
        SeederConfig {
            directory: String::from("/database/json"),
            use_upsert: true,
            disable_foreign_key_constraints: true,
            ignore_empty_values: true,
        }
    }
}

impl SeederConfig {
    /// Load a config from a JSON file. Missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SeedError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| SeedError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Resolve the seed directory against an application root.
    ///
    /// A leading `/` is treated as root-relative, so "/database/json"
    /// becomes `<root>/database/json`.
    pub fn seed_directory(&self, root: impl AsRef<Path>) -> PathBuf {
        let relative = self.directory.trim_start_matches(|c: char| c == '/' || c == '\\');
        if relative.is_empty() {
            root.as_ref().to_path_buf()
        } else {
            root.as_ref().join(relative)
        }
    }

    pub fn empty_value_policy(&self) -> EmptyValuePolicy {
        if self.ignore_empty_values {
            EmptyValuePolicy::IgnoreEmpty
        } else {
            EmptyValuePolicy::NullBlankDateLike
        }
    }
}

/// How empty values in a row are treated before writing. Fixed for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyValuePolicy {
    /// Drop null and "" values so column defaults survive an upsert
    IgnoreEmpty,
    /// Keep values, but turn "" into null for date-like columns
    NullBlankDateLike,
}
