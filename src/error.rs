use std::path::PathBuf;
use thiserror::Error;

/// Errors that can end a seeding run or a library call.
///
/// Per-file failures never surface here; they are recorded on the file's
/// [`SeederResult`](crate::report::SeederResult) instead.
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("The directory {} was not found.", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("The directory {} has no JSON seeds.", .0.display())]
    NoSeedFiles(PathBuf),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SeedError>;
