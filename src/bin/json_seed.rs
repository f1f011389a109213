//! json-seed: Seed database tables from JSON array files
//!
//! Usage:
//!   # Seed every <table>.json under ./database/json
//!   json-seed run --database app.db
//!
//!   # Truncate + insert instead of upsert, keep empty values
//!   json-seed run --database app.db --no-upsert --keep-empty-values
//!
//!   # Write seed files from existing tables (skips files that exist)
//!   json-seed create --database app.db
//!
//!   # Rewrite the seed file of a single table
//!   json-seed overwrite users --database app.db

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use json_seeder::{
    run_seeders, Console, ExportOutcome, SeedExporter, SeederConfig, SqliteDatabase,
    TerminalConsole,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "json-seed")]
#[command(about = "Seed database tables from JSON array files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Seed every <table>.json file of the seed directory
    Run(RunArgs),
    /// Create seed files from existing tables, skipping existing files
    Create(ExportArgs),
    /// Create seed files from existing tables, replacing existing files
    Overwrite(ExportArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// SQLite database file
    #[arg(long, short = 'd')]
    database: PathBuf,

    /// Application root the seed directory is resolved against
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// JSON config file (keys: directory, use-upsert, disable-foreign-key-constraints, ignore-empty-values)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed directory relative to the root (default: /database/json)
    #[arg(long)]
    directory: Option<String>,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Truncate each table and insert instead of upserting
    #[arg(long)]
    no_upsert: bool,

    /// Leave foreign key enforcement on during the run
    #[arg(long)]
    keep_foreign_keys: bool,

    /// Write null and empty-string values (blank date-like fields become null)
    #[arg(long)]
    keep_empty_values: bool,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Only export this table
    #[arg(value_name = "TABLE")]
    table: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let succeeded = match cli.command {
        Command::Run(args) => run(args)?,
        Command::Create(args) => export(args, false)?,
        Command::Overwrite(args) => export(args, true)?,
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}

fn load_config(args: &CommonArgs) -> Result<SeederConfig> {
    let mut config = match &args.config {
        Some(path) => SeederConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SeederConfig::default(),
    };
    if let Some(directory) = &args.directory {
        config.directory = directory.clone();
    }
    Ok(config)
}

fn open_database(args: &CommonArgs) -> Result<SqliteDatabase> {
    SqliteDatabase::open(&args.database)
        .with_context(|| format!("Failed to open database {}", args.database.display()))
}

fn run(args: RunArgs) -> Result<bool> {
    let mut config = load_config(&args.common)?;
    if args.no_upsert {
        config.use_upsert = false;
    }
    if args.keep_foreign_keys {
        config.disable_foreign_key_constraints = false;
    }
    if args.keep_empty_values {
        config.ignore_empty_values = false;
    }

    let mut db = open_database(&args.common)?;
    let mut console = TerminalConsole::new();

    Ok(run_seeders(&mut db, &mut console, config, &args.common.root))
}

fn export(args: ExportArgs, overwrite: bool) -> Result<bool> {
    let config = load_config(&args.common)?;
    let directory = config.seed_directory(&args.common.root);
    let db = open_database(&args.common)?;
    let mut console = TerminalConsole::new();

    let outcomes = SeedExporter::new(&db, &directory, overwrite)
        .export(args.table.as_deref())
        .context("Failed to export seed files")?;

    let mut succeeded = true;
    for outcome in outcomes {
        match outcome {
            ExportOutcome::Written { table, path, rows } => {
                console.info(&format!("{} -> {} ({} rows)", table, path.display(), rows));
            }
            ExportOutcome::Skipped { table, path } => {
                console.warn(&format!(
                    "{} skipped, {} already exists (use `overwrite`)",
                    table,
                    path.display()
                ));
            }
            ExportOutcome::TableNotFound { table } => {
                console.error(&format!("Table {} not found.", table));
                succeeded = false;
            }
        }
    }
    Ok(succeeded)
}
