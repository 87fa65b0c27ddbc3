//! volindex command-line interface.
//!
//! # Responsibility
//! - Parse arguments, initialize logging, open the database.
//! - Dispatch to core services and print their results.
//!
//! # Invariants
//! - Logging configuration is owned here; core components only emit.
//! - Every core failure surfaces as a non-zero exit with a printed error.

use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use volindex_core::db::open_db;
use volindex_core::{
    default_log_level, init_logging, ImportService, PrintableIndex, SqliteIndexRepository, Volume,
    VolumeService,
};

/// Maintain and print a periodical's topical index.
#[derive(Debug, Parser)]
#[command(name = "volindex", version, about)]
struct Cli {
    /// Path to the SQLite database file (defaults to the platform data dir).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import index entries from a CSV file.
    ///
    /// The file needs topic (or legacy "phrase"), item, page, year, and
    /// month columns; UTF-8 and Windows-1252 encodings are accepted.
    Import {
        /// Path to the CSV file.
        file: PathBuf,

        /// Print the import report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print a volume's index formatted for print layout.
    Printable {
        /// Volume ID; often matches the year of the volume's start date.
        volume_id: i64,
    },

    /// Register and inspect volumes.
    #[command(subcommand)]
    Volume(VolumeCommand),
}

#[derive(Debug, Subcommand)]
enum VolumeCommand {
    /// Register a volume.
    Add {
        /// Operator-chosen volume id.
        #[arg(long)]
        id: i64,

        /// First day covered (YYYY-MM-DD).
        #[arg(long)]
        begin: NaiveDate,

        /// Last day covered, inclusive (YYYY-MM-DD).
        #[arg(long)]
        end: NaiveDate,

        /// Total printed page count.
        #[arg(long)]
        pages: i64,
    },

    /// List registered volumes.
    List,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = default_data_dir()?;
    let level = resolve_log_level(cli.log_level.as_deref());
    let log_dir = data_dir.join("logs");
    init_logging(level, &log_dir.to_string_lossy()).map_err(|err| anyhow!(err))?;

    let db_path = cli.db.unwrap_or_else(|| data_dir.join("volindex.db"));
    let mut conn = open_db(&db_path)
        .with_context(|| format!("failed to open database at `{}`", db_path.display()))?;

    match cli.command {
        Command::Import { file, json } => {
            let report = ImportService::new(&mut conn).import_csv(&file)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "imported {} rows from `{}` ({})",
                    report.rows,
                    file.display(),
                    report.encoding
                );
                println!(
                    "{} new topics, {} new items, {} new item pages",
                    report.new_topics, report.new_items, report.new_item_pages
                );
            }
        }
        Command::Printable { volume_id } => {
            let repo = SqliteIndexRepository::try_new(&conn)?;
            let index = PrintableIndex::load(&repo, volume_id)?;
            print!("{}", index.render());
        }
        Command::Volume(volume_command) => match volume_command {
            VolumeCommand::Add {
                id,
                begin,
                end,
                pages,
            } => {
                let repo = SqliteIndexRepository::try_new(&conn)?;
                let mut service = VolumeService::new(repo);
                let volume = service.add_volume(Volume::new(id, begin, end, pages))?;
                println!(
                    "registered volume {} ({} to {}, {} pages)",
                    volume.id, volume.date_begin, volume.date_end, volume.pages
                );
            }
            VolumeCommand::List => {
                let repo = SqliteIndexRepository::try_new(&conn)?;
                let service = VolumeService::new(repo);
                for volume in service.list_volumes()? {
                    println!(
                        "{}\t{} to {}\t{} pages",
                        volume.id, volume.date_begin, volume.date_end, volume.pages
                    );
                }
            }
        },
    }

    Ok(())
}

fn resolve_log_level(requested: Option<&str>) -> &str {
    requested.unwrap_or(default_log_level())
}

fn default_data_dir() -> anyhow::Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("volindex"))
        .ok_or_else(|| anyhow!("could not determine the platform data directory"))
}
