pub mod accounts;
pub mod files;
pub mod import;
pub mod init;
pub mod load;
pub mod report;
pub mod show;
pub mod status;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::db::get_connection;
use crate::error::{OborotError, Result};
use crate::settings::db_path;

/// Open the configured database, refusing to create an empty one.
pub(crate) fn open_db() -> Result<Connection> {
    let path = db_path();
    if !path.exists() {
        return Err(OborotError::Settings(format!(
            "No database found at {}\nRun `oborot init` to create one.",
            path.display()
        )));
    }
    get_connection(&path)
}

#[derive(Parser)]
#[command(name = "oborot", about = "Turnover balance sheet ingestion and class-grouped reports.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for oborot data (default: ~/Documents/oborot)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Switch to an existing oborot data directory.
    Load {
        /// Path to data directory containing oborot.db
        path: String,
    },
    /// Show current database and summary statistics.
    Status,
    /// Ingest a balance sheet (XLSX, XLS, ODS or CSV; CSV may be UTF-8 or Windows-1251).
    Import {
        /// Path to the spreadsheet
        file: String,
    },
    /// List uploaded files.
    Files,
    /// Class-grouped report for an uploaded file.
    Report {
        /// Uploaded file ID (shown in `oborot files`)
        file_id: i64,
        /// Print `{"data": [...]}` instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show the raw records behind an uploaded file.
    Show {
        /// Uploaded file ID (shown in `oborot files`)
        file_id: i64,
    },
    /// List known accounts in chart order.
    Accounts,
    /// Print a shell completion script.
    Completions {
        shell: clap_complete::Shell,
    },
}
