pub mod categories;
pub mod init;
pub mod log;
pub mod run;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tally", about = "Receipt-folder bookkeeping: OCR receipts into a spreadsheet ledger.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up tally: choose the watched receipt folder and save settings.
    Init {
        /// Path to the folder receipts land in
        #[arg(long)]
        folder: Option<String>,
        /// Spreadsheet identifier for the items ledger
        #[arg(long)]
        spreadsheet: Option<String>,
    },
    /// Process every receipt in the watched folder once.
    Run {
        /// Override the watched folder for this run
        #[arg(long)]
        folder: Option<String>,
    },
    /// List the categories a receipt item can be assigned to.
    Categories,
    /// Show recent run-log lines.
    Log {
        /// Number of lines to show
        #[arg(short = 'n', long, default_value_t = 20)]
        lines: usize,
    },
}
