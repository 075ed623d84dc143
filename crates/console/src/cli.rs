use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Submit account spreadsheets for batch processing", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload a spreadsheet, start a job and follow it until it ends.
    /// Ctrl-C asks the backend to cancel.
    Run {
        /// .xlsx or .xls file with one account per row
        file: PathBuf,
        /// parallel workers; anything but a positive integer means 2
        #[arg(long, default_value = "2")]
        workers: String,
        /// save the non-empty result files when the job completes
        #[arg(long)]
        download: bool,
    },
    /// Show or toggle the display theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum ThemeAction {
    /// Print the saved theme
    Show,
    /// Switch between light and dark
    Toggle,
}
