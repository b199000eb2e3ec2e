//! Command-line interface definitions for Tinted News.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! The binary exposes one subcommand per flow: `merge` for the ingestion
//! pipeline, `serve` for the personalization API, and `classify` for the
//! document organizer.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command-line arguments for the Tinted News application.
///
/// # Examples
///
/// ```sh
/// # Merge scraper dumps, earliest file wins on duplicates
/// tinted_news merge espn_data.json ndtv_data.json techcrunch_data.json
///
/// # Serve the personalization API over a merged collection
/// tinted_news serve --collection all_merged.json --addr 127.0.0.1:8080
///
/// # Organize documents into category folders
/// tinted_news classify notes.md q4_report.txt --output-dir organized_docs
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML configuration file
    #[arg(short, long, env = "TINTED_NEWS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge per-source article dumps into one validated, deduplicated collection
    Merge {
        /// Input JSON files, processed in the order given (first seen wins)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Primary output path for the merged collection
        #[arg(short, long, default_value = "all_merged.json")]
        output: PathBuf,

        /// Backup copy of the merged collection
        #[arg(short, long, default_value = "backup_all_merged.json")]
        backup: PathBuf,
    },

    /// Serve the personalization API over a merged collection
    Serve {
        /// Path to the merged collection produced by `merge`
        #[arg(long, default_value = "all_merged.json")]
        collection: PathBuf,

        /// Socket address to bind
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        addr: String,
    },

    /// Classify documents into category folders using the hosted model
    Classify {
        /// Text documents to classify
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory receiving the organized copies
        #[arg(short, long, default_value = "organized_docs")]
        output_dir: PathBuf,
    },
}
