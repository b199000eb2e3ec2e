//! # Tinted News
//!
//! A news curation and personalization pipeline. External scrapers dump
//! per-source JSON article files; this binary consolidates them into a
//! single clean collection and serves it to a reading UI that reframes each
//! story through a hosted language model, conditioned on the reader's
//! stated political perspective.
//!
//! ## Subcommands
//!
//! - `merge`: normalize, quality-filter, and deduplicate per-source dumps
//!   into a merged collection plus a backup copy
//! - `serve`: personalization API over a merged collection (feed, likes)
//! - `classify`: organize text documents into category folders via the same
//!   hosted-model seam
//!
//! ## Architecture
//!
//! Data flows one way: scrapers -> raw dumps -> merge pipeline -> merged
//! JSON -> serve layer -> personalization call -> rendered cards. The hosted
//! model sits behind a single request/response trait and is never involved
//! in the merge stage.

use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod api;
mod classify;
mod cli;
mod config;
mod merge;
mod models;
mod outputs;
mod personalize;
mod server;
mod utils;

use api::{ChatModel, OpenAiChatClient};
use cli::{Cli, Command};
use config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("tinted_news starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let app_config = AppConfig::load(args.config.as_deref()).await?;

    match args.command {
        Command::Merge {
            inputs,
            output,
            backup,
        } => {
            info!(inputs = inputs.len(), "Starting merge pipeline");
            let report = merge::run(&inputs, &output, &backup).await?;
            info!(
                files_loaded = report.files_loaded,
                files_failed = report.files_failed,
                records_seen = report.records_seen,
                invalid = report.invalid,
                duplicates = report.duplicates,
                unique = report.unique,
                "Merge pipeline finished"
            );
        }

        Command::Serve { collection, addr } => {
            let articles = match outputs::json::read_collection(&collection).await {
                Ok(articles) => articles,
                Err(e) => {
                    error!(
                        path = %collection.display(),
                        error = %e,
                        "Failed to load merged collection (run `merge` first?)"
                    );
                    return Err(e.into());
                }
            };
            if articles.is_empty() {
                warn!("Merged collection is empty; the feed will have nothing to show");
            }

            let client = OpenAiChatClient::from_config(&app_config.model)?;
            info!(model = client.name(), count = articles.len(), "Serve layer ready");

            let model: Arc<dyn ChatModel> = Arc::new(client);
            let state = server::AppState::new(articles, model, app_config.feed.clone());
            server::serve(state, &addr).await?;
        }

        Command::Classify { inputs, output_dir } => {
            let client = OpenAiChatClient::from_config(&app_config.model)?;
            info!(model = client.name(), inputs = inputs.len(), "Starting classification");
            let report = classify::run(&client, &inputs, &output_dir).await?;
            info!(
                organized = report.organized_count(),
                failed = report.failed.len(),
                "Classification finished"
            );
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
