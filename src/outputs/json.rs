//! Reading and writing merged article collections as JSON.
//!
//! The merged collection is the contract between the merge pipeline and the
//! serve layer: a JSON array of validated, deduplicated, normalized article
//! objects, pretty-printed with 2-space indentation, UTF-8 with non-ASCII
//! characters preserved literally (never `\u`-escaped). The same bytes are
//! written to the primary output path and to a backup path.

use std::error::Error;
use std::path::Path;

use tokio::fs;
use tracing::{info, instrument};

use crate::models::Article;

/// Serialize `articles` as indented JSON and write them to `path`, creating
/// parent directories as needed.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_collection(
    articles: &[Article],
    path: &Path,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let json = serde_json::to_string_pretty(articles)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    fs::write(path, json).await?;
    info!(count = articles.len(), "Wrote article collection");
    Ok(())
}

/// Load a merged collection written by [`write_collection`].
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_collection(path: &Path) -> Result<Vec<Article>, Box<dyn Error + Send + Sync>> {
    let bytes = fs::read(path).await?;
    let articles: Vec<Article> = serde_json::from_slice(&bytes)?;
    info!(count = articles.len(), "Loaded article collection");
    Ok(articles)
}
