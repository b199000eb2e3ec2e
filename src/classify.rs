//! Document classification utility.
//!
//! Takes a batch of text documents, asks the hosted model for a category per
//! document, and copies each file into `<out_dir>/<category>/`. Categories
//! already present on disk are offered back to the model so related
//! documents land in the same folder across runs.
//!
//! Only plain-text formats are read here; binary formats (PDF and office
//! documents) are expected to be converted by external tooling first, the
//! same way scraping is external to the merge pipeline.

use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{error, info, instrument, warn};

use crate::api::{ChatModel, ChatRequest};
use crate::utils::{ensure_writable_dir, truncate_chars};

/// Characters of document text sent to the model.
const MAX_DOCUMENT_CHARS: usize = 15_000;

/// Extensions read as plain text.
const TEXT_EXTENSIONS: &[&str] = &["txt", "text", "md", "markdown"];

/// Longest category directory name we will create.
const MAX_CATEGORY_CHARS: usize = 50;

const CATEGORIZATION_SYSTEM_PROMPT: &str = "\
You are an AI file categorization system. Analyze each document's content \
and assign it to a category.\n\
\n\
Core categories:\n\
1. Finance (budgets, invoices, reports)\n\
2. Legal (contracts, agreements, policies)\n\
3. Project Management (plans, timelines, sprints)\n\
4. Technical (code, documentation, APIs)\n\
5. Marketing (campaigns, media, brands)\n\
6. HR (employee docs, recruitment)\n\
7. Presentations (slides, decks)\n\
8. Personal (taxes, medical, family)\n\
\n\
Respond ONLY in this format:\n\
\n\
Category: [Specific category name]\n\
Confidence: [X%]\n\
Reason: [Brief technical explanation of categorization logic]\n\
\n\
Use the highest confidence category. Never include additional commentary \
outside this format.";

/// Where each input ended up after a classification run.
#[derive(Debug, Default)]
pub struct ClassifyReport {
    /// Destination paths grouped by category.
    pub organized: BTreeMap<String, Vec<PathBuf>>,
    /// Inputs that could not be classified or copied.
    pub failed: Vec<PathBuf>,
}

impl ClassifyReport {
    pub fn organized_count(&self) -> usize {
        self.organized.values().map(Vec::len).sum()
    }
}

/// Classify every input document and copy it into a category folder under
/// `out_dir`. Per-file failures are logged and collected; only an empty
/// input list or an unusable output directory fails the whole run.
#[instrument(level = "info", skip_all, fields(inputs = inputs.len(), out_dir = %out_dir.display()))]
pub async fn run(
    model: &dyn ChatModel,
    inputs: &[PathBuf],
    out_dir: &Path,
) -> Result<ClassifyReport, Box<dyn Error + Send + Sync>> {
    if inputs.is_empty() {
        return Err("no input documents given".into());
    }
    ensure_writable_dir(out_dir).await?;

    let mut existing = existing_categories(out_dir).await;
    let mut report = ClassifyReport::default();

    for path in inputs {
        info!(path = %path.display(), "Classifying document");
        match classify_file(model, path, &existing).await {
            Ok(category) => match place_file(path, out_dir, &category).await {
                Ok(destination) => {
                    if !existing.contains(&category) {
                        existing.push(category.clone());
                    }
                    report.organized.entry(category).or_default().push(destination);
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Failed to copy document");
                    report.failed.push(path.clone());
                }
            },
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to classify document");
                report.failed.push(path.clone());
            }
        }
    }

    info!(
        organized = report.organized_count(),
        failed = report.failed.len(),
        categories = report.organized.len(),
        "Classification run complete"
    );
    Ok(report)
}

/// One chat call for one document; returns the sanitized category name.
async fn classify_file(
    model: &dyn ChatModel,
    path: &Path,
    existing: &[String],
) -> Result<String, Box<dyn Error + Send + Sync>> {
    let text = extract_text(path).await?;

    let mut system = CATEGORIZATION_SYSTEM_PROMPT.to_string();
    if !existing.is_empty() {
        system.push_str(&format!(
            "\n\nExisting categories to consider: {}",
            existing.join(", ")
        ));
    }

    let request = ChatRequest {
        system,
        user: format!("Document content:\n{text}"),
        json_object: false,
        temperature: None,
        max_tokens: None,
    };
    let response = model.chat(&request).await?;
    Ok(parse_category(&response))
}

/// Read a plain-text document, trimmed and capped at [`MAX_DOCUMENT_CHARS`].
async fn extract_text(path: &Path) -> Result<String, Box<dyn Error + Send + Sync>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !TEXT_EXTENSIONS.contains(&extension.as_str()) {
        return Err(format!("unsupported file type: {extension:?}").into());
    }

    let raw = fs::read_to_string(path).await?;
    let text = truncate_chars(raw.trim(), MAX_DOCUMENT_CHARS);
    if text.is_empty() {
        return Err("document contains no text".into());
    }
    Ok(text)
}

/// Extract the category name from the model's response, with validation.
///
/// Looks for the first `Category:` line; anything missing or empty after
/// sanitization becomes `Uncategorized`.
pub fn parse_category(response: &str) -> String {
    let category = response
        .lines()
        .find(|line| line.to_lowercase().starts_with("category:"))
        .and_then(|line| line.splitn(2, ':').nth(1))
        .map(|rest| sanitize_category(rest.trim()))
        .unwrap_or_default();

    if category.is_empty() {
        "Uncategorized".to_string()
    } else {
        category
    }
}

/// Clean a category name for filesystem safety: strip `\/*?:"<>|`, turn
/// spaces into underscores, cap the length.
pub fn sanitize_category(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|'))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect();
    truncate_chars(&cleaned, MAX_CATEGORY_CHARS)
}

/// Copy a classified document into its category directory.
async fn place_file(
    path: &Path,
    out_dir: &Path,
    category: &str,
) -> Result<PathBuf, Box<dyn Error + Send + Sync>> {
    let file_name = path
        .file_name()
        .ok_or_else(|| format!("input has no file name: {}", path.display()))?;
    let category_dir = out_dir.join(category);
    fs::create_dir_all(&category_dir).await?;

    let destination = category_dir.join(file_name);
    fs::copy(path, &destination).await?;
    Ok(destination)
}

/// Category directories already present under `out_dir`, sorted for a
/// stable prompt.
async fn existing_categories(out_dir: &Path) -> Vec<String> {
    let mut categories = Vec::new();
    let Ok(mut entries) = fs::read_dir(out_dir).await else {
        return categories;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let is_dir = entry
            .file_type()
            .await
            .map(|file_type| file_type.is_dir())
            .unwrap_or(false);
        if is_dir {
            if let Ok(name) = entry.file_name().into_string() {
                categories.push(name);
            } else {
                warn!("Skipping category directory with non-UTF-8 name");
            }
        }
    }
    categories.sort();
    categories
}
