//! The merge pipeline: consolidate per-source article dumps into one
//! validated, deduplicated collection.
//!
//! Inputs are processed strictly in the order given, and records within a
//! file in file order. Duplicate checks run against the collection accepted
//! so far, so the first-seen record among duplicates wins and later
//! near-duplicates are dropped. This order dependence is a contract of the
//! pipeline, not an implementation accident: swapping two input files swaps
//! which of a duplicate pair survives.
//!
//! Failure policy: a missing or malformed input file is logged and treated
//! as an empty contribution; only a run in which *no* input file loads is a
//! terminal error. Output write failures are logged, never raised.

pub mod dedup;
pub mod filter;

use std::error::Error;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use tokio::fs;
use tracing::{error, info, instrument};

use crate::models::Article;
use crate::outputs::json;

/// Aggregate counts for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Input files that loaded and parsed.
    pub files_loaded: usize,
    /// Input files skipped as missing or malformed.
    pub files_failed: usize,
    /// Raw records seen across all loaded files.
    pub records_seen: usize,
    /// Records dropped by the validity filter.
    pub invalid: usize,
    /// Records dropped as duplicates of earlier-seen records.
    pub duplicates: usize,
    /// Records retained in the merged collection.
    pub unique: usize,
}

/// Synchronize the redundant image fields and canonicalize the URL.
///
/// `image` and `top_image` both end up carrying the first non-empty of the
/// two source values (preferring `image`), or both `None`. All other fields
/// pass through unchanged; missing optional fields never fail.
pub fn normalize_article(mut article: Article) -> Article {
    let image = article
        .image
        .take()
        .filter(|value| !value.is_empty())
        .or_else(|| article.top_image.take().filter(|value| !value.is_empty()));
    article.top_image = image.clone();
    article.image = image;

    if !article.url.is_empty() {
        article.url = dedup::normalize_url(&article.url);
    }
    article
}

/// Load one raw dump, tolerating missing or malformed files.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
async fn load_raw_dump(path: &Path) -> Option<Vec<Article>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "Failed to read input file; treating as empty");
            return None;
        }
    };
    match serde_json::from_slice::<Vec<Article>>(&bytes) {
        Ok(records) => Some(records),
        Err(e) => {
            error!(error = %e, "Failed to parse input file; treating as empty");
            None
        }
    }
}

/// Run the full pipeline over `inputs`, writing the accepted collection to
/// `output` and identically to `backup`.
#[instrument(level = "info", skip_all, fields(inputs = inputs.len()))]
pub async fn run(
    inputs: &[PathBuf],
    output: &Path,
    backup: &Path,
) -> Result<MergeReport, Box<dyn Error + Send + Sync>> {
    let mut report = MergeReport::default();
    let mut accepted: Vec<Article> = Vec::new();

    for path in inputs {
        info!(path = %path.display(), "Processing input file");
        let Some(records) = load_raw_dump(path).await else {
            report.files_failed += 1;
            continue;
        };
        report.files_loaded += 1;

        for record in records {
            report.records_seen += 1;
            let record = normalize_article(record);
            if !filter::is_valid_article(&record) {
                report.invalid += 1;
                continue;
            }
            if dedup::is_duplicate(&record, &accepted) {
                report.duplicates += 1;
                continue;
            }
            accepted.push(record);
        }
    }

    if report.files_loaded == 0 {
        return Err(format!(
            "none of the {} input file(s) could be loaded",
            inputs.len()
        )
        .into());
    }

    report.unique = accepted.len();
    let outlets = accepted
        .iter()
        .filter_map(Article::source_tag)
        .unique()
        .count();
    info!(
        duplicates = report.duplicates,
        invalid = report.invalid,
        unique = report.unique,
        outlets,
        "Merge complete"
    );

    if let Err(e) = json::write_collection(&accepted, output).await {
        error!(path = %output.display(), error = %e, "Failed to write merged collection");
    }
    if let Err(e) = json::write_collection(&accepted, backup).await {
        error!(path = %backup.display(), error = %e, "Failed to write backup collection");
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, url: &str, body_char: char) -> serde_json::Value {
        serde_json::json!({
            "title": title,
            "url": url,
            "raw_text": body_char.to_string().repeat(150),
        })
    }

    fn write_dump(dir: &Path, name: &str, records: &[serde_json::Value]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_normalize_article_prefers_image_field() {
        let article = Article {
            image: Some("https://cdn.example.com/a.png".to_string()),
            top_image: Some("https://cdn.example.com/b.png".to_string()),
            ..Article::default()
        };
        let normalized = normalize_article(article);
        assert_eq!(
            normalized.image.as_deref(),
            Some("https://cdn.example.com/a.png")
        );
        assert_eq!(normalized.image, normalized.top_image);
    }

    #[test]
    fn test_normalize_article_fills_image_from_top_image() {
        let article = Article {
            top_image: Some("https://cdn.example.com/b.png".to_string()),
            ..Article::default()
        };
        let normalized = normalize_article(article);
        assert_eq!(
            normalized.image.as_deref(),
            Some("https://cdn.example.com/b.png")
        );
        assert_eq!(normalized.image, normalized.top_image);
    }

    #[test]
    fn test_normalize_article_without_images_leaves_both_null() {
        let normalized = normalize_article(Article::default());
        assert!(normalized.image.is_none());
        assert!(normalized.top_image.is_none());

        // The scraping library emits "" when it found no image.
        let article = Article {
            image: Some(String::new()),
            top_image: Some(String::new()),
            ..Article::default()
        };
        let normalized = normalize_article(article);
        assert!(normalized.image.is_none());
        assert!(normalized.top_image.is_none());
    }

    #[test]
    fn test_normalize_article_canonicalizes_url() {
        let article = Article {
            url: "http://x.com/a?ref=1#top".to_string(),
            ..Article::default()
        };
        assert_eq!(normalize_article(article).url, "http://x.com/a");
    }

    #[tokio::test]
    async fn test_first_seen_record_wins_across_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_dump(
            dir.path(),
            "a.json",
            &[record(
                "Tech Firm Announces New Product Line",
                "http://x.com/a?ref=1",
                'a',
            )],
        );
        let b = write_dump(
            dir.path(),
            "b.json",
            &[record(
                "Tech Firm Announces New Product Line!",
                "http://x.com/a",
                'b',
            )],
        );
        let output = dir.path().join("merged.json");
        let backup = dir.path().join("backup.json");

        let report = run(&[a, b], &output, &backup).await.unwrap();
        assert_eq!(report.unique, 1);
        assert_eq!(report.duplicates, 1);

        let merged = json::read_collection(&output).await.unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].url, "http://x.com/a");
        assert!(merged[0].raw_text.starts_with('a'), "input A must win");
    }

    #[tokio::test]
    async fn test_swapping_input_order_changes_survivor() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_dump(
            dir.path(),
            "a.json",
            &[record(
                "Tech Firm Announces New Product Line",
                "http://x.com/a",
                'a',
            )],
        );
        let b = write_dump(
            dir.path(),
            "b.json",
            &[record(
                "Tech Firm Announces New Product Line!",
                "http://y.com/b",
                'b',
            )],
        );
        let output = dir.path().join("merged.json");
        let backup = dir.path().join("backup.json");

        run(&[b, a], &output, &backup).await.unwrap();
        let merged = json::read_collection(&output).await.unwrap();
        assert_eq!(merged.len(), 1);
        assert!(merged[0].raw_text.starts_with('b'), "input B listed first");
    }

    #[tokio::test]
    async fn test_output_and_backup_are_identical_and_stable() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_dump(
            dir.path(),
            "a.json",
            &[
                record("Senate Approves Infrastructure Package", "http://x.com/1", 'a'),
                record("Rivals Clash in Championship Final", "http://x.com/2", 'b'),
            ],
        );
        let output = dir.path().join("merged.json");
        let backup = dir.path().join("backup.json");

        run(std::slice::from_ref(&a), &output, &backup).await.unwrap();
        let first = std::fs::read(&output).unwrap();
        assert_eq!(first, std::fs::read(&backup).unwrap());

        // Rerunning on the same inputs is byte-identical.
        run(std::slice::from_ref(&a), &output, &backup).await.unwrap();
        assert_eq!(first, std::fs::read(&output).unwrap());
    }

    #[tokio::test]
    async fn test_missing_and_malformed_inputs_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_dump(
            dir.path(),
            "good.json",
            &[record("Senate Approves Infrastructure Package", "http://x.com/1", 'a')],
        );
        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{not json").unwrap();
        let missing = dir.path().join("missing.json");
        let output = dir.path().join("merged.json");
        let backup = dir.path().join("backup.json");

        let report = run(&[missing, broken, good], &output, &backup)
            .await
            .unwrap();
        assert_eq!(report.files_loaded, 1);
        assert_eq!(report.files_failed, 2);
        assert_eq!(report.unique, 1);
    }

    #[tokio::test]
    async fn test_no_loadable_inputs_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("merged.json");
        let backup = dir.path().join("backup.json");

        let result = run(&[dir.path().join("missing.json")], &output, &backup).await;
        assert!(result.is_err());
        assert!(!output.exists(), "no output on a fatal run");
    }

    #[tokio::test]
    async fn test_invalid_records_are_counted_not_kept() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_dump(
            dir.path(),
            "a.json",
            &[
                record("Senate Approves Infrastructure Package", "http://x.com/1", 'a'),
                record("BREAKING NEWS TODAY", "http://x.com/2", 'b'),
                record("15 January 2024", "http://x.com/3", 'c'),
            ],
        );
        let output = dir.path().join("merged.json");
        let backup = dir.path().join("backup.json");

        let report = run(std::slice::from_ref(&a), &output, &backup).await.unwrap();
        assert_eq!(report.records_seen, 3);
        assert_eq!(report.invalid, 2);
        assert_eq!(report.unique, 1);
    }

    #[tokio::test]
    async fn test_merged_collection_invariants_hold() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_dump(
            dir.path(),
            "a.json",
            &[
                record("Senate Approves Infrastructure Package", "http://x.com/1?ref=a", 'a'),
                record("Senate Approves Infrastructure Package Now", "http://y.com/1", 'b'),
                record("Rivals Clash in Championship Final", "http://x.com/1", 'c'),
                record("Museum Reopens After Decade of Restoration", "http://z.com/9", 'd'),
            ],
        );
        let output = dir.path().join("merged.json");
        let backup = dir.path().join("backup.json");

        run(std::slice::from_ref(&a), &output, &backup).await.unwrap();
        let merged = json::read_collection(&output).await.unwrap();

        for (i, left) in merged.iter().enumerate() {
            assert!(filter::is_valid_article(left));
            for right in merged.iter().skip(i + 1) {
                assert_ne!(
                    dedup::normalize_url(&left.url),
                    dedup::normalize_url(&right.url)
                );
                assert!(
                    dedup::similarity_ratio(&left.title, &right.title)
                        <= dedup::TITLE_SIMILARITY_THRESHOLD
                );
            }
        }
    }
}
