//! URL canonicalization and near-duplicate detection.
//!
//! Two records count as the same story when their normalized URLs match or
//! when their titles are nearly identical. Title comparison uses a
//! character-level longest-matching-block ratio (the classic sequence-matcher
//! measure), which tolerates punctuation and small wording edits between
//! outlets carrying the same wire story.

use std::collections::HashMap;

use url::Url;

use crate::models::Article;

/// Titles whose similarity ratio exceeds this are treated as the same story.
pub const TITLE_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Canonicalize a URL to scheme+host(+port)+path, discarding query and fragment.
///
/// Used both as the deduplication key and as the `url` value written back
/// onto each merged record. Idempotent: normalizing the output again yields
/// the same string. Strings that do not parse as absolute URLs are returned
/// trimmed but otherwise untouched.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(parsed) => {
            let mut canonical = format!("{}://", parsed.scheme());
            if let Some(host) = parsed.host_str() {
                canonical.push_str(host);
            }
            if let Some(port) = parsed.port() {
                canonical.push(':');
                canonical.push_str(&port.to_string());
            }
            canonical.push_str(parsed.path());
            canonical
        }
        Err(_) => trimmed.to_string(),
    }
}

/// Similarity ratio in [0, 1] between two strings, case-insensitive.
///
/// Computes `2*M / (len(a) + len(b))` where `M` is the total number of
/// characters covered by recursively locating the longest common block and
/// matching the pieces to either side of it. Two empty strings are fully
/// similar. Symmetric but not transitive.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let matched = matching_chars(&a, &b);
    (2.0 * matched as f64) / ((a.len() + b.len()) as f64)
}

/// Whether two titles exceed [`TITLE_SIMILARITY_THRESHOLD`].
pub fn titles_similar(a: &str, b: &str) -> bool {
    similarity_ratio(a, b) > TITLE_SIMILARITY_THRESHOLD
}

/// True if `candidate` duplicates any already-accepted record, either by
/// normalized URL or by title similarity.
///
/// Linear scan over the accepted set; at the scale this pipeline handles
/// (thousands of records) the resulting quadratic total cost is fine.
pub fn is_duplicate(candidate: &Article, accepted: &[Article]) -> bool {
    let candidate_url = normalize_url(&candidate.url);
    accepted.iter().any(|existing| {
        normalize_url(&existing.url) == candidate_url
            || titles_similar(&existing.title, &candidate.title)
    })
}

/// Sum of matched characters across all common blocks.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    // Regions still to be matched, recursing around each longest block.
    let mut regions = vec![(0usize, a.len(), 0usize, b.len())];
    let mut total = 0usize;
    while let Some((alo, ahi, blo, bhi)) = regions.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size > 0 {
            total += size;
            regions.push((alo, i, blo, j));
            regions.push((i + size, ahi, j + size, bhi));
        }
    }
    total
}

/// Longest block `a[i..i+size] == b[j..j+size]` within the given bounds,
/// preferring the earliest block on ties.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let mut positions: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, c) in b.iter().enumerate().take(bhi).skip(blo) {
        positions.entry(*c).or_default().push(j);
    }

    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0usize);
    // run_lengths[j] = length of the common run ending at a[i], b[j].
    let mut run_lengths: HashMap<usize, usize> = HashMap::new();
    for i in alo..ahi {
        let mut next_runs: HashMap<usize, usize> = HashMap::new();
        if let Some(js) = positions.get(&a[i]) {
            for &j in js {
                let run = if j > blo {
                    run_lengths.get(&(j - 1)).copied().unwrap_or(0) + 1
                } else {
                    1
                };
                next_runs.insert(j, run);
                if run > best_size {
                    best_i = i + 1 - run;
                    best_j = j + 1 - run;
                    best_size = run;
                }
            }
        }
        run_lengths = next_runs;
    }
    (best_i, best_j, best_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, url: &str) -> Article {
        Article {
            title: title.to_string(),
            url: url.to_string(),
            ..Article::default()
        }
    }

    #[test]
    fn test_normalize_url_strips_query_and_fragment() {
        assert_eq!(
            normalize_url("https://a.com/x?y=1#z"),
            normalize_url("https://a.com/x")
        );
        assert_eq!(normalize_url("http://x.com/a?ref=1"), "http://x.com/a");
    }

    #[test]
    fn test_normalize_url_is_idempotent() {
        for raw in [
            "https://a.com/x?y=1#z",
            "http://x.com:8080/path/to/story",
            "https://example.com",
            "not a url at all",
        ] {
            let once = normalize_url(raw);
            assert_eq!(normalize_url(&once), once, "not idempotent for {raw}");
        }
    }

    #[test]
    fn test_normalize_url_keeps_port() {
        assert_eq!(
            normalize_url("http://localhost:8080/story?utm=x"),
            "http://localhost:8080/story"
        );
    }

    #[test]
    fn test_normalize_url_unparseable_input_passes_through() {
        assert_eq!(normalize_url("  plain words  "), "plain words");
    }

    #[test]
    fn test_similarity_identical_strings() {
        assert!((similarity_ratio("abcdef", "abcdef") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_similarity_case_insensitive() {
        assert!((similarity_ratio("Hello World", "hello world") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_similarity_empty_strings() {
        assert!((similarity_ratio("", "") - 1.0).abs() < f64::EPSILON);
        assert!((similarity_ratio("abc", "") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_similarity_disjoint_strings() {
        assert!((similarity_ratio("aaaa", "bbbb") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_similarity_known_ratio() {
        // One common block of 4 chars: 2*4 / (4 + 5).
        let ratio = similarity_ratio("abcd", "xabcd");
        assert!((ratio - 8.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_titles_similar_trailing_punctuation() {
        // 36 shared chars out of 36+37: ratio just under 1.
        assert!(titles_similar(
            "Tech Firm Announces New Product Line",
            "Tech Firm Announces New Product Line!"
        ));
    }

    #[test]
    fn test_titles_not_similar_different_stories() {
        assert!(!titles_similar(
            "Parliament Passes Budget After Marathon Session",
            "Storm Forces Airport Closures Across Region"
        ));
    }

    #[test]
    fn test_is_duplicate_by_url() {
        let accepted = vec![article(
            "Completely Different Headline Here",
            "http://x.com/a",
        )];
        let candidate = article("Another Unrelated Headline Entirely", "http://x.com/a?ref=1");
        assert!(is_duplicate(&candidate, &accepted));
    }

    #[test]
    fn test_is_duplicate_by_title() {
        let accepted = vec![article(
            "Tech Firm Announces New Product Line",
            "http://x.com/a",
        )];
        let candidate = article(
            "Tech Firm Announces New Product Line!",
            "http://y.com/other-path",
        );
        assert!(is_duplicate(&candidate, &accepted));
    }

    #[test]
    fn test_is_not_duplicate() {
        let accepted = vec![article(
            "Parliament Passes Budget After Marathon Session",
            "http://x.com/a",
        )];
        let candidate = article(
            "Storm Forces Airport Closures Across Region",
            "http://y.com/b",
        );
        assert!(!is_duplicate(&candidate, &accepted));
    }
}
