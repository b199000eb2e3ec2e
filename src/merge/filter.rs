//! Quality filtering for raw article records.
//!
//! Scraper dumps are full of pages that are not stories: newsletter signup
//! prompts, careers pages, privacy policies, and index pages whose "title"
//! is just a date. [`is_valid_article`] is the pure predicate that decides
//! whether a record is a genuine article worth keeping.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Article;

/// Body phrases that mark newsletter/subscription pages rather than stories.
const NEWSLETTER_PHRASES: &[&str] = &[
    "delivered to your inbox",
    "subscribe",
    "newsletter",
    "privacy policy",
    "terms of use",
    "unsubscribe",
    "your email",
    "read our privacy",
    "check out more",
    "sent straight to you",
];

/// Title fragments that mark site furniture rather than articles.
const NON_ARTICLE_TITLES: &[&str] = &[
    "career",
    "job opening",
    "terms and conditions",
    "privacy policy",
    "disclaimer",
    "advertisement",
    "subscribe now",
    "subscription",
    "newsletter",
    "about us",
    "contact us",
    "advertise with us",
];

/// Titles that are only a date, matched against the trimmed lowercased title.
static DATE_ONLY_TITLES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^\d{1,2}\s+[a-z]+\s+\d{4}$",   // "15 january 2024"
        r"^[a-z]+\s+\d{1,2},?\s+\d{4}$", // "january 15, 2024"
        r"^\d{1,2}/\d{1,2}/\d{2,4}$",    // "01/15/2024"
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("date pattern is valid"))
    .collect()
});

/// Decide whether a record is a genuine news article worth keeping.
///
/// All rules must pass:
/// - `title` and `url` present, `raw_text` longer than 100 characters
/// - body free of newsletter/subscription boilerplate
/// - title free of non-article phrases, not a bare date, at least three
///   tokens, not entirely upper-case, not mostly digits
///
/// Pure predicate over a single record; rejections are counted in aggregate
/// by the pipeline, never logged per record.
pub fn is_valid_article(article: &Article) -> bool {
    if article.title.is_empty() || article.url.is_empty() {
        return false;
    }
    if article.raw_text.chars().count() <= 100 {
        return false;
    }

    let text = article.raw_text.to_lowercase();
    if NEWSLETTER_PHRASES.iter().any(|phrase| text.contains(phrase)) {
        return false;
    }

    let title = article.title.to_lowercase();
    if NON_ARTICLE_TITLES.iter().any(|phrase| title.contains(phrase)) {
        return false;
    }
    if DATE_ONLY_TITLES
        .iter()
        .any(|pattern| pattern.is_match(title.trim()))
    {
        return false;
    }
    if title.split_whitespace().count() < 3 {
        return false;
    }
    if is_entirely_uppercase(&article.title) {
        return false;
    }

    let total = article.title.chars().count();
    let digits = article
        .title
        .chars()
        .filter(|c| c.is_ascii_digit())
        .count();
    if digits * 2 > total {
        return false;
    }

    true
}

/// True when the string has at least one cased character and none lowercase.
fn is_entirely_uppercase(s: &str) -> bool {
    let mut has_cased = false;
    for c in s.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}
