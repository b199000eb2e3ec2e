//! Feed selection and stance-conditioned reframing.
//!
//! Selection is a plain substring filter over titles and keywords; when it
//! matches nothing the configured fallback policy decides between a random
//! sample and an empty feed. Reframing sends one request per article through
//! the [`ChatModel`] seam and degrades to the original title/summary on any
//! failure, so a broken or slow backend can never take the feed down.

use rand::seq::IndexedRandom;
use tracing::{instrument, warn};

use crate::api::{ChatModel, ChatRequest};
use crate::config::{FallbackPolicy, FeedConfig};
use crate::models::{Article, PersonalizedContent};
use crate::utils::{truncate_chars, truncate_for_log};

/// Characters of `raw_text` used as a stand-in summary when the scraper
/// produced none.
const SUMMARY_FALLBACK_CHARS: usize = 300;

const REFRAME_SYSTEM_PROMPT: &str = "Reframe news with political nuance. Output strict JSON.";

/// Pick the articles to show for a preference string.
///
/// Case-insensitive substring match against the title or any keyword, first
/// `feed.size` matches in collection order. An empty preference matches
/// everything. When nothing matches, `feed.fallback` decides: a random
/// sample of `feed.size` articles, or nothing at all.
pub fn select_articles<'a>(
    articles: &'a [Article],
    preference: &str,
    feed: &FeedConfig,
) -> Vec<&'a Article> {
    let needle = preference.trim().to_lowercase();
    let matches: Vec<&Article> = articles
        .iter()
        .filter(|article| {
            article.title.to_lowercase().contains(&needle)
                || article
                    .keywords
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .any(|keyword| keyword.to_lowercase().contains(&needle))
        })
        .take(feed.size)
        .collect();

    if !matches.is_empty() {
        return matches;
    }
    match feed.fallback {
        FallbackPolicy::Random => sample_articles(articles, feed.size),
        FallbackPolicy::None => Vec::new(),
    }
}

/// A random sample of up to `size` articles, for feed refreshes and as the
/// no-match fallback.
pub fn sample_articles(articles: &[Article], size: usize) -> Vec<&Article> {
    let mut rng = rand::rng();
    articles.choose_multiple(&mut rng, size).collect()
}

/// Ask the model to reframe one article for the reader's stated perspective.
///
/// One request, no retry. Any failure (transport, timeout, non-JSON content,
/// empty fields) falls back to the article's original title and summary with
/// `reframed == false`; the warning is the only trace a degraded card leaves.
#[instrument(level = "info", skip_all, fields(model = model.name(), url = %article.url))]
pub async fn personalize_content(
    model: &dyn ChatModel,
    article: &Article,
    preference: &str,
) -> PersonalizedContent {
    let original = PersonalizedContent {
        title: article.title.clone(),
        summary: original_summary(article),
        reframed: false,
    };

    let request = reframe_request(article, preference);
    let response = match model.chat(&request).await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "Personalization call failed; serving original content");
            return original;
        }
    };

    match serde_json::from_str::<PersonalizedContent>(&response) {
        Ok(mut content) if !content.title.is_empty() && !content.summary.is_empty() => {
            content.reframed = true;
            content
        }
        Ok(_) => {
            warn!(
                response_preview = %truncate_for_log(&response, 300),
                "Model returned empty fields; serving original content"
            );
            original
        }
        Err(e) => {
            warn!(
                error = %e,
                response_preview = %truncate_for_log(&response, 300),
                "Model returned non-JSON content; serving original content"
            );
            original
        }
    }
}

fn original_summary(article: &Article) -> String {
    article
        .summary
        .clone()
        .filter(|summary| !summary.is_empty())
        .unwrap_or_else(|| truncate_chars(&article.raw_text, SUMMARY_FALLBACK_CHARS))
}

fn reframe_request(article: &Article, preference: &str) -> ChatRequest {
    let user = format!(
        "Rewrite this news content in JSON:\n\
         {{\n    \"title\": \"\",\n    \"summary\": \"\"\n}}\n\n\
         Political Perspective: {preference}\n\
         Original Title: {title}\n\
         Original Summary: {summary}\n\n\
         Focus on political alignment and concise messaging.",
        title = article.title,
        summary = original_summary(article),
    );
    ChatRequest {
        system: REFRAME_SYSTEM_PROMPT.to_string(),
        user,
        json_object: true,
        temperature: Some(0.6),
        max_tokens: Some(150),
    }
}
