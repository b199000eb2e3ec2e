//! Shared application state for the serve layer.

use std::collections::HashMap;
use std::sync::Arc;

use crate::api::ChatModel;
use crate::config::FeedConfig;
use crate::models::Article;
use crate::server::session::SessionStore;

/// Everything the handlers need: the immutable merged collection, the model
/// seam, feed settings, and the per-session store.
pub struct AppState {
    articles: Vec<Article>,
    by_url: HashMap<String, usize>,
    pub model: Arc<dyn ChatModel>,
    pub feed: FeedConfig,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(articles: Vec<Article>, model: Arc<dyn ChatModel>, feed: FeedConfig) -> Self {
        let by_url = articles
            .iter()
            .enumerate()
            .map(|(index, article)| (article.url.clone(), index))
            .collect();
        Self {
            articles,
            by_url,
            model,
            feed,
            sessions: SessionStore::default(),
        }
    }

    /// The full merged collection, in merge order.
    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    /// Look up an article by its (normalized) URL.
    pub fn article(&self, url: &str) -> Option<&Article> {
        self.by_url.get(url).map(|&index| &self.articles[index])
    }

    /// Whether a URL belongs to the merged collection.
    pub fn contains(&self, url: &str) -> bool {
        self.by_url.contains_key(url)
    }
}
