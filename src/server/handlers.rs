//! HTTP handlers for the personalization API.
//!
//! The browser UI is an external collaborator; these handlers are the whole
//! contract it sees. Nothing here mutates the merged collection; the only
//! mutable state is the per-session preference/selection/likes.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::models::Article;
use crate::personalize;
use crate::server::session;
use crate::server::state::AppState;

/// Personalization calls in flight at once per feed request. Calls are
/// independent; ordered buffering keeps card order stable.
const PERSONALIZE_CONCURRENCY: usize = 4;

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    /// Free-text description of the reader's political perspective.
    #[serde(default)]
    pub preference: String,
    /// Force a fresh random selection regardless of the preference.
    #[serde(default)]
    pub refresh: bool,
}

/// One rendered card in the feed response.
#[derive(Debug, Serialize)]
pub struct FeedCard {
    pub title: String,
    pub summary: String,
    pub image: Option<String>,
    pub url: String,
    pub liked: bool,
    /// False when personalization degraded to the original content.
    pub reframed: bool,
}

#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub url: String,
    pub liked: bool,
}

/// `GET /api/articles`: the full merged collection.
pub async fn list_articles(State(state): State<Arc<AppState>>) -> Json<Vec<Article>> {
    Json(state.articles().to_vec())
}

/// `GET /api/feed`: the personalized card selection for this session.
///
/// The selection is rebuilt when the preference changes, when a refresh is
/// requested, or on first contact; otherwise the session's current cards are
/// re-served (and re-personalized, since each call is independent).
#[instrument(level = "info", skip_all)]
pub async fn feed(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<FeedParams>,
) -> Json<Vec<FeedCard>> {
    let session_id = session::session_id(&headers);

    let (selection, liked) = state.sessions.with_session(&session_id, |session| {
        if params.refresh {
            let sample = personalize::sample_articles(state.articles(), state.feed.size);
            session.current = sample.iter().map(|article| article.url.clone()).collect();
            session.preference = params.preference.clone();
        } else if session.preference != params.preference || session.current.is_empty() {
            let picks =
                personalize::select_articles(state.articles(), &params.preference, &state.feed);
            session.current = picks.iter().map(|article| article.url.clone()).collect();
            session.preference = params.preference.clone();
        }
        (session.current.clone(), session.liked.clone())
    });
    debug!(session = %session_id, cards = selection.len(), "Serving feed selection");

    let cards: Vec<FeedCard> = stream::iter(selection)
        .map(|url| {
            let state = Arc::clone(&state);
            let preference = params.preference.clone();
            let liked = liked.contains(&url);
            async move {
                let article = state.article(&url)?;
                let content =
                    personalize::personalize_content(state.model.as_ref(), article, &preference)
                        .await;
                Some(FeedCard {
                    title: content.title,
                    summary: content.summary,
                    image: article.image.clone(),
                    url: article.url.clone(),
                    liked,
                    reframed: content.reframed,
                })
            }
        })
        .buffered(PERSONALIZE_CONCURRENCY)
        .filter_map(|card| std::future::ready(card))
        .collect()
        .await;

    Json(cards)
}

/// `POST /api/like`: mark an article as liked for this session.
pub async fn like(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<LikeRequest>,
) -> Result<Json<LikeResponse>, StatusCode> {
    if !state.contains(&request.url) {
        return Err(StatusCode::NOT_FOUND);
    }

    let session_id = session::session_id(&headers);
    state.sessions.with_session(&session_id, |session| {
        session.liked.insert(request.url.clone());
    });
    info!(session = %session_id, url = %request.url, "Article liked");

    Ok(Json(LikeResponse {
        url: request.url,
        liked: true,
    }))
}
