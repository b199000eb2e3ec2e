//! Explicit per-session UI state.
//!
//! Each connected client is keyed by the `x-session-id` request header and
//! owns a [`SessionState`]: its last preference string, the URLs of the
//! currently displayed cards, and the set of liked article URLs. Sessions
//! have no cross-session visibility and no persistence; they live and die
//! with the process.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use axum::http::HeaderMap;

/// Request header carrying the client's session identifier.
pub const SESSION_HEADER: &str = "x-session-id";

/// Ephemeral state for a single user session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// The preference string the current selection was built for.
    pub preference: String,
    /// URLs of the articles currently displayed, in display order.
    pub current: Vec<String>,
    /// URLs the user has liked. Liking is idempotent.
    pub liked: HashSet<String>,
}

/// Process-local store of all live sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<String, SessionState>>,
}

impl SessionStore {
    /// Run `f` with exclusive access to the session for `id`, creating the
    /// session on first touch.
    pub fn with_session<T>(&self, id: &str, f: impl FnOnce(&mut SessionState) -> T) -> T {
        let mut sessions = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let session = sessions.entry(id.to_string()).or_default();
        f(session)
    }
}

/// Resolve the session id from request headers; clients that send none all
/// share one anonymous session.
pub fn session_id(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .unwrap_or("anonymous")
        .to_string()
}
