use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Editor Gate Router Module
///
/// Routes that guard the content editor. There is no session: every unlock request is
/// verified on its own, and the caller decides what to do with the answer.
pub fn editor_routes() -> Router<AppState> {
    Router::new()
        // POST /editor/{gate}/unlock
        // Verifies the submitted password against the gate's stored credential record.
        // The key derivation runs on the blocking pool, so slow checks don't stall other requests.
        .route("/editor/{gate}/unlock", post(handlers::unlock_editor))
}
