use crate::AppState;
use axum::{Router, routing::get};

/// Public Router Module
///
/// Unauthenticated endpoints that touch neither the repository nor the verifier.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Used for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
}
