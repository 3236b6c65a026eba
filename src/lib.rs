use axum::{Router, extract::FromRef, http::HeaderName};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Verification core.
pub mod credential;
pub mod error;

// HTTP service around it.
pub mod config;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;

use routes::{editor, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use credential::{
    CredentialVerifier, KeyDerivation, ScryptCost, ScryptKdf, StoredCredentialRecord,
    VerifierState, default_verifier, verify,
};
pub use error::VerifyError;
pub use repository::{PostgresRepository, RepositoryError, RepositoryState};

/// ApiDoc
///
/// Auto-generated OpenAPI document, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::unlock_editor),
    components(schemas(models::UnlockEditorRequest, models::UnlockEditorResponse)),
    tags(
        (name = "editor-gate", description = "Content editor gate API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Single, cloneable container for everything a request may need. Handlers extract the
/// parts they use (`State<RepositoryState>`, `State<VerifierState>`) through FromRef.
#[derive(Clone)]
pub struct AppState {
    /// Source of stored credential records.
    pub repo: RepositoryState,
    /// Shared verifier; cheap to clone, holds no per-request state.
    pub verifier: VerifierState,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for VerifierState {
    fn from_ref(app_state: &AppState) -> VerifierState {
        app_state.verifier.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, applies the observability layers and registers the state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(editor::editor_routes())
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                // Every incoming request gets a UUID...
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // ...which the request span records...
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // ...and which is echoed back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: method, URI and the `x-request-id`, so every log line of a
/// request can be correlated. Request bodies are never recorded.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
