use crate::{
    credential::VerifierState,
    error::VerifyError,
    models::{UnlockEditorRequest, UnlockEditorResponse},
    repository::RepositoryState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

// --- Handlers ---

/// unlock_editor
///
/// [Public Route] Checks a plaintext credential against the stored record of an editor gate.
/// Pulls only the repository and the verifier out of the shared state (via FromRef).
///
/// Status mapping:
/// * 200 with `granted: true` when the credential matches.
/// * 401 with `granted: false` on a mismatch. This is a normal outcome, not a failure.
/// * 404 when the gate has no stored credential.
/// * 400 when the submitted password is empty.
/// * 500 when the credential store cannot be read, the stored record is corrupt, or
///   derivation fails. These are logged with the gate name only; the plaintext never
///   reaches the logs.
#[utoipa::path(
    post,
    path = "/editor/{gate}/unlock",
    params(("gate" = String, Path, description = "Editor gate identifier")),
    request_body = UnlockEditorRequest,
    responses(
        (status = 200, description = "Credential accepted", body = UnlockEditorResponse),
        (status = 400, description = "Empty credential"),
        (status = 401, description = "Credential rejected", body = UnlockEditorResponse),
        (status = 404, description = "Unknown gate"),
        (status = 500, description = "Credential could not be checked")
    )
)]
pub async fn unlock_editor(
    State(repo): State<RepositoryState>,
    State(verifier): State<VerifierState>,
    Path(gate): Path<String>,
    Json(payload): Json<UnlockEditorRequest>,
) -> Result<(StatusCode, Json<UnlockEditorResponse>), StatusCode> {
    if payload.password.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let credential = repo
        .get_editor_credential(&gate)
        .await
        .map_err(|e| {
            tracing::error!(gate = %gate, "credential lookup failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    match verifier.verify(&payload.password, &credential.record).await {
        Ok(true) => {
            tracing::info!(gate = %gate, "editor gate unlocked");
            Ok((
                StatusCode::OK,
                Json(UnlockEditorResponse {
                    gate,
                    granted: true,
                }),
            ))
        }
        Ok(false) => {
            tracing::warn!(gate = %gate, "editor gate credential rejected");
            Ok((
                StatusCode::UNAUTHORIZED,
                Json(UnlockEditorResponse {
                    gate,
                    granted: false,
                }),
            ))
        }
        Err(e @ VerifyError::MalformedRecord(_)) => {
            tracing::error!(gate = %gate, credential_id = %credential.id, "corrupt stored credential: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(e) => {
            tracing::error!(gate = %gate, "credential verification could not run: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
