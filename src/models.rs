use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Persisted Schemas ---

/// EditorCredential
///
/// One row of the `editor_credentials` table: the stored credential record guarding a
/// named editor gate. The `record` column holds the `<hex-digest>.<salt>` string and is
/// only ever read by this service.
#[derive(Debug, Clone, FromRow, Default)]
pub struct EditorCredential {
    pub id: Uuid,
    // Human-readable gate identifier, unique (e.g. "content", "roadmap").
    pub gate: String,
    pub record: String,
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads ---

/// UnlockEditorRequest
///
/// Input payload for POST /editor/{gate}/unlock.
#[derive(Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UnlockEditorRequest {
    /// The plaintext credential. Transient: never stored, never logged.
    pub password: String,
}

// Redacted so the plaintext cannot leak through `{:?}` in logs or panics.
impl fmt::Debug for UnlockEditorRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnlockEditorRequest")
            .field("password", &"<redacted>")
            .finish()
    }
}

// --- Response Payloads ---

/// UnlockEditorResponse
///
/// Result of a gate check. `granted` is false on a credential mismatch; infrastructure
/// failures are reported through the status code instead.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct UnlockEditorResponse {
    pub gate: String,
    pub granted: bool,
}
