use crate::models::EditorCredential;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;

/// RepositoryError
///
/// The credential store could not answer. Distinct from `Ok(None)`, which means the
/// store answered and the gate has no credential.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

/// Repository Trait
///
/// The persistence contract the gate handlers depend on. Handlers only ever read stored
/// credential records; creating or rotating them happens outside this service.
///
/// **Send + Sync + async_trait** are required to make the trait object (`Arc<dyn Repository>`)
/// shareable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Fetches the stored credential for `gate`. `Ok(None)` if the gate has no credential,
    /// `Err` if the lookup itself failed.
    async fn get_editor_credential(
        &self,
        gate: &str,
    ) -> Result<Option<EditorCredential>, RepositoryError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// get_editor_credential
    ///
    /// Single-row lookup on the unique `gate` column. Driver errors are logged here and
    /// passed up; the handler turns them into a 500 without echoing the details.
    async fn get_editor_credential(
        &self,
        gate: &str,
    ) -> Result<Option<EditorCredential>, RepositoryError> {
        sqlx::query_as::<_, EditorCredential>(
            "SELECT id, gate, record, updated_at FROM editor_credentials WHERE gate = $1",
        )
        .bind(gate)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("get_editor_credential error: {:?}", e);
            RepositoryError::from(e)
        })
    }
}
