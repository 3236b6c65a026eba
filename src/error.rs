use thiserror::Error;

/// VerifyError
///
/// Everything that can stop a verification from producing an answer.
/// A credential mismatch is NOT represented here: it is the ordinary `Ok(false)` result.
/// Keeping the two apart lets callers tell "wrong password" from "could not check".
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The stored record is not `<digest>.<salt>` with exactly one separator
    /// and two non-empty parts. Usually indicates corrupt data in the credential store.
    #[error("malformed credential record: {0}")]
    MalformedRecord(&'static str),

    /// The key-derivation cost parameters were rejected at construction time.
    #[error("invalid key-derivation parameters: {0}")]
    InvalidParams(String),

    /// The key-derivation function itself failed for this input.
    #[error("key derivation failed: {0}")]
    Derivation(String),

    /// The verifier stopped handing out derivation permits.
    #[error("verifier is no longer accepting work")]
    Closed,

    /// The blocking derivation task panicked or was aborted by the runtime.
    #[error("verification task did not complete: {0}")]
    Task(#[from] tokio::task::JoinError),
}
