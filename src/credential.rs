use std::{
    fmt,
    str::FromStr,
    sync::{Arc, LazyLock},
};

use tokio::sync::Semaphore;

use crate::error::VerifyError;

/// Separator between the hex digest and the salt in a stored record.
pub const RECORD_SEPARATOR: char = '.';

/// Length in bytes of every derived key. Stored digests are twice this in hex characters.
pub const DERIVED_KEY_LEN: usize = 64;

// --- Stored Record ---

/// StoredCredentialRecord
///
/// The persisted `<hex-digest>.<salt>` string, split into its two parts.
/// Records are produced elsewhere (when a credential is first set) and are only ever
/// read here. Parsing enforces exactly one separator and two non-empty parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentialRecord {
    digest: String,
    salt: String,
}

impl StoredCredentialRecord {
    /// Builds a record from an already-derived hex digest and its salt.
    pub fn new(digest: impl Into<String>, salt: impl Into<String>) -> Result<Self, VerifyError> {
        let digest = digest.into();
        let salt = salt.into();

        if digest.is_empty() {
            return Err(VerifyError::MalformedRecord("empty digest"));
        }
        if salt.is_empty() {
            return Err(VerifyError::MalformedRecord("empty salt"));
        }
        if digest.contains(RECORD_SEPARATOR) || salt.contains(RECORD_SEPARATOR) {
            return Err(VerifyError::MalformedRecord("more than one separator"));
        }

        Ok(Self { digest, salt })
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }
}

impl FromStr for StoredCredentialRecord {
    type Err = VerifyError;

    fn from_str(record: &str) -> Result<Self, Self::Err> {
        let (digest, salt) = record
            .split_once(RECORD_SEPARATOR)
            .ok_or(VerifyError::MalformedRecord("missing separator"))?;

        Self::new(digest, salt)
    }
}

impl fmt::Display for StoredCredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.digest, RECORD_SEPARATOR, self.salt)
    }
}

// --- Key Derivation Contract ---

/// KeyDerivation
///
/// The slow, salted one-way function that turns a plaintext credential into a digest.
/// The verifier only depends on this trait, so the algorithm or its cost can be upgraded
/// without touching the comparison logic.
///
/// Implementations are CPU-bound and synchronous; the verifier is responsible for
/// moving the call off the async executor. **Send + Sync** are required because one
/// instance is shared by every concurrent verification.
pub trait KeyDerivation: Send + Sync {
    /// Derives `output_len()` bytes from `plaintext` using `salt`.
    fn derive(&self, plaintext: &[u8], salt: &[u8]) -> Result<Vec<u8>, VerifyError>;

    /// Number of bytes `derive` produces.
    fn output_len(&self) -> usize {
        DERIVED_KEY_LEN
    }
}

/// ScryptCost
///
/// Cost parameters for scrypt. The default (`N = 2^14, r = 8, p = 1`) matches the
/// parameters the stored records were originally produced with; changing them makes
/// every existing record stop matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScryptCost {
    pub log_n: u8,
    pub r: u32,
    pub p: u32,
}

impl Default for ScryptCost {
    fn default() -> Self {
        Self {
            log_n: 14,
            r: 8,
            p: 1,
        }
    }
}

/// ScryptKdf
///
/// The production `KeyDerivation`: scrypt with a fixed 64-byte output. The salt is fed in
/// as the raw bytes of the string stored in the record, not hex-decoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScryptKdf {
    cost: ScryptCost,
}

impl ScryptKdf {
    /// Validates the cost parameters up front so a bad configuration fails at startup
    /// rather than on the first login attempt.
    pub fn new(cost: ScryptCost) -> Result<Self, VerifyError> {
        scrypt::Params::new(cost.log_n, cost.r, cost.p, DERIVED_KEY_LEN)
            .map_err(|e| VerifyError::InvalidParams(e.to_string()))?;
        Ok(Self { cost })
    }

    pub fn cost(&self) -> ScryptCost {
        self.cost
    }
}

impl KeyDerivation for ScryptKdf {
    fn derive(&self, plaintext: &[u8], salt: &[u8]) -> Result<Vec<u8>, VerifyError> {
        let ScryptCost { log_n, r, p } = self.cost;
        let params = scrypt::Params::new(log_n, r, p, DERIVED_KEY_LEN)
            .map_err(|e| VerifyError::Derivation(e.to_string()))?;

        let mut output = vec![0u8; DERIVED_KEY_LEN];
        scrypt::scrypt(plaintext, salt, &params, &mut output)
            .map_err(|e| VerifyError::Derivation(e.to_string()))?;
        Ok(output)
    }
}

// --- Verifier ---

/// Upper bound on derivations running at once when none is configured.
/// Each scrypt call at the default cost holds about 16 MiB while it runs.
pub fn default_derivation_limit() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// CredentialVerifier
///
/// Decides whether a plaintext credential corresponds to a stored record.
///
/// Each call is independent: the plaintext is copied into a dedicated blocking task,
/// derived, compared, and dropped. Nothing is logged or persisted, and the stored record
/// is never modified. Many verifications may be awaited at once, but only
/// `max_concurrent()` derivations run at a time; the rest wait for a permit. A started
/// derivation runs to completion.
#[derive(Clone)]
pub struct CredentialVerifier {
    kdf: Arc<dyn KeyDerivation>,
    permits: Arc<Semaphore>,
    limit: usize,
}

impl CredentialVerifier {
    pub fn new(kdf: Arc<dyn KeyDerivation>) -> Self {
        let limit = default_derivation_limit();
        Self {
            kdf,
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Convenience constructor for the scrypt verifier at a given cost.
    pub fn scrypt(cost: ScryptCost) -> Result<Self, VerifyError> {
        Ok(Self::new(Arc::new(ScryptKdf::new(cost)?)))
    }

    /// Caps the number of derivations in flight. A limit of zero is treated as one.
    pub fn with_max_concurrent(mut self, limit: usize) -> Self {
        let limit = limit.max(1);
        self.permits = Arc::new(Semaphore::new(limit));
        self.limit = limit;
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.limit
    }

    /// verify
    ///
    /// Returns `Ok(true)` iff deriving `plaintext` with the record's salt reproduces the
    /// record's hex digest exactly. A mismatch is `Ok(false)`.
    ///
    /// # Errors
    /// * `MalformedRecord` if `stored_record` is not `<digest>.<salt>`.
    /// * `Derivation` if the key-derivation function fails; this is never folded into `false`.
    /// * `Task` if the blocking derivation task dies.
    pub async fn verify(&self, plaintext: &str, stored_record: &str) -> Result<bool, VerifyError> {
        let record: StoredCredentialRecord = stored_record.parse()?;
        self.verify_record(plaintext, &record).await
    }

    /// Same as `verify`, for a record that has already been parsed.
    pub async fn verify_record(
        &self,
        plaintext: &str,
        record: &StoredCredentialRecord,
    ) -> Result<bool, VerifyError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| VerifyError::Closed)?;

        let kdf = Arc::clone(&self.kdf);
        let plaintext = plaintext.as_bytes().to_vec();
        let salt = record.salt().as_bytes().to_vec();

        // Derivation is deliberately expensive; keep it off the async worker threads.
        // The permit lives as long as the blocking task.
        let derived = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            kdf.derive(&plaintext, &salt)
        })
        .await??;

        if derived.len() != self.kdf.output_len() {
            return Err(VerifyError::Derivation(format!(
                "expected {} derived bytes, got {}",
                self.kdf.output_len(),
                derived.len()
            )));
        }

        let derived_hex = hex::encode(derived);
        Ok(constant_time_eq(
            derived_hex.as_bytes(),
            record.digest().as_bytes(),
        ))
    }
}

impl Default for CredentialVerifier {
    fn default() -> Self {
        Self::new(Arc::new(ScryptKdf::default()))
    }
}

impl fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("output_len", &self.kdf.output_len())
            .field("max_concurrent", &self.limit)
            .finish_non_exhaustive()
    }
}

/// VerifierState
///
/// The concrete type used to share the verifier across the application state.
pub type VerifierState = Arc<CredentialVerifier>;

static DEFAULT_VERIFIER: LazyLock<CredentialVerifier> =
    LazyLock::new(CredentialVerifier::default);

/// The process-wide scrypt verifier at default cost, built on first use.
pub fn default_verifier() -> &'static CredentialVerifier {
    &DEFAULT_VERIFIER
}

/// Checks `plaintext` against `stored_record` using the default scrypt parameters.
pub async fn verify(plaintext: &str, stored_record: &str) -> Result<bool, VerifyError> {
    default_verifier().verify(plaintext, stored_record).await
}

/// Byte comparison whose running time depends only on the lengths, not on where the
/// inputs first differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
