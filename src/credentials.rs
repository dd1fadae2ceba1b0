use tokio::task;

/// CredentialError
///
/// Hashing can only fail on an out-of-range cost or a lost blocking task. Verification
/// never fails; it answers `false` instead.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("bcrypt: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("hashing task aborted: {0}")]
    Join(#[from] task::JoinError),
}

/// CredentialStore
///
/// Salted, one-way password hashing with bcrypt. Plaintext passwords never leave this
/// type; only `$2b$...` hashes reach the repository.
///
/// bcrypt is CPU-bound on purpose, so the async variants push the work onto tokio's
/// blocking pool instead of stalling a runtime worker.
#[derive(Debug, Clone, Copy)]
pub struct CredentialStore {
    cost: u32,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl CredentialStore {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        Ok(bcrypt::hash(plaintext, self.cost)?)
    }

    /// `false` on mismatch and on any hash that cannot be parsed.
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        bcrypt::verify(plaintext, hash).unwrap_or(false)
    }

    pub async fn hash_blocking(&self, plaintext: String) -> Result<String, CredentialError> {
        let store = *self;
        task::spawn_blocking(move || store.hash(&plaintext)).await?
    }

    pub async fn verify_blocking(&self, plaintext: String, hash: String) -> bool {
        let store = *self;
        task::spawn_blocking(move || store.verify(&plaintext, &hash))
            .await
            .unwrap_or_else(|e| {
                tracing::error!("password verification task failed: {:?}", e);
                false
            })
    }
}
