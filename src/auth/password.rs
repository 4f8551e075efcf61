//! Password hashing and verification using bcrypt

use std::sync::{Arc, OnceLock};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// bcrypt with a configured cost. Work runs on the blocking pool.
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    dummy: Arc<OnceLock<String>>,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            dummy: Arc::new(OnceLock::new()),
        }
    }

    pub async fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let password = password.to_owned();
        let cost = self.cost;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
        Ok(hash)
    }

    /// A malformed stored hash counts as a mismatch
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        let matched = tokio::task::spawn_blocking(move || {
            bcrypt::verify(password, &hash).unwrap_or(false)
        })
        .await?;
        Ok(matched)
    }

    /// Burn the same work as a real verification when the identity is
    /// unknown, so response timing does not reveal account existence.
    pub async fn verify_dummy(&self, password: &str) -> Result<(), PasswordError> {
        let hash = match self.dummy.get() {
            Some(hash) => hash.clone(),
            None => {
                let hash = self.hash("placeholder-credential").await?;
                self.dummy.get_or_init(|| hash).clone()
            }
        };
        self.verify(password, &hash).await?;
        Ok(())
    }
}
