//! Credential vault trait and in-memory implementation

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;

use crate::error::SecretResult;

/// External secret store keyed by an opaque string
///
/// Implementations own any retry policy; callers propagate failures unchanged.
#[async_trait]
pub trait CredentialVault: Send + Sync {
    /// Reads the password stored under `key`
    ///
    /// # Errors
    /// Returns `SecretError` if the backend cannot be queried.
    async fn read_credential(&self, key: &str) -> SecretResult<Option<SecretString>>;

    /// Stores a password under `key`, replacing any previous value
    ///
    /// # Errors
    /// Returns `SecretError` if the backend rejects the write.
    async fn save_credential(&self, key: &str, password: &SecretString) -> SecretResult<bool>;

    /// Removes the password stored under `key`; returns false if none existed
    ///
    /// # Errors
    /// Returns `SecretError` if the backend rejects the delete.
    async fn delete_credential(&self, key: &str) -> SecretResult<bool>;

    /// Backend identifier for logs
    fn backend_id(&self) -> &'static str;
}

/// Process-local vault
#[derive(Debug, Default)]
pub struct MemoryVault {
    secrets: RwLock<HashMap<String, SecretString>>,
}

impl MemoryVault {
    /// Creates an empty vault
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored secrets
    pub async fn len(&self) -> usize {
        self.secrets.read().await.len()
    }

    /// Returns true when nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.secrets.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialVault for MemoryVault {
    async fn read_credential(&self, key: &str) -> SecretResult<Option<SecretString>> {
        Ok(self
            .secrets
            .read()
            .await
            .get(key)
            .map(|s| SecretString::from(s.expose_secret().to_string())))
    }

    async fn save_credential(&self, key: &str, password: &SecretString) -> SecretResult<bool> {
        self.secrets.write().await.insert(
            key.to_string(),
            SecretString::from(password.expose_secret().to_string()),
        );
        Ok(true)
    }

    async fn delete_credential(&self, key: &str) -> SecretResult<bool> {
        Ok(self.secrets.write().await.remove(key).is_some())
    }

    fn backend_id(&self) -> &'static str {
        "memory"
    }
}
