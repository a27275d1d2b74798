//! Decides when a profile's password is read from or written to the vault

use std::sync::Arc;

use crate::capabilities::CapabilitiesService;
use crate::error::SecretResult;
use crate::identity::{CredentialItemType, credential_id};
use crate::models::ConnectionProfile;

use super::backend::CredentialVault;

/// Outcome of [`CredentialCoordinator::ensure_password`]
#[derive(Debug, Clone)]
pub struct PasswordLookup {
    /// The profile, with the saved password attached on a hit
    pub profile: ConnectionProfile,
    /// True when a saved password was found in the vault
    pub saved_credential: bool,
}

/// Coordinates saved passwords between profiles and the credential vault
///
/// Vault failures are returned unchanged; no retry happens here.
#[derive(Clone)]
pub struct CredentialCoordinator {
    vault: Arc<dyn CredentialVault>,
    capabilities: Arc<dyn CapabilitiesService>,
}

impl std::fmt::Debug for CredentialCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCoordinator")
            .field("vault", &self.vault.backend_id())
            .finish_non_exhaustive()
    }
}

impl CredentialCoordinator {
    /// Creates a coordinator over a vault
    #[must_use]
    pub fn new(
        vault: Arc<dyn CredentialVault>,
        capabilities: Arc<dyn CapabilitiesService>,
    ) -> Self {
        Self {
            vault,
            capabilities,
        }
    }

    /// Vault key for a profile's password
    #[must_use]
    pub fn credential_id(&self, profile: &ConnectionProfile) -> String {
        credential_id(
            profile,
            CredentialItemType::Profile,
            self.capabilities.as_ref(),
        )
    }

    /// Returns true if the profile needs a password to connect
    #[must_use]
    pub fn is_password_required(&self, profile: &ConnectionProfile) -> bool {
        self.capabilities.is_password_required(profile)
    }

    /// Attaches the saved password to a profile.
    ///
    /// The vault is only consulted when the profile asks for a saved password,
    /// its provider requires one, and none is present yet.
    ///
    /// # Errors
    /// Returns the vault's `SecretError` if the read fails.
    pub async fn ensure_password(
        &self,
        mut profile: ConnectionProfile,
    ) -> SecretResult<PasswordLookup> {
        if !(profile.save_password
            && self.is_password_required(&profile)
            && !profile.has_password())
        {
            return Ok(PasswordLookup {
                profile,
                saved_credential: false,
            });
        }

        let key = self.credential_id(&profile);
        let saved = self.vault.read_credential(&key).await?;
        let saved_credential = saved.is_some();
        if let Some(password) = saved {
            profile.set_password(password);
        }
        tracing::debug!(
            server = %profile.server,
            found = saved_credential,
            backend = self.vault.backend_id(),
            "Looked up saved password"
        );

        Ok(PasswordLookup {
            profile,
            saved_credential,
        })
    }

    /// Writes the password to the vault when the profile asks for it.
    ///
    /// Not saving and having nothing to save both succeed trivially.
    ///
    /// # Errors
    /// Returns the vault's `SecretError` if the write fails.
    pub async fn persist_if_needed(&self, profile: &ConnectionProfile) -> SecretResult<bool> {
        if !profile.save_password {
            return Ok(true);
        }
        self.save_password(profile).await
    }

    /// Writes the password to the vault if one is present
    ///
    /// # Errors
    /// Returns the vault's `SecretError` if the write fails.
    pub async fn save_password(&self, profile: &ConnectionProfile) -> SecretResult<bool> {
        let Some(password) = profile.password().filter(|_| profile.has_password()) else {
            return Ok(true);
        };
        let key = self.credential_id(profile);
        let saved = self.vault.save_credential(&key, password).await?;
        tracing::debug!(
            server = %profile.server,
            backend = self.vault.backend_id(),
            "Saved password to vault"
        );
        Ok(saved)
    }

    /// Removes a profile's saved password
    ///
    /// # Errors
    /// Returns the vault's `SecretError` if the delete fails.
    pub async fn delete_password(&self, profile: &ConnectionProfile) -> SecretResult<bool> {
        let key = self.credential_id(profile);
        self.vault.delete_credential(&key).await
    }
}
