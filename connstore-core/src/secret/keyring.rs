//! System keyring vault via `secret-tool` (libsecret Secret Service API)
//!
//! Works with GNOME Keyring, KDE Wallet and any other Secret Service provider.

use std::process::Stdio;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::process::Command;

use crate::error::{SecretError, SecretResult};

use super::backend::CredentialVault;

/// Default application attribute for keyring entries
const APP_ID: &str = "connstore";

/// Checks whether the `secret-tool` binary is available.
pub async fn is_secret_tool_available() -> bool {
    Command::new("secret-tool")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Credential vault backed by the system keyring
#[derive(Debug, Clone)]
pub struct KeyringVault {
    application: String,
}

impl Default for KeyringVault {
    fn default() -> Self {
        Self::new(APP_ID)
    }
}

impl KeyringVault {
    /// Creates a vault whose entries carry the given `application` attribute
    #[must_use]
    pub fn new(application: impl Into<String>) -> Self {
        Self {
            application: application.into(),
        }
    }

    fn label(key: &str) -> String {
        format!("{APP_ID}: {key}")
    }
}

#[async_trait]
impl CredentialVault for KeyringVault {
    async fn read_credential(&self, key: &str) -> SecretResult<Option<SecretString>> {
        let output = Command::new("secret-tool")
            .args(["lookup", "application", self.application.as_str(), "key", key])
            .output()
            .await
            .map_err(|e| SecretError::LibSecret(format!("Failed to run secret-tool: {e}")))?;

        // secret-tool exits non-zero when the entry does not exist
        if !output.status.success() {
            return Ok(None);
        }

        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if value.is_empty() {
            Ok(None)
        } else {
            Ok(Some(SecretString::from(value)))
        }
    }

    async fn save_credential(&self, key: &str, password: &SecretString) -> SecretResult<bool> {
        use tokio::io::AsyncWriteExt;

        if !is_secret_tool_available().await {
            return Err(SecretError::BackendUnavailable(
                "secret-tool not found. Install libsecret-tools.".into(),
            ));
        }

        let label = Self::label(key);
        let mut child = Command::new("secret-tool")
            .args([
                "store",
                "--label",
                label.as_str(),
                "application",
                self.application.as_str(),
                "key",
                key,
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SecretError::LibSecret(format!("Failed to spawn secret-tool: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(password.expose_secret().as_bytes())
                .await
                .map_err(|e| SecretError::LibSecret(format!("Failed to write secret: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| SecretError::LibSecret(format!("Failed to wait for secret-tool: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SecretError::StoreFailed(format!(
                "secret-tool store failed: {stderr}"
            )));
        }

        Ok(true)
    }

    async fn delete_credential(&self, key: &str) -> SecretResult<bool> {
        let output = Command::new("secret-tool")
            .args(["clear", "application", self.application.as_str(), "key", key])
            .output()
            .await
            .map_err(|e| SecretError::LibSecret(format!("Failed to run secret-tool: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SecretError::DeleteFailed(format!(
                "secret-tool clear failed: {stderr}"
            )));
        }

        Ok(true)
    }

    fn backend_id(&self) -> &'static str {
        "libsecret"
    }
}
