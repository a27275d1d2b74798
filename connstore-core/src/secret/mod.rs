//! Saved password management
//!
//! Passwords never go to the profile configuration file unless explicitly
//! forced. They live in a [`CredentialVault`]:
//! - [`KeyringVault`] for GNOME Keyring/KDE Wallet via libsecret
//! - [`MemoryVault`] for tests and ephemeral sessions
//!
//! [`CredentialCoordinator`] decides when the vault is read or written.

mod backend;
mod coordinator;
mod keyring;

pub use backend::{CredentialVault, MemoryVault};
pub use coordinator::{CredentialCoordinator, PasswordLookup};
pub use keyring::{KeyringVault, is_secret_tool_available};
