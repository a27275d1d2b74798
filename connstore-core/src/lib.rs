//! Connection profile store
//!
//! Keeps the recently used connection list, named connection profiles
//! organised into a group tree, and the link between a profile and its saved
//! password in a credential vault.
//!
//! # Crate Structure
//!
//! - [`store`] - [`ConnectionStore`], the facade over everything below
//! - [`models`] - Connection profiles and groups
//! - [`identity`] - Identity keys and credential vault keys
//! - [`groups`] - Group tree builder and group name cache
//! - [`recent`] - Recently used list
//! - [`config`] - Durable profile storage (`connections.toml`) and settings
//! - [`state`] - Key/value application state (`state.json`)
//! - [`secret`] - Credential vaults and the password coordinator
//! - [`capabilities`] - Provider metadata

// Enable missing_docs warning for public API documentation
#![warn(missing_docs)]

pub mod capabilities;
pub mod config;
pub mod error;
pub mod groups;
pub mod identity;
pub mod models;
pub mod recent;
pub mod secret;
pub mod state;
pub mod store;
pub mod tracing;

pub use capabilities::{
    CapabilitiesRegistry, CapabilitiesService, ConnectionOption, MSSQL_PROVIDER, PGSQL_PROVIDER,
    ProviderCapabilities, SpecialOption,
};
pub use config::{
    CONNECTIONS_FILE, ProfileConfig, SettingsProvider, StoreSettings, TomlProfileConfig,
    default_config_dir,
};
pub use error::{
    ConfigError, ConfigResult, ConnStoreError, ConnStoreResult, SecretError, SecretResult,
    StateError, StateResult,
};
pub use groups::{GroupNameCache, build_group_tree, flatten_tree};
pub use identity::{CredentialItemType, credential_id, identity_key};
pub use models::{ConnectionProfile, ConnectionProfileGroup, GroupRecord, NewGroup};
pub use recent::{GroupLookup, RecentConnections};
pub use secret::{
    CredentialCoordinator, CredentialVault, KeyringVault, MemoryVault, PasswordLookup,
};
pub use state::{JsonStateStore, MemoryStateStore, StateStore};
pub use store::{ConnectionStore, STATE_FILE};
pub use tracing::{TracingConfig, TracingError, TracingLevel, TracingOutput, init_tracing};
