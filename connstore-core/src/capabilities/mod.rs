//! Provider capability metadata
//!
//! Describes which connection options each provider understands, which of
//! them make up a connection's identity, and when a password is required.

use std::collections::HashMap;

use crate::models::ConnectionProfile;

/// Provider name for Microsoft SQL Server
pub const MSSQL_PROVIDER: &str = "MSSQL";

/// Provider name for PostgreSQL
pub const PGSQL_PROVIDER: &str = "PGSQL";

/// Options with a dedicated typed field on [`ConnectionProfile`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialOption {
    /// Server address
    ServerName,
    /// Database name
    DatabaseName,
    /// User name
    UserName,
    /// Authentication type
    AuthType,
    /// Password
    Password,
}

/// Describes one option a provider accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOption {
    /// Option name as it appears in the options map
    pub name: String,
    /// Typed field this option maps to, if any
    pub special: Option<SpecialOption>,
    /// Whether the option takes part in the identity key
    pub is_identity: bool,
    /// Whether the option must be supplied
    pub is_required: bool,
}

impl ConnectionOption {
    /// Creates a special option
    #[must_use]
    pub fn special(name: impl Into<String>, special: SpecialOption, is_required: bool) -> Self {
        Self {
            name: name.into(),
            special: Some(special),
            is_identity: special != SpecialOption::Password,
            is_required,
        }
    }

    /// Creates a plain, provider-specific option
    #[must_use]
    pub fn extra(name: impl Into<String>, is_identity: bool) -> Self {
        Self {
            name: name.into(),
            special: None,
            is_identity,
            is_required: false,
        }
    }

    /// Reads this option's value from a profile
    #[must_use]
    pub fn value_of<'a>(&self, profile: &'a ConnectionProfile) -> Option<&'a str> {
        match self.special {
            Some(SpecialOption::ServerName) => Some(profile.server.as_str()),
            Some(SpecialOption::DatabaseName) => profile.database.as_deref(),
            Some(SpecialOption::UserName) => profile.user.as_deref(),
            Some(SpecialOption::AuthType) => profile.auth_type.as_deref(),
            Some(SpecialOption::Password) | None => profile.option(&self.name),
        }
    }
}

/// Capability metadata for one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCapabilities {
    /// Provider name
    pub provider_name: String,
    /// Options the provider accepts
    pub options: Vec<ConnectionOption>,
    /// Authentication types that never need a password
    pub passwordless_auth_types: Vec<String>,
}

impl ProviderCapabilities {
    /// Names of the identity-relevant options, sorted
    #[must_use]
    pub fn identity_option_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .options
            .iter()
            .filter(|o| o.is_identity && o.special != Some(SpecialOption::Password))
            .map(|o| o.name.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Finds an option by name
    #[must_use]
    pub fn option(&self, name: &str) -> Option<&ConnectionOption> {
        self.options.iter().find(|o| o.name == name)
    }

    /// Finds the option mapped to a typed field
    #[must_use]
    pub fn special_option(&self, special: SpecialOption) -> Option<&ConnectionOption> {
        self.options.iter().find(|o| o.special == Some(special))
    }

    /// Returns true if this profile needs a password to connect
    #[must_use]
    pub fn is_password_required(&self, profile: &ConnectionProfile) -> bool {
        let password_required = self
            .special_option(SpecialOption::Password)
            .is_some_and(|o| o.is_required);
        if !password_required {
            return false;
        }
        profile.auth_type.as_deref().is_none_or(|auth| {
            !self
                .passwordless_auth_types
                .iter()
                .any(|t| t.eq_ignore_ascii_case(auth))
        })
    }

    /// Standard SQL Server capabilities
    #[must_use]
    pub fn mssql() -> Self {
        Self {
            provider_name: MSSQL_PROVIDER.to_string(),
            options: vec![
                ConnectionOption::special("server", SpecialOption::ServerName, true),
                ConnectionOption::special("database", SpecialOption::DatabaseName, false),
                ConnectionOption::special("user", SpecialOption::UserName, true),
                ConnectionOption::special("authenticationType", SpecialOption::AuthType, true),
                ConnectionOption::special("password", SpecialOption::Password, true),
                ConnectionOption::extra("applicationName", false),
                ConnectionOption::extra("encrypt", false),
            ],
            passwordless_auth_types: vec!["Integrated".to_string(), "AzureMFA".to_string()],
        }
    }

    /// Standard PostgreSQL capabilities
    #[must_use]
    pub fn pgsql() -> Self {
        Self {
            provider_name: PGSQL_PROVIDER.to_string(),
            options: vec![
                ConnectionOption::special("host", SpecialOption::ServerName, true),
                ConnectionOption::special("dbname", SpecialOption::DatabaseName, false),
                ConnectionOption::special("user", SpecialOption::UserName, true),
                ConnectionOption::special("authenticationType", SpecialOption::AuthType, false),
                ConnectionOption::special("password", SpecialOption::Password, true),
                ConnectionOption::extra("port", true),
                ConnectionOption::extra("sslmode", false),
            ],
            passwordless_auth_types: vec!["Integrated".to_string()],
        }
    }
}

/// Resolves capability metadata by provider name
pub trait CapabilitiesService: Send + Sync {
    /// Returns the capabilities of a provider, if it is registered
    fn provider(&self, provider_name: &str) -> Option<ProviderCapabilities>;

    /// Returns true if the profile needs a password to connect.
    ///
    /// Unknown providers never require one.
    fn is_password_required(&self, profile: &ConnectionProfile) -> bool {
        match self.provider(&profile.provider_name) {
            Some(caps) => caps.is_password_required(profile),
            None => {
                tracing::debug!(
                    provider = %profile.provider_name,
                    "No capabilities registered for provider"
                );
                false
            }
        }
    }
}

/// In-memory provider registry
#[derive(Debug, Clone, Default)]
pub struct CapabilitiesRegistry {
    providers: HashMap<String, ProviderCapabilities>,
}

impl CapabilitiesRegistry {
    /// Creates an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in providers
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ProviderCapabilities::mssql());
        registry.register(ProviderCapabilities::pgsql());
        registry
    }

    /// Registers (or replaces) a provider
    pub fn register(&mut self, capabilities: ProviderCapabilities) {
        self.providers
            .insert(capabilities.provider_name.clone(), capabilities);
    }

    /// Registered provider names, sorted
    #[must_use]
    pub fn provider_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl CapabilitiesService for CapabilitiesRegistry {
    fn provider(&self, provider_name: &str) -> Option<ProviderCapabilities> {
        self.providers.get(provider_name).cloned()
    }
}
