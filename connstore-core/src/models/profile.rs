//! Connection profile model

use std::collections::BTreeMap;
use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Options-map key that mirrors the typed password field
pub const PASSWORD_OPTION: &str = "password";

/// Stand-in for secret values in debug output
const MASKED: &str = "********";

/// A database endpoint description
///
/// Identity is derived, not stored: two profiles describe the same connection
/// when their identity keys match (see [`crate::identity`]). The password is
/// transient and never serialized; see [`ConnectionProfile::set_password`].
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionProfile {
    /// Persistent id, assigned by the durable store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    /// Optional display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_name: Option<String>,
    /// Server address
    #[serde(default)]
    pub server: String,
    /// Database name; `None` or empty means the server default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// User name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Provider name (e.g. `MSSQL`)
    #[serde(default)]
    pub provider_name: String,
    /// Authentication type understood by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<String>,
    #[serde(skip)]
    password: Option<SecretString>,
    /// Whether the password should be kept in the credential vault
    #[serde(default)]
    pub save_password: bool,
    /// Whether this is a named, persisted profile rather than an ad hoc one
    #[serde(default)]
    pub save_profile: bool,
    /// Owning group id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<Uuid>,
    /// Owning group's full, `/`-delimited name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_full_name: Option<String>,
    /// Provider-specific extras
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options: BTreeMap<&str, &str> = self
            .options
            .iter()
            .map(|(name, value)| {
                let value = if name == PASSWORD_OPTION {
                    MASKED
                } else {
                    value.as_str()
                };
                (name.as_str(), value)
            })
            .collect();
        f.debug_struct("ConnectionProfile")
            .field("id", &self.id)
            .field("connection_name", &self.connection_name)
            .field("server", &self.server)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("provider_name", &self.provider_name)
            .field("auth_type", &self.auth_type)
            .field("password", &self.password.as_ref().map(|_| MASKED))
            .field("save_password", &self.save_password)
            .field("save_profile", &self.save_profile)
            .field("group_id", &self.group_id)
            .field("group_full_name", &self.group_full_name)
            .field("options", &options)
            .finish()
    }
}

impl ConnectionProfile {
    /// Creates an ad hoc profile for a server
    #[must_use]
    pub fn new(provider_name: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            provider_name: provider_name.into(),
            server: server.into(),
            ..Self::default()
        }
    }

    /// Sets the database
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Sets the user
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Sets the authentication type
    #[must_use]
    pub fn with_auth_type(mut self, auth_type: impl Into<String>) -> Self {
        self.auth_type = Some(auth_type.into());
        self
    }

    /// Sets the password (see [`Self::set_password`])
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.set_password(SecretString::from(password.into()));
        self
    }

    /// Marks the profile as a named profile in the given group path
    #[must_use]
    pub fn saved_in(mut self, group_full_name: impl Into<String>) -> Self {
        self.save_profile = true;
        self.group_full_name = Some(group_full_name.into());
        self
    }

    /// Returns the transient password, if any
    #[must_use]
    pub const fn password(&self) -> Option<&SecretString> {
        self.password.as_ref()
    }

    /// Returns true when a non-empty password is present
    #[must_use]
    pub fn has_password(&self) -> bool {
        self.password
            .as_ref()
            .is_some_and(|p| !p.expose_secret().is_empty())
    }

    /// Sets the password.
    ///
    /// Some consumers read the typed field and others read the `password`
    /// entry of the options map; both are written here and only here.
    pub fn set_password(&mut self, password: SecretString) {
        self.options.insert(
            PASSWORD_OPTION.to_string(),
            password.expose_secret().to_string(),
        );
        self.password = Some(password);
    }

    /// Removes the password from both the typed field and the options map
    pub fn clear_password(&mut self) {
        self.password = None;
        self.options.remove(PASSWORD_OPTION);
    }

    /// Returns a copy with no password anywhere
    #[must_use]
    pub fn without_password(&self) -> Self {
        let mut copy = self.clone();
        copy.clear_password();
        copy
    }

    /// Returns true when no specific database is targeted
    #[must_use]
    pub fn is_default_database(&self) -> bool {
        self.database.as_deref().is_none_or(str::is_empty)
    }

    /// Fills absent credential fields with empty values so the profile can be
    /// handed to a connector immediately.
    pub fn fixup_credentials(&mut self) {
        if self.database.is_none() {
            self.database = Some(String::new());
        }
        if self.user.is_none() {
            self.user = Some(String::new());
        }
        if self.password.is_none() {
            self.set_password(SecretString::from(String::new()));
        }
    }

    /// Looks up a provider option by name
    #[must_use]
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    /// Display title: connection name, else `server (database)`
    #[must_use]
    pub fn title(&self) -> String {
        if let Some(name) = self.connection_name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        match self.database.as_deref().filter(|d| !d.is_empty()) {
            Some(db) => format!("{} ({db})", self.server),
            None => self.server.clone(),
        }
    }
}
