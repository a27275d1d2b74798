//! Connection identity and credential keys
//!
//! The identity key decides when two profiles are "the same connection". It is
//! built only from structural fields (provider, server, database, user and the
//! provider's identity options) so it is stable across password changes and
//! save-flag toggles, which lets the same key address the credential vault on
//! both read and write.

use std::fmt;

use crate::capabilities::CapabilitiesService;
use crate::models::ConnectionProfile;

/// Product prefix of every credential key
pub const CRED_PREFIX: &str = "connstore";

/// Separator between credential key components and identity key entries
pub const CRED_SEPARATOR: char = '|';

/// Prefix of the identity component in a credential key
pub const CRED_ID_PREFIX: &str = "id:";

/// Prefix of the item-type component in a credential key
pub const CRED_ITEMTYPE_PREFIX: &str = "itemtype:";

/// Name/value separator inside an identity key
const NAME_VALUE_SEPARATOR: char = ':';

/// Identity entry carrying the provider name
const PROVIDER_PROPERTY: &str = "providerName";

/// Identity options used when a provider has no registered capabilities
const FALLBACK_IDENTITY_OPTIONS: [&str; 4] = ["authenticationType", "database", "server", "user"];

/// Class of secret stored in the vault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialItemType {
    /// Password of a connection profile
    #[default]
    Profile,
}

impl fmt::Display for CredentialItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile => write!(f, "Profile"),
        }
    }
}

/// Escapes the key separator (and the escape character) inside a value
#[must_use]
pub fn escape_component(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || c == CRED_SEPARATOR {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Derives the identity key of a profile.
///
/// Format: `providerName:<p>|<name>:<value>|...|` with option names sorted.
#[must_use]
pub fn identity_key(profile: &ConnectionProfile, capabilities: &dyn CapabilitiesService) -> String {
    let mut key = String::new();
    push_entry(&mut key, PROVIDER_PROPERTY, &profile.provider_name);

    if let Some(caps) = capabilities.provider(&profile.provider_name) {
        for name in caps.identity_option_names() {
            let value = caps
                .option(name)
                .and_then(|o| o.value_of(profile))
                .unwrap_or_default();
            push_entry(&mut key, name, value);
        }
    } else {
        for name in FALLBACK_IDENTITY_OPTIONS {
            let value = match name {
                "authenticationType" => profile.auth_type.as_deref(),
                "database" => profile.database.as_deref(),
                "server" => Some(profile.server.as_str()),
                "user" => profile.user.as_deref(),
                _ => None,
            };
            push_entry(&mut key, name, value.unwrap_or_default());
        }
    }
    key
}

fn push_entry(key: &mut String, name: &str, value: &str) {
    key.push_str(name);
    key.push(NAME_VALUE_SEPARATOR);
    key.push_str(&escape_component(value));
    key.push(CRED_SEPARATOR);
}

/// Builds the vault key for a profile's secret:
/// `connstore|itemtype:<type>|id:<identity key>`
#[must_use]
pub fn credential_id(
    profile: &ConnectionProfile,
    item_type: CredentialItemType,
    capabilities: &dyn CapabilitiesService,
) -> String {
    let id = identity_key(profile, capabilities);
    format!(
        "{CRED_PREFIX}{CRED_SEPARATOR}{CRED_ITEMTYPE_PREFIX}{item_type}{CRED_SEPARATOR}{CRED_ID_PREFIX}{id}"
    )
}
