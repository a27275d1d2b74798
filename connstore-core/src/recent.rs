//! Recently used connections
//!
//! The list lives in the state store under [`RECENT_CONNECTIONS_KEY`] as a JSON
//! array, newest first. Entries never carry a password; saved passwords go to
//! the credential vault instead.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::capabilities::CapabilitiesService;
use crate::error::ConnStoreResult;
use crate::identity::identity_key;
use crate::models::{ConnectionProfile, same_group_name};
use crate::secret::CredentialCoordinator;
use crate::state::{StateStore, get_typed, set_typed};

/// State key holding the recently used list
pub const RECENT_CONNECTIONS_KEY: &str = "recentConnections";

/// Resolves group ids and full names for stored entries
pub trait GroupLookup: Send + Sync {
    /// Full name of a group; `""` for the root
    fn group_full_name(&self, id: Uuid) -> Option<String>;

    /// Id of the group with the given full name, ignoring case
    fn group_id(&self, full_name: &str) -> Option<Uuid>;
}

/// Size-bounded, newest-first list of recently used connections
#[derive(Clone)]
pub struct RecentConnections {
    state: Arc<dyn StateStore>,
    capabilities: Arc<dyn CapabilitiesService>,
    credentials: CredentialCoordinator,
}

impl std::fmt::Debug for RecentConnections {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecentConnections")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl RecentConnections {
    /// Creates a list manager over a state store
    #[must_use]
    pub fn new(
        state: Arc<dyn StateStore>,
        capabilities: Arc<dyn CapabilitiesService>,
        credentials: CredentialCoordinator,
    ) -> Self {
        Self {
            state,
            capabilities,
            credentials,
        }
    }

    /// Records a connection at the front of the list.
    ///
    /// An existing entry for the same connection is moved rather than
    /// duplicated. `max_count` of zero keeps the list unbounded. When the
    /// profile asks for its password to be saved, it is written to the vault
    /// after the list.
    ///
    /// # Errors
    /// Returns an error if the list cannot be stored or the vault write fails.
    pub async fn add(
        &self,
        profile: &ConnectionProfile,
        max_count: usize,
        lookup: &dyn GroupLookup,
    ) -> ConnStoreResult<Vec<ConnectionProfile>> {
        let mut entry = profile.without_password();
        if entry.save_profile {
            resolve_group(&mut entry, lookup);
        }

        let mut list: Vec<ConnectionProfile> = self
            .load()
            .into_iter()
            .filter(|existing| !self.same_slot(existing, &entry))
            .collect();
        list.insert(0, entry);
        if max_count > 0 && list.len() > max_count {
            tracing::debug!(
                dropped = list.len() - max_count,
                max_count,
                "Truncating recently used list"
            );
            list.truncate(max_count);
        }
        set_typed(self.state.as_ref(), RECENT_CONNECTIONS_KEY, &list)?;

        self.credentials.persist_if_needed(profile).await?;
        Ok(list)
    }

    /// Removes a connection from the list; unknown connections are ignored
    ///
    /// # Errors
    /// Returns an error if the list cannot be stored.
    pub fn remove(
        &self,
        profile: &ConnectionProfile,
        lookup: &dyn GroupLookup,
    ) -> ConnStoreResult<()> {
        let mut target = profile.without_password();
        if target.save_profile {
            resolve_group(&mut target, lookup);
        }

        let list = self.load();
        let before = list.len();
        let list: Vec<ConnectionProfile> = list
            .into_iter()
            .filter(|existing| !self.same_slot(existing, &target))
            .collect();
        if list.len() != before {
            set_typed(self.state.as_ref(), RECENT_CONNECTIONS_KEY, &list)?;
        }
        Ok(())
    }

    /// Empties the list
    ///
    /// # Errors
    /// Returns an error if the empty list cannot be stored.
    pub fn clear(&self) -> ConnStoreResult<()> {
        set_typed(
            self.state.as_ref(),
            RECENT_CONNECTIONS_KEY,
            &Vec::<ConnectionProfile>::new(),
        )?;
        Ok(())
    }

    /// Returns the list, newest first, optionally only for some providers
    ///
    /// An empty provider list does not filter. Group fields are filled in
    /// for named profiles only.
    #[must_use]
    pub fn list(
        &self,
        providers: Option<&[&str]>,
        lookup: &dyn GroupLookup,
    ) -> Vec<ConnectionProfile> {
        self.load()
            .into_iter()
            .filter(|p| {
                providers
                    .filter(|names| !names.is_empty())
                    .is_none_or(|names| names.contains(&p.provider_name.as_str()))
            })
            .map(|mut p| {
                if p.save_profile {
                    resolve_group(&mut p, lookup);
                }
                p
            })
            .collect()
    }

    /// Reads stored entries, skipping nulls and entries that fail to parse
    fn load(&self) -> Vec<ConnectionProfile> {
        get_typed::<Vec<Value>>(self.state.as_ref(), RECENT_CONNECTIONS_KEY, Vec::new())
            .into_iter()
            .filter(|value| !value.is_null())
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed recent connection");
                    None
                }
            })
            .collect()
    }

    /// Ad hoc profiles share a slot by identity alone; named profiles also
    /// need the same group.
    fn same_slot(&self, existing: &ConnectionProfile, incoming: &ConnectionProfile) -> bool {
        let caps = self.capabilities.as_ref();
        if identity_key(existing, caps) != identity_key(incoming, caps) {
            return false;
        }
        if !incoming.save_profile {
            return true;
        }
        match (existing.group_id, incoming.group_id) {
            (Some(a), Some(b)) => a == b,
            _ => same_group_name(
                existing.group_full_name.as_deref(),
                incoming.group_full_name.as_deref(),
            ),
        }
    }
}

/// Fills in whichever of group id and full name is missing on a named
/// profile; one with neither belongs to the root group.
fn resolve_group(profile: &mut ConnectionProfile, lookup: &dyn GroupLookup) {
    match (profile.group_id, profile.group_full_name.is_some()) {
        (Some(_), true) => {}
        (Some(id), false) => profile.group_full_name = lookup.group_full_name(id),
        (None, true) => {
            profile.group_id = profile
                .group_full_name
                .as_deref()
                .and_then(|name| lookup.group_id(name));
        }
        (None, false) => {
            profile.group_id = lookup.group_id("");
            profile.group_full_name = Some(String::new());
        }
    }
}
