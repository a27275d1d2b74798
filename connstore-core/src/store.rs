//! Connection store facade
//!
//! [`ConnectionStore`] reconciles the recently used list, the durable profile
//! configuration and the credential vault. It owns the group name cache and
//! clears it on every group or profile mutation; lookups that miss rebuild it
//! from a fresh group tree.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use uuid::Uuid;

use crate::capabilities::CapabilitiesService;
use crate::config::{CONNECTIONS_FILE, ProfileConfig, SettingsProvider, TomlProfileConfig};
use crate::error::ConnStoreResult;
use crate::groups::{GroupNameCache, build_group_tree};
use crate::models::{ConnectionProfile, ConnectionProfileGroup, GroupRecord, NewGroup};
use crate::recent::{GroupLookup, RecentConnections};
use crate::secret::{CredentialCoordinator, CredentialVault, PasswordLookup};
use crate::state::{JsonStateStore, StateStore};

/// State file name inside the data directory
pub const STATE_FILE: &str = "state.json";

/// Manages connection profiles, their groups and their saved passwords
pub struct ConnectionStore {
    config: Arc<dyn ProfileConfig>,
    settings: Arc<dyn SettingsProvider>,
    credentials: CredentialCoordinator,
    recent: RecentConnections,
    group_names: RwLock<GroupNameCache>,
}

impl std::fmt::Debug for ConnectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionStore")
            .field("credentials", &self.credentials)
            .field("group_names", &self.group_names)
            .finish_non_exhaustive()
    }
}

impl ConnectionStore {
    /// Creates a store over its collaborators
    #[must_use]
    pub fn new(
        state: Arc<dyn StateStore>,
        config: Arc<dyn ProfileConfig>,
        settings: Arc<dyn SettingsProvider>,
        capabilities: Arc<dyn CapabilitiesService>,
        vault: Arc<dyn CredentialVault>,
    ) -> Self {
        let credentials = CredentialCoordinator::new(vault, capabilities.clone());
        let recent = RecentConnections::new(state, capabilities, credentials.clone());
        Self {
            config,
            settings,
            credentials,
            recent,
            group_names: RwLock::new(GroupNameCache::new()),
        }
    }

    /// Opens a file-backed store in `dir`, using `connections.toml` for
    /// profiles and `state.json` for the recently used list.
    ///
    /// # Errors
    /// Returns an error if either file exists but cannot be loaded.
    pub fn open(
        dir: &Path,
        settings: Arc<dyn SettingsProvider>,
        capabilities: Arc<dyn CapabilitiesService>,
        vault: Arc<dyn CredentialVault>,
    ) -> ConnStoreResult<Self> {
        let state = JsonStateStore::open(dir.join(STATE_FILE))?;
        let config = TomlProfileConfig::open(dir.join(CONNECTIONS_FILE), capabilities.clone())?;
        tracing::info!(dir = %dir.display(), backend = vault.backend_id(), "Connection store opened");
        Ok(Self::new(
            Arc::new(state),
            Arc::new(config),
            settings,
            capabilities,
            vault,
        ))
    }

    // ========== Named profiles and groups ==========

    /// Saves a profile.
    ///
    /// Unless `force_write_plaintext_password` is set, the durable store never
    /// sees the password. The assigned id and group are copied back onto
    /// `profile`, the password goes to the vault when requested, and empty
    /// credential fields are filled so the profile is ready to connect.
    ///
    /// On a durable-store failure `profile` is left untouched.
    ///
    /// # Errors
    /// Returns the durable store's or the vault's error unchanged.
    pub async fn save_profile(
        &self,
        profile: &mut ConnectionProfile,
        force_write_plaintext_password: bool,
    ) -> ConnStoreResult<()> {
        let to_store = if force_write_plaintext_password {
            profile.clone()
        } else {
            profile.without_password()
        };

        let saved = self.config.add_connection(&to_store).await?;
        self.invalidate_group_cache();

        profile.id = saved.id;
        profile.group_id = saved.group_id;
        profile.group_full_name = saved.group_full_name;

        self.credentials.persist_if_needed(profile).await?;
        profile.fixup_credentials();
        Ok(())
    }

    /// Creates a group and returns its id
    ///
    /// # Errors
    /// Returns the durable store's error unchanged.
    pub async fn save_profile_group(&self, group: &NewGroup) -> ConnStoreResult<Uuid> {
        let id = self.config.add_group(group).await?;
        self.invalidate_group_cache();
        Ok(id)
    }

    /// Updates a group's name, color and description
    ///
    /// # Errors
    /// Returns the durable store's error unchanged.
    pub async fn edit_group(&self, group: &GroupRecord) -> ConnStoreResult<()> {
        let result = self.config.edit_group(group).await;
        self.invalidate_group_cache();
        Ok(result?)
    }

    /// Deletes a named profile and, if it saved one, its password
    ///
    /// # Errors
    /// Returns the durable store's or the vault's error unchanged.
    pub async fn delete_connection(&self, profile: &ConnectionProfile) -> ConnStoreResult<()> {
        let result = self.config.delete_connection(profile).await;
        self.invalidate_group_cache();
        result?;
        if profile.save_password {
            self.credentials.delete_password(profile).await?;
        }
        Ok(())
    }

    /// Deletes a group with its descendants and their profiles
    ///
    /// # Errors
    /// Returns the durable store's error unchanged.
    pub async fn delete_group(&self, group: &GroupRecord) -> ConnStoreResult<()> {
        let result = self.config.delete_group(group).await;
        self.invalidate_group_cache();
        Ok(result?)
    }

    /// Moves a profile to another group.
    ///
    /// Check [`Self::can_change_connection_config`] first.
    ///
    /// # Errors
    /// Returns the durable store's error unchanged.
    pub async fn change_group_id_for_connection(
        &self,
        profile: &ConnectionProfile,
        new_group_id: Uuid,
    ) -> ConnStoreResult<()> {
        let result = self
            .config
            .change_group_id_for_connection(profile, new_group_id)
            .await;
        self.invalidate_group_cache();
        Ok(result?)
    }

    /// Re-parents `source` under `target`
    ///
    /// # Errors
    /// Returns the durable store's error unchanged.
    pub async fn change_group_id_for_connection_group(
        &self,
        source: &GroupRecord,
        target: &GroupRecord,
    ) -> ConnStoreResult<()> {
        let result = self
            .config
            .change_group_id_for_connection_group(source, target)
            .await;
        self.invalidate_group_cache();
        Ok(result?)
    }

    /// Returns false if the target group already holds the same connection
    #[must_use]
    pub fn can_change_connection_config(
        &self,
        profile: &ConnectionProfile,
        new_group_id: Uuid,
    ) -> bool {
        self.config.can_change_connection_config(profile, new_group_id)
    }

    // ========== Recently used ==========

    /// Returns recently used connections, newest first
    #[must_use]
    pub fn get_recently_used_connections(
        &self,
        providers: Option<&[&str]>,
    ) -> Vec<ConnectionProfile> {
        self.recent.list(providers, self)
    }

    /// Records a connection as most recently used.
    ///
    /// With `connect_to_default_db` the database is dropped from the entry.
    ///
    /// # Errors
    /// Returns an error if the list cannot be stored or the vault write fails.
    pub async fn add_recent_connection(
        &self,
        profile: &ConnectionProfile,
        connect_to_default_db: bool,
    ) -> ConnStoreResult<()> {
        let max_count = self.settings.max_recent_connections();
        if connect_to_default_db {
            let mut entry = profile.clone();
            entry.database = None;
            self.recent.add(&entry, max_count, self).await?;
        } else {
            self.recent.add(profile, max_count, self).await?;
        }
        Ok(())
    }

    /// Removes a connection from the recently used list
    ///
    /// # Errors
    /// Returns an error if the list cannot be stored.
    pub fn remove_recent_connection(&self, profile: &ConnectionProfile) -> ConnStoreResult<()> {
        self.recent.remove(profile, self)
    }

    /// Empties the recently used list
    ///
    /// # Errors
    /// Returns an error if the list cannot be stored.
    pub fn clear_recently_used(&self) -> ConnStoreResult<()> {
        self.recent.clear()
    }

    // ========== Group tree and name lookups ==========

    /// Builds the group tree and refreshes the group name cache from it.
    ///
    /// Profiles whose group no longer exists are left out. `providers`
    /// restricts the attached profiles to those providers; an empty list
    /// does not filter.
    #[must_use]
    pub fn get_connection_profile_groups(
        &self,
        without_connections: bool,
        providers: Option<&[&str]>,
    ) -> Vec<ConnectionProfileGroup> {
        let groups = self.config.get_all_groups();
        let tree = if without_connections {
            build_group_tree(&groups, None)
        } else {
            let connections: Vec<ConnectionProfile> = self
                .config
                .get_connections(true)
                .into_iter()
                .filter(|c| {
                    providers
                        .filter(|names| !names.is_empty())
                        .is_none_or(|names| names.contains(&c.provider_name.as_str()))
                })
                .collect();
            build_group_tree(&groups, Some(&connections))
        };

        self.group_names
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .populate_from_tree(&tree);
        tree
    }

    /// Full name of a group, rebuilding the cache on a miss
    #[must_use]
    pub fn get_group_full_name(&self, id: Uuid) -> Option<String> {
        if let Some(name) = self.cached(|cache| cache.full_name_of(id).map(str::to_string)) {
            return Some(name);
        }
        self.rebuild_group_cache();
        self.cached(|cache| cache.full_name_of(id).map(str::to_string))
    }

    /// Id of a group by full name (case-insensitive), rebuilding the cache on
    /// a miss. `""` and `"/"` name the root group.
    #[must_use]
    pub fn get_group_id(&self, full_name: &str) -> Option<Uuid> {
        if let Some(id) = self.cached(|cache| cache.id_of(full_name)) {
            return Some(id);
        }
        self.rebuild_group_cache();
        self.cached(|cache| cache.id_of(full_name))
    }

    /// Returns a group's record
    #[must_use]
    pub fn get_group_from_id(&self, id: Uuid) -> Option<GroupRecord> {
        self.config.get_all_groups().into_iter().find(|g| g.id == id)
    }

    /// Clears the group name cache; the next lookup rebuilds it
    pub fn invalidate_group_cache(&self) {
        self.group_names
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .invalidate();
    }

    fn rebuild_group_cache(&self) {
        tracing::debug!("Group name cache miss, rebuilding");
        let _ = self.get_connection_profile_groups(true, None);
    }

    fn cached<T>(&self, f: impl FnOnce(&GroupNameCache) -> Option<T>) -> Option<T> {
        f(&self.group_names.read().unwrap_or_else(PoisonError::into_inner))
    }

    // ========== Passwords ==========

    /// Returns true if the profile needs a password to connect
    #[must_use]
    pub fn is_password_required(&self, profile: &ConnectionProfile) -> bool {
        self.credentials.is_password_required(profile)
    }

    /// Attaches the saved password to a profile when one should exist
    ///
    /// # Errors
    /// Returns the vault's error unchanged.
    pub async fn add_saved_password(
        &self,
        profile: ConnectionProfile,
    ) -> ConnStoreResult<PasswordLookup> {
        Ok(self.credentials.ensure_password(profile).await?)
    }

    /// Returns a copy of the profile with the password removed everywhere
    #[must_use]
    pub fn get_profile_without_password(&self, profile: &ConnectionProfile) -> ConnectionProfile {
        profile.without_password()
    }
}

impl GroupLookup for ConnectionStore {
    fn group_full_name(&self, id: Uuid) -> Option<String> {
        self.get_group_full_name(id)
    }

    fn group_id(&self, full_name: &str) -> Option<Uuid> {
        self.get_group_id(full_name)
    }
}
