//! TOML-file profile store
//!
//! Keeps `connections.toml` in memory and rewrites it after every mutation.
//! A mutation works on a copy of the document which replaces the in-memory
//! one only after the file was written, so a failed write leaves both
//! untouched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capabilities::CapabilitiesService;
use crate::error::{ConfigError, ConfigResult};
use crate::identity::identity_key;
use crate::models::{
    ConnectionProfile, GROUP_NAME_SEPARATOR, GroupRecord, NewGroup, PASSWORD_OPTION,
    join_full_name,
};

use super::profiles::ProfileConfig;

/// Profile file name inside the data directory
pub const CONNECTIONS_FILE: &str = "connections.toml";

/// On-disk form of a named profile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredProfile {
    id: Uuid,
    group_id: Uuid,
    provider_name: String,
    server: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    connection_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth_type: Option<String>,
    #[serde(default)]
    save_password: bool,
    /// Only present when a plaintext write was explicitly forced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    options: BTreeMap<String, String>,
}

impl StoredProfile {
    fn from_profile(profile: &ConnectionProfile, id: Uuid, group_id: Uuid) -> Self {
        let mut options = profile.options.clone();
        options.remove(PASSWORD_OPTION);
        Self {
            id,
            group_id,
            provider_name: profile.provider_name.clone(),
            server: profile.server.clone(),
            connection_name: profile.connection_name.clone(),
            database: profile.database.clone(),
            user: profile.user.clone(),
            auth_type: profile.auth_type.clone(),
            save_password: profile.save_password,
            password: profile
                .password()
                .map(|p| p.expose_secret().to_string())
                .filter(|p| !p.is_empty()),
            options,
        }
    }

    fn to_profile(&self, group_full_name: Option<String>) -> ConnectionProfile {
        let mut profile = ConnectionProfile::new(&self.provider_name, &self.server);
        profile.id = Some(self.id);
        profile.connection_name.clone_from(&self.connection_name);
        profile.database.clone_from(&self.database);
        profile.user.clone_from(&self.user);
        profile.auth_type.clone_from(&self.auth_type);
        profile.save_password = self.save_password;
        profile.save_profile = true;
        profile.group_id = Some(self.group_id);
        profile.group_full_name = group_full_name;
        profile.options.clone_from(&self.options);
        if let Some(password) = &self.password {
            profile.set_password(SecretString::from(password.clone()));
        }
        profile
    }
}

/// Whole `connections.toml` document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ProfileDocument {
    #[serde(default)]
    groups: Vec<GroupRecord>,
    #[serde(default)]
    connections: Vec<StoredProfile>,
}

impl ProfileDocument {
    /// Adds a root group if none exists; returns true when one was added
    fn ensure_root(&mut self) -> bool {
        if self.groups.iter().any(GroupRecord::is_root) {
            return false;
        }
        self.groups.insert(0, GroupRecord::root());
        true
    }

    fn root_id(&mut self) -> Uuid {
        self.ensure_root();
        self.groups
            .iter()
            .find(|g| g.is_root())
            .map(|g| g.id)
            .unwrap_or_default()
    }

    fn group(&self, id: Uuid) -> Option<&GroupRecord> {
        self.groups.iter().find(|g| g.id == id)
    }

    fn child_named(&self, parent_id: Uuid, name: &str) -> Option<&GroupRecord> {
        self.groups
            .iter()
            .find(|g| g.parent_id == Some(parent_id) && g.name.eq_ignore_ascii_case(name))
    }

    /// Full name of a group; empty for the root
    fn full_name(&self, id: Uuid) -> Option<String> {
        let mut segments = Vec::new();
        let mut current = self.group(id)?;
        let mut steps = 0;
        while !current.is_root() {
            segments.push(current.name.as_str());
            let Some(parent) = current.parent_id.and_then(|p| self.group(p)) else {
                break;
            };
            current = parent;
            steps += 1;
            if steps > self.groups.len() {
                break;
            }
        }
        segments.reverse();
        Some(
            segments
                .into_iter()
                .fold(String::new(), |acc, name| join_full_name(Some(acc.as_str()), name)),
        )
    }

    /// Resolves a `/`-delimited path under the root, creating missing groups
    fn ensure_group_path(&mut self, full_name: &str) -> Uuid {
        let mut current = self.root_id();
        for segment in full_name
            .split(GROUP_NAME_SEPARATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            current = if let Some(existing) = self.child_named(current, segment) {
                existing.id
            } else {
                let group = GroupRecord::with_parent(segment, current);
                let id = group.id;
                self.groups.push(group);
                id
            };
        }
        current
    }

    /// A group and all its descendants
    fn collect_descendant_groups(&self, group_id: Uuid) -> Vec<Uuid> {
        let mut result = vec![group_id];
        let mut to_process = vec![group_id];

        while let Some(current_id) = to_process.pop() {
            for group in &self.groups {
                if group.parent_id == Some(current_id) && !result.contains(&group.id) {
                    result.push(group.id);
                    to_process.push(group.id);
                }
            }
        }

        result
    }

    fn would_create_cycle(&self, group_id: Uuid, new_parent_id: Uuid) -> bool {
        self.collect_descendant_groups(group_id)
            .contains(&new_parent_id)
    }
}

/// Profile store persisted as a TOML file
pub struct TomlProfileConfig {
    path: PathBuf,
    document: RwLock<ProfileDocument>,
    capabilities: Arc<dyn CapabilitiesService>,
}

impl std::fmt::Debug for TomlProfileConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TomlProfileConfig")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl TomlProfileConfig {
    /// Opens the profile file, creating it with a root group if missing
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed or created.
    pub fn open(
        path: impl Into<PathBuf>,
        capabilities: Arc<dyn CapabilitiesService>,
    ) -> ConfigResult<Self> {
        let path = path.into();
        let mut document = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            ProfileDocument::default()
        };

        if document.ensure_root() {
            let content = Self::serialize(&document)?;
            crate::state::write_atomic(&path, &content).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
        }

        tracing::debug!(
            path = %path.display(),
            groups = document.groups.len(),
            connections = document.connections.len(),
            "Profile configuration loaded"
        );

        Ok(Self {
            path,
            document: RwLock::new(document),
            capabilities,
        })
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn snapshot(&self) -> ProfileDocument {
        self.document
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn serialize(document: &ProfileDocument) -> ConfigResult<String> {
        toml::to_string_pretty(document).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Writes the document, then makes it the current one
    async fn commit(&self, document: ProfileDocument) -> ConfigResult<()> {
        let content = Self::serialize(&document)?;
        let io_err = |source: std::io::Error| ConfigError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, content).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;

        *self.document.write().unwrap_or_else(PoisonError::into_inner) = document;
        Ok(())
    }

    fn identity(&self, profile: &ConnectionProfile) -> String {
        identity_key(profile, self.capabilities.as_ref())
    }

    fn stored_identity(&self, stored: &StoredProfile) -> String {
        self.identity(&stored.to_profile(None))
    }

    /// Index of the stored profile a caller's profile refers to: by id when it
    /// has one, otherwise by identity key within its group.
    fn position_of(&self, document: &ProfileDocument, profile: &ConnectionProfile) -> Option<usize> {
        if let Some(id) = profile.id
            && let Some(pos) = document.connections.iter().position(|c| c.id == id)
        {
            return Some(pos);
        }
        let key = self.identity(profile);
        let group_id = profile.group_id.or_else(|| {
            let name = profile.group_full_name.as_deref().unwrap_or_default();
            document
                .groups
                .iter()
                .find(|g| {
                    document
                        .full_name(g.id)
                        .is_some_and(|full| full.eq_ignore_ascii_case(name))
                })
                .map(|g| g.id)
        })?;
        document
            .connections
            .iter()
            .position(|c| c.group_id == group_id && self.stored_identity(c) == key)
    }
}

#[async_trait]
impl ProfileConfig for TomlProfileConfig {
    async fn add_connection(&self, profile: &ConnectionProfile) -> ConfigResult<ConnectionProfile> {
        if !profile.save_profile {
            return Ok(profile.clone());
        }

        let mut document = self.snapshot();
        let group_id = match profile.group_id.filter(|id| document.group(*id).is_some()) {
            Some(id) => id,
            None => match profile.group_full_name.as_deref() {
                Some(name) => document.ensure_group_path(name),
                None => document.root_id(),
            },
        };

        let key = self.identity(profile);
        let existing = document
            .connections
            .iter()
            .position(|c| c.group_id == group_id && self.stored_identity(c) == key)
            .or_else(|| {
                profile
                    .id
                    .and_then(|id| document.connections.iter().position(|c| c.id == id))
            });

        let stored = match existing {
            Some(pos) => {
                let stored = StoredProfile::from_profile(
                    profile,
                    document.connections[pos].id,
                    group_id,
                );
                document.connections[pos] = stored.clone();
                stored
            }
            None => {
                let stored = StoredProfile::from_profile(profile, Uuid::new_v4(), group_id);
                document.connections.push(stored.clone());
                stored
            }
        };

        let full_name = document.full_name(group_id);
        self.commit(document).await?;
        tracing::debug!(
            connection_id = %stored.id,
            group_id = %group_id,
            replaced = existing.is_some(),
            "Profile saved"
        );
        Ok(stored.to_profile(full_name))
    }

    async fn add_group(&self, group: &NewGroup) -> ConfigResult<Uuid> {
        let mut document = self.snapshot();
        if let Some(id) = group.id
            && document.group(id).is_some()
        {
            return Ok(id);
        }

        let name = group.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Validation {
                field: "name".to_string(),
                reason: "Group name cannot be empty".to_string(),
            });
        }
        if name.contains(GROUP_NAME_SEPARATOR) {
            return Err(ConfigError::Validation {
                field: "name".to_string(),
                reason: format!("Group name cannot contain '{GROUP_NAME_SEPARATOR}'"),
            });
        }

        let parent_id = match group.parent_id {
            Some(id) if document.group(id).is_some() => id,
            Some(id) => return Err(ConfigError::NotFound(format!("Parent group {id}"))),
            None => document.root_id(),
        };
        if document.child_named(parent_id, name).is_some() {
            return Err(ConfigError::Duplicate(format!(
                "A group named '{name}' already exists here"
            )));
        }

        let mut record = GroupRecord::with_parent(name, parent_id);
        record.color = group.color.clone();
        record.description = group.description.clone();
        let id = record.id;
        document.groups.push(record);

        self.commit(document).await?;
        tracing::debug!(group_id = %id, parent_id = %parent_id, "Group created");
        Ok(id)
    }

    fn get_connections(&self, active_only: bool) -> Vec<ConnectionProfile> {
        let document = self.document.read().unwrap_or_else(PoisonError::into_inner);
        document
            .connections
            .iter()
            .filter_map(|c| {
                let full_name = document.full_name(c.group_id);
                if active_only && full_name.is_none() {
                    return None;
                }
                Some(c.to_profile(full_name))
            })
            .collect()
    }

    fn get_all_groups(&self) -> Vec<GroupRecord> {
        self.document
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .groups
            .clone()
    }

    async fn edit_group(&self, group: &GroupRecord) -> ConfigResult<()> {
        let mut document = self.snapshot();
        let current = document
            .group(group.id)
            .cloned()
            .ok_or_else(|| ConfigError::NotFound(format!("Group {}", group.id)))?;

        if current.is_root() && !group.name.eq_ignore_ascii_case(&current.name) {
            return Err(ConfigError::Validation {
                field: "name".to_string(),
                reason: "The root group cannot be renamed".to_string(),
            });
        }
        if let Some(parent_id) = current.parent_id
            && document
                .child_named(parent_id, &group.name)
                .is_some_and(|g| g.id != group.id)
        {
            return Err(ConfigError::Duplicate(format!(
                "A group named '{}' already exists here",
                group.name
            )));
        }

        if let Some(target) = document.groups.iter_mut().find(|g| g.id == group.id) {
            target.name = group.name.clone();
            target.color = group.color.clone();
            target.description = group.description.clone();
        }
        self.commit(document).await
    }

    async fn delete_connection(&self, profile: &ConnectionProfile) -> ConfigResult<()> {
        let mut document = self.snapshot();
        let pos = self
            .position_of(&document, profile)
            .ok_or_else(|| ConfigError::NotFound(format!("Connection {}", profile.title())))?;
        let removed = document.connections.remove(pos);
        self.commit(document).await?;
        tracing::debug!(connection_id = %removed.id, "Profile deleted");
        Ok(())
    }

    async fn delete_group(&self, group: &GroupRecord) -> ConfigResult<()> {
        let mut document = self.snapshot();
        let current = document
            .group(group.id)
            .ok_or_else(|| ConfigError::NotFound(format!("Group {}", group.id)))?;
        if current.is_root() {
            return Err(ConfigError::Validation {
                field: "id".to_string(),
                reason: "The root group cannot be deleted".to_string(),
            });
        }

        let doomed = document.collect_descendant_groups(group.id);
        document.groups.retain(|g| !doomed.contains(&g.id));
        let before = document.connections.len();
        document.connections.retain(|c| !doomed.contains(&c.group_id));
        let removed_connections = before - document.connections.len();

        self.commit(document).await?;
        tracing::debug!(
            group_id = %group.id,
            groups = doomed.len(),
            connections = removed_connections,
            "Group deleted"
        );
        Ok(())
    }

    async fn change_group_id_for_connection(
        &self,
        profile: &ConnectionProfile,
        new_group_id: Uuid,
    ) -> ConfigResult<()> {
        let mut document = self.snapshot();
        if document.group(new_group_id).is_none() {
            return Err(ConfigError::NotFound(format!("Group {new_group_id}")));
        }
        let pos = self
            .position_of(&document, profile)
            .ok_or_else(|| ConfigError::NotFound(format!("Connection {}", profile.title())))?;
        document.connections[pos].group_id = new_group_id;
        self.commit(document).await
    }

    async fn change_group_id_for_connection_group(
        &self,
        source: &GroupRecord,
        target: &GroupRecord,
    ) -> ConfigResult<()> {
        let mut document = self.snapshot();
        let Some(current) = document.group(source.id) else {
            return Err(ConfigError::NotFound(format!("Group {}", source.id)));
        };
        if current.is_root() {
            return Err(ConfigError::Validation {
                field: "id".to_string(),
                reason: "The root group cannot be moved".to_string(),
            });
        }
        if document.group(target.id).is_none() {
            return Err(ConfigError::NotFound(format!("Group {}", target.id)));
        }
        if document.would_create_cycle(source.id, target.id) {
            return Err(ConfigError::Validation {
                field: "parent_id".to_string(),
                reason: "Moving group would create a cycle in the hierarchy".to_string(),
            });
        }

        if let Some(group) = document.groups.iter_mut().find(|g| g.id == source.id) {
            group.parent_id = Some(target.id);
        }
        self.commit(document).await
    }

    fn can_change_connection_config(
        &self,
        profile: &ConnectionProfile,
        new_group_id: Uuid,
    ) -> bool {
        let document = self.document.read().unwrap_or_else(PoisonError::into_inner);
        let key = self.identity(profile);
        !document
            .connections
            .iter()
            .any(|c| c.group_id == new_group_id && self.stored_identity(c) == key)
    }
}
