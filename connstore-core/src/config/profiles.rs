//! Durable profile and group store interface

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ConfigResult;
use crate::models::{ConnectionProfile, GroupRecord, NewGroup};

/// Durable storage for named profiles and their groups
///
/// Reads are served from memory and never fail; mutations are asynchronous
/// and surface persistence failures to the caller.
#[async_trait]
pub trait ProfileConfig: Send + Sync {
    /// Persists a named profile, resolving its group.
    ///
    /// Returns the stored profile with its assigned id, group id and group
    /// full name.
    ///
    /// # Errors
    /// Returns `ConfigError` if the profile cannot be stored.
    async fn add_connection(&self, profile: &ConnectionProfile) -> ConfigResult<ConnectionProfile>;

    /// Creates a group and returns its id
    ///
    /// # Errors
    /// Returns `ConfigError::Duplicate` if a sibling with the same name exists.
    async fn add_group(&self, group: &NewGroup) -> ConfigResult<Uuid>;

    /// Returns stored profiles; `active_only` omits profiles whose group is gone
    fn get_connections(&self, active_only: bool) -> Vec<ConnectionProfile>;

    /// Returns every group record, root included
    fn get_all_groups(&self) -> Vec<GroupRecord>;

    /// Updates a group's name, color and description
    ///
    /// # Errors
    /// Returns `ConfigError` if the group is unknown or the new name clashes.
    async fn edit_group(&self, group: &GroupRecord) -> ConfigResult<()>;

    /// Deletes a stored profile
    ///
    /// # Errors
    /// Returns `ConfigError::NotFound` if no stored profile matches.
    async fn delete_connection(&self, profile: &ConnectionProfile) -> ConfigResult<()>;

    /// Deletes a group, its descendants and every profile inside them
    ///
    /// # Errors
    /// Returns `ConfigError` if the group is unknown or is the root.
    async fn delete_group(&self, group: &GroupRecord) -> ConfigResult<()>;

    /// Moves a stored profile to another group.
    ///
    /// Callers check [`Self::can_change_connection_config`] first; the move
    /// itself does not re-validate.
    ///
    /// # Errors
    /// Returns `ConfigError::NotFound` if the profile or group is unknown.
    async fn change_group_id_for_connection(
        &self,
        profile: &ConnectionProfile,
        new_group_id: Uuid,
    ) -> ConfigResult<()>;

    /// Re-parents `source` under `target`
    ///
    /// # Errors
    /// Returns `ConfigError` if either group is unknown or the move would
    /// create a cycle.
    async fn change_group_id_for_connection_group(
        &self,
        source: &GroupRecord,
        target: &GroupRecord,
    ) -> ConfigResult<()>;

    /// Returns false if the target group already holds the same connection
    fn can_change_connection_config(&self, profile: &ConnectionProfile, new_group_id: Uuid)
    -> bool;
}
