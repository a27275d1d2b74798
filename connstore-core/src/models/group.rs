//! Connection group models
//!
//! Groups are persisted flat as [`GroupRecord`]s and assembled into a tree of
//! [`ConnectionProfileGroup`] nodes on read.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ConnectionProfile;

/// Separator between group names in a full name
pub const GROUP_NAME_SEPARATOR: &str = "/";

/// Name of the root group
pub const ROOT_GROUP_NAME: &str = "ROOT";

/// Flat, persisted group record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    /// Unique identifier
    pub id: Uuid,
    /// Display name (a single path segment)
    pub name: String,
    /// Parent group, `None` for the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    /// Optional color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl GroupRecord {
    /// Creates a new parentless group
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            parent_id: None,
            color: None,
            description: None,
        }
    }

    /// Creates a new group under a parent
    #[must_use]
    pub fn with_parent(name: impl Into<String>, parent_id: Uuid) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Self::new(name)
        }
    }

    /// Creates the root group
    #[must_use]
    pub fn root() -> Self {
        Self::new(ROOT_GROUP_NAME)
    }

    /// Returns true for the root group
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none() && self.name.eq_ignore_ascii_case(ROOT_GROUP_NAME)
    }
}

/// Request to create a group
///
/// When `id` names an existing group the store returns it unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewGroup {
    /// Id of an existing group, if known
    pub id: Option<Uuid>,
    /// Display name
    pub name: String,
    /// Parent group; `None` places the group under the root
    pub parent_id: Option<Uuid>,
    /// Optional color
    pub color: Option<String>,
    /// Optional description
    pub description: Option<String>,
}

impl NewGroup {
    /// Creates a request for a group under the root
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Places the group under a parent
    #[must_use]
    pub const fn under(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// A node of the group tree
#[derive(Debug, Clone)]
pub struct ConnectionProfileGroup {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Parent group id, `None` for top-level nodes
    pub parent_id: Option<Uuid>,
    /// Optional color
    pub color: Option<String>,
    /// Optional description
    pub description: Option<String>,
    full_name: String,
    /// Child groups, in input order
    pub children: Vec<ConnectionProfileGroup>,
    /// Member profiles
    pub connections: Vec<ConnectionProfile>,
}

impl ConnectionProfileGroup {
    /// Builds a node from its record; the full name is derived from the parent's.
    #[must_use]
    pub fn from_record(record: &GroupRecord, parent_full_name: Option<&str>) -> Self {
        let full_name = if record.is_root() {
            String::new()
        } else {
            join_full_name(parent_full_name, &record.name)
        };
        Self {
            id: record.id,
            name: record.name.clone(),
            parent_id: record.parent_id,
            color: record.color.clone(),
            description: record.description.clone(),
            full_name,
            children: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Full hierarchical name; empty for the root
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Returns true for the root group
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none() && self.name.eq_ignore_ascii_case(ROOT_GROUP_NAME)
    }

    /// Counts profiles in this node and all descendants
    #[must_use]
    pub fn total_connections(&self) -> usize {
        self.connections.len()
            + self
                .children
                .iter()
                .map(Self::total_connections)
                .sum::<usize>()
    }
}

/// Joins a parent full name and a child name
#[must_use]
pub fn join_full_name(parent_full_name: Option<&str>, name: &str) -> String {
    match parent_full_name.filter(|p| !p.is_empty()) {
        Some(parent) => format!("{parent}{GROUP_NAME_SEPARATOR}{name}"),
        None => name.to_string(),
    }
}

/// Case-insensitive group name comparison; two absent/empty names are equal
#[must_use]
pub fn same_group_name(a: Option<&str>, b: Option<&str>) -> bool {
    let a = a.unwrap_or_default();
    let b = b.unwrap_or_default();
    a.to_uppercase() == b.to_uppercase()
}
