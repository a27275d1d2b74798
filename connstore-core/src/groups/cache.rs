//! Bidirectional group id / full name cache

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{ConnectionProfileGroup, GROUP_NAME_SEPARATOR};

/// Maps group ids to full names and upper-cased full names back to ids.
///
/// Both directions are always written together. The cache knows nothing about
/// where groups come from; its owner rebuilds it from a finished group tree
/// and clears it whenever groups or profiles are mutated.
#[derive(Debug, Clone, Default)]
pub struct GroupNameCache {
    names_by_id: HashMap<Uuid, String>,
    ids_by_name: HashMap<String, Uuid>,
}

impl GroupNameCache {
    /// Creates an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a group in both directions
    pub fn record(&mut self, id: Uuid, full_name: &str) {
        self.names_by_id.insert(id, full_name.to_string());
        self.ids_by_name.insert(Self::name_key(full_name), id);
    }

    /// Looks up a group's full name
    #[must_use]
    pub fn full_name_of(&self, id: Uuid) -> Option<&str> {
        self.names_by_id.get(&id).map(String::as_str)
    }

    /// Looks up a group id by full name, ignoring case.
    ///
    /// Both `""` and the bare separator name the root group.
    #[must_use]
    pub fn id_of(&self, full_name: &str) -> Option<Uuid> {
        self.ids_by_name.get(&Self::name_key(full_name)).copied()
    }

    /// Replaces the contents with every node of a finished tree
    pub fn populate_from_tree(&mut self, roots: &[ConnectionProfileGroup]) {
        self.invalidate();
        let mut pending: Vec<&ConnectionProfileGroup> = roots.iter().collect();
        while let Some(node) = pending.pop() {
            self.record(node.id, node.full_name());
            pending.extend(node.children.iter());
        }
        tracing::debug!(groups = self.len(), "Group name cache populated");
    }

    /// Drops every entry
    pub fn invalidate(&mut self) {
        self.names_by_id.clear();
        self.ids_by_name.clear();
    }

    /// Number of cached groups
    #[must_use]
    pub fn len(&self) -> usize {
        self.names_by_id.len()
    }

    /// Returns true when nothing is cached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names_by_id.is_empty()
    }

    fn name_key(full_name: &str) -> String {
        if full_name == GROUP_NAME_SEPARATOR {
            String::new()
        } else {
            full_name.to_uppercase()
        }
    }
}
