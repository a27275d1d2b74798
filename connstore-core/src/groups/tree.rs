//! Group tree construction from flat records

use std::collections::HashSet;

use uuid::Uuid;

use crate::models::{ConnectionProfile, ConnectionProfileGroup, GroupRecord};

/// Builds the nested group tree.
///
/// Top-level nodes are the records without a parent. Each node receives the
/// profiles whose `group_id` matches it, stamped with the node's full name.
/// Sibling order follows the input order; no sorting is applied. Passing
/// `None` for `connections` builds the bare group hierarchy.
#[must_use]
pub fn build_group_tree(
    groups: &[GroupRecord],
    connections: Option<&[ConnectionProfile]>,
) -> Vec<ConnectionProfileGroup> {
    let mut visited = HashSet::new();
    build_children(groups, connections, None, &mut visited)
}

fn build_children(
    groups: &[GroupRecord],
    connections: Option<&[ConnectionProfile]>,
    parent: Option<&ConnectionProfileGroup>,
    visited: &mut HashSet<Uuid>,
) -> Vec<ConnectionProfileGroup> {
    let parent_id = parent.map(|p| p.id);
    let parent_full_name = parent.map(ConnectionProfileGroup::full_name);
    let mut result = Vec::new();

    for record in groups.iter().filter(|g| g.parent_id == parent_id) {
        if !visited.insert(record.id) {
            tracing::warn!(group_id = %record.id, "Skipping duplicate group record");
            continue;
        }

        let mut node = ConnectionProfileGroup::from_record(record, parent_full_name);
        if let Some(connections) = connections {
            node.connections = connections
                .iter()
                .filter(|c| c.group_id == Some(node.id))
                .map(|c| {
                    let mut conn = c.clone();
                    conn.group_full_name = Some(node.full_name().to_string());
                    conn
                })
                .collect();
        }
        node.children = build_children(groups, connections, Some(&node), visited);
        result.push(node);
    }

    result
}

/// Flattens a tree into depth-first order
#[must_use]
pub fn flatten_tree(roots: &[ConnectionProfileGroup]) -> Vec<&ConnectionProfileGroup> {
    let mut result = Vec::new();
    for root in roots {
        result.push(root);
        result.extend(flatten_tree(&root.children));
    }
    result
}
