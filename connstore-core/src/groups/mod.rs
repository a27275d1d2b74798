//! Group hierarchy support
//!
//! [`build_group_tree`] assembles flat group records into a tree, and
//! [`GroupNameCache`] is populated from the finished tree in a separate pass.

mod cache;
mod tree;

pub use cache::GroupNameCache;
pub use tree::{build_group_tree, flatten_tree};
