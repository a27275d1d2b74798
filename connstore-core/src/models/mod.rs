//! Core data structures for connection profiles and groups

mod group;
mod profile;

pub use group::{
    ConnectionProfileGroup, GROUP_NAME_SEPARATOR, GroupRecord, NewGroup, ROOT_GROUP_NAME,
    join_full_name, same_group_name,
};
pub use profile::{ConnectionProfile, PASSWORD_OPTION};
