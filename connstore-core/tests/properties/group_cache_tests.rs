//! Property tests for group name lookups and the group tree

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use connstore_core::{
    CapabilitiesRegistry, ConfigResult, ConnectionProfile, ConnectionStore, GroupRecord,
    MSSQL_PROVIDER, MemoryStateStore, MemoryVault, NewGroup, ProfileConfig, StoreSettings,
    TomlProfileConfig, build_group_tree, flatten_tree,
};
use proptest::prelude::*;
use tempfile::TempDir;
use uuid::Uuid;

/// Delegates to a real store and counts full group reads
struct CountingConfig {
    inner: TomlProfileConfig,
    group_reads: AtomicUsize,
}

impl CountingConfig {
    fn reads(&self) -> usize {
        self.group_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileConfig for CountingConfig {
    async fn add_connection(&self, profile: &ConnectionProfile) -> ConfigResult<ConnectionProfile> {
        self.inner.add_connection(profile).await
    }

    async fn add_group(&self, group: &NewGroup) -> ConfigResult<Uuid> {
        self.inner.add_group(group).await
    }

    fn get_connections(&self, active_only: bool) -> Vec<ConnectionProfile> {
        self.inner.get_connections(active_only)
    }

    fn get_all_groups(&self) -> Vec<GroupRecord> {
        self.group_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_all_groups()
    }

    async fn edit_group(&self, group: &GroupRecord) -> ConfigResult<()> {
        self.inner.edit_group(group).await
    }

    async fn delete_connection(&self, profile: &ConnectionProfile) -> ConfigResult<()> {
        self.inner.delete_connection(profile).await
    }

    async fn delete_group(&self, group: &GroupRecord) -> ConfigResult<()> {
        self.inner.delete_group(group).await
    }

    async fn change_group_id_for_connection(
        &self,
        profile: &ConnectionProfile,
        new_group_id: Uuid,
    ) -> ConfigResult<()> {
        self.inner
            .change_group_id_for_connection(profile, new_group_id)
            .await
    }

    async fn change_group_id_for_connection_group(
        &self,
        source: &GroupRecord,
        target: &GroupRecord,
    ) -> ConfigResult<()> {
        self.inner
            .change_group_id_for_connection_group(source, target)
            .await
    }

    fn can_change_connection_config(
        &self,
        profile: &ConnectionProfile,
        new_group_id: Uuid,
    ) -> bool {
        self.inner.can_change_connection_config(profile, new_group_id)
    }
}

fn create_counting_store(temp: &TempDir) -> (ConnectionStore, Arc<CountingConfig>) {
    let caps = Arc::new(CapabilitiesRegistry::with_defaults());
    let config = Arc::new(CountingConfig {
        inner: TomlProfileConfig::open(temp.path().join("connections.toml"), caps.clone())
            .unwrap(),
        group_reads: AtomicUsize::new(0),
    });
    let store = ConnectionStore::new(
        Arc::new(MemoryStateStore::new()),
        config.clone(),
        Arc::new(StoreSettings::default()),
        caps,
        Arc::new(MemoryVault::new()),
    );
    (store, config)
}

/// Group paths such as `a/b/c`, a few levels deep
fn arb_group_paths() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::collection::vec("[A-Za-z][A-Za-z0-9 ]{0,6}", 1..4).prop_map(|segments| {
            segments
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("/")
        }),
        1..6,
    )
}

proptest! {
    /// Every stored group resolves to its full name and back to itself.
    #[test]
    fn group_names_round_trip(paths in arb_group_paths()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let temp = TempDir::new().unwrap();
        let (store, config) = create_counting_store(&temp);

        rt.block_on(async {
            for (i, path) in paths.iter().enumerate() {
                let mut profile = ConnectionProfile::new(MSSQL_PROVIDER, format!("srv{i}"))
                    .saved_in(path.clone());
                store.save_profile(&mut profile, false).await.unwrap();
            }
        });

        for group in config.inner.get_all_groups() {
            let full_name = store.get_group_full_name(group.id);
            prop_assert!(full_name.is_some());
            let full_name = full_name.unwrap_or_default();
            prop_assert_eq!(store.get_group_id(&full_name), Some(group.id));
            // Case does not matter for reverse lookups
            prop_assert_eq!(store.get_group_id(&full_name.to_uppercase()), Some(group.id));
        }
    }

    /// The tree holds every group exactly once and every active profile.
    #[test]
    fn tree_covers_all_groups(paths in arb_group_paths()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let temp = TempDir::new().unwrap();
        let (store, config) = create_counting_store(&temp);

        rt.block_on(async {
            for (i, path) in paths.iter().enumerate() {
                let mut profile = ConnectionProfile::new(MSSQL_PROVIDER, format!("srv{i}"))
                    .saved_in(path.clone());
                store.save_profile(&mut profile, false).await.unwrap();
            }
        });

        let groups = config.inner.get_all_groups();
        let tree = store.get_connection_profile_groups(false, None);
        prop_assert_eq!(flatten_tree(&tree).len(), groups.len());
        let total: usize = tree.iter().map(|g| g.total_connections()).sum();
        prop_assert_eq!(total, paths.len());
    }
}

#[test]
fn cache_miss_rebuilds_once_then_hits() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let temp = TempDir::new().unwrap();
    let (store, config) = create_counting_store(&temp);
    let id = rt
        .block_on(store.save_profile_group(&NewGroup::new("Prod")))
        .unwrap();

    let before = config.reads();
    assert_eq!(store.get_group_full_name(id).as_deref(), Some("Prod"));
    assert_eq!(config.reads(), before + 1);

    assert_eq!(store.get_group_full_name(id).as_deref(), Some("Prod"));
    assert_eq!(store.get_group_id("PROD"), Some(id));
    assert_eq!(config.reads(), before + 1);
}

#[test]
fn mutation_invalidates_cache() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let temp = TempDir::new().unwrap();
    let (store, config) = create_counting_store(&temp);
    let id = rt
        .block_on(store.save_profile_group(&NewGroup::new("Prod")))
        .unwrap();
    assert!(store.get_group_full_name(id).is_some());
    let reads = config.reads();

    rt.block_on(store.save_profile_group(&NewGroup::new("Dev")))
        .unwrap();
    assert!(store.get_group_full_name(id).is_some());
    assert_eq!(config.reads(), reads + 1);
}

#[test]
fn unknown_group_is_a_soft_miss() {
    let temp = TempDir::new().unwrap();
    let (store, _config) = create_counting_store(&temp);
    assert_eq!(store.get_group_full_name(Uuid::new_v4()), None);
    assert_eq!(store.get_group_id("Nowhere"), None);
    assert!(store.get_group_from_id(Uuid::new_v4()).is_none());
}

#[test]
fn tree_keeps_input_order() {
    let root = GroupRecord::root();
    let b = GroupRecord::with_parent("b", root.id);
    let a = GroupRecord::with_parent("a", root.id);
    let tree = build_group_tree(&[root, b, a], None);

    let names: Vec<&str> = tree[0].children.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["b", "a"]);
}

#[test]
fn ad_hoc_recent_entries_do_not_touch_the_cache() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let temp = TempDir::new().unwrap();
    let (store, config) = create_counting_store(&temp);

    let mut stale = ConnectionProfile::new(MSSQL_PROVIDER, "srv");
    stale.group_full_name = Some("Gone".to_string());
    rt.block_on(async {
        store.add_recent_connection(&stale, false).await.unwrap();
        store
            .add_recent_connection(&ConnectionProfile::new(MSSQL_PROVIDER, "other"), false)
            .await
            .unwrap();
    });

    let before = config.reads();
    for _ in 0..4 {
        let recent = store.get_recently_used_connections(None);
        assert_eq!(recent.len(), 2);
        assert!(recent.iter().all(|p| p.group_id.is_none()));
    }
    assert_eq!(config.reads(), before);
}
