//! Property tests for the recently used connection list

use std::sync::Arc;

use connstore_core::{
    CapabilitiesRegistry, ConnectionProfile, ConnectionStore, MSSQL_PROVIDER, MemoryStateStore,
    MemoryVault, StoreSettings, TomlProfileConfig,
};
use proptest::prelude::*;
use tempfile::TempDir;

fn create_test_store(max_recent: Option<usize>) -> (ConnectionStore, TempDir) {
    let temp = TempDir::new().unwrap();
    let caps = Arc::new(CapabilitiesRegistry::with_defaults());
    let config = TomlProfileConfig::open(temp.path().join("connections.toml"), caps.clone()).unwrap();
    let settings = StoreSettings {
        max_recent_connections: max_recent,
        data_dir: None,
    };
    let store = ConnectionStore::new(
        Arc::new(MemoryStateStore::new()),
        Arc::new(config),
        Arc::new(settings),
        caps,
        Arc::new(MemoryVault::new()),
    );
    (store, temp)
}

fn ad_hoc(server: &str) -> ConnectionProfile {
    ConnectionProfile::new(MSSQL_PROVIDER, server).with_user("sa")
}

fn recent_servers(store: &ConnectionStore) -> Vec<String> {
    store
        .get_recently_used_connections(None)
        .into_iter()
        .map(|p| p.server)
        .collect()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Runtime::new().unwrap()
}

proptest! {
    /// N distinct adds with limit K keep exactly min(N, K) entries, newest first.
    #[test]
    fn list_is_bounded_and_newest_first(limit in 1_usize..8, count in 0_usize..16) {
        let rt = runtime();
        let (store, _temp) = create_test_store(Some(limit));

        rt.block_on(async {
            for i in 0..count {
                store.add_recent_connection(&ad_hoc(&format!("srv{i}")), false).await.unwrap();
            }
        });

        let expected: Vec<String> = (0..count)
            .rev()
            .take(limit)
            .map(|i| format!("srv{i}"))
            .collect();
        prop_assert_eq!(recent_servers(&store), expected);
    }

    /// Re-adding a connection moves it to the front instead of duplicating it.
    #[test]
    fn re_adding_moves_to_front(servers in prop::collection::vec("[a-e]", 1..20)) {
        let rt = runtime();
        let (store, _temp) = create_test_store(None);

        rt.block_on(async {
            for server in &servers {
                store.add_recent_connection(&ad_hoc(server), false).await.unwrap();
            }
        });

        let mut expected: Vec<String> = Vec::new();
        for server in &servers {
            expected.retain(|s| s != server);
            expected.insert(0, server.clone());
        }
        prop_assert_eq!(recent_servers(&store), expected);
    }

    /// Removing a connection that is not in the list leaves it unchanged.
    #[test]
    fn removing_unknown_is_a_noop(
        servers in prop::collection::hash_set("[a-z]{1,6}", 0..8),
        unknown in "[0-9]{1,6}",
    ) {
        let rt = runtime();
        let (store, _temp) = create_test_store(None);
        rt.block_on(async {
            for server in &servers {
                store.add_recent_connection(&ad_hoc(server), false).await.unwrap();
            }
        });

        let before = recent_servers(&store);
        store.remove_recent_connection(&ad_hoc(&unknown)).unwrap();
        prop_assert_eq!(recent_servers(&store), before);
    }
}

#[tokio::test]
async fn oldest_entry_is_evicted_at_limit() {
    let (store, _temp) = create_test_store(Some(2));
    for server in ["a", "b", "c"] {
        store.add_recent_connection(&ad_hoc(server), false).await.unwrap();
    }
    assert_eq!(recent_servers(&store), vec!["c", "b"]);
}

#[tokio::test]
async fn unset_limit_defaults_to_25() {
    let (store, _temp) = create_test_store(None);
    for i in 0..30 {
        store
            .add_recent_connection(&ad_hoc(&format!("srv{i}")), false)
            .await
            .unwrap();
    }
    let servers = recent_servers(&store);
    assert_eq!(servers.len(), 25);
    assert_eq!(servers[0], "srv29");
}

#[tokio::test]
async fn empty_provider_list_does_not_filter() {
    let (store, _temp) = create_test_store(None);
    store.add_recent_connection(&ad_hoc("srv"), false).await.unwrap();

    assert_eq!(store.get_recently_used_connections(None).len(), 1);
    assert_eq!(store.get_recently_used_connections(Some(&[][..])).len(), 1);
    assert!(
        store
            .get_recently_used_connections(Some(&["Oracle"][..]))
            .is_empty()
    );
}

#[tokio::test]
async fn named_profile_in_another_group_gets_its_own_slot() {
    let (store, _temp) = create_test_store(None);
    let mut prod = ad_hoc("srv").saved_in("Prod");
    let mut dev = ad_hoc("srv").saved_in("Dev");
    store.save_profile(&mut prod, false).await.unwrap();
    store.save_profile(&mut dev, false).await.unwrap();

    store.add_recent_connection(&prod, false).await.unwrap();
    store.add_recent_connection(&dev, false).await.unwrap();
    store.add_recent_connection(&prod, false).await.unwrap();

    let recent = store.get_recently_used_connections(None);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].group_full_name.as_deref(), Some("Prod"));
    assert_eq!(recent[1].group_full_name.as_deref(), Some("Dev"));

    // Ad hoc profiles collapse onto one slot regardless of group
    store.add_recent_connection(&ad_hoc("other"), false).await.unwrap();
    store.add_recent_connection(&ad_hoc("other"), false).await.unwrap();
    assert_eq!(store.get_recently_used_connections(None).len(), 3);
}
