//! Property tests for saving profiles and their passwords

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use connstore_core::{
    CapabilitiesRegistry, ConfigError, ConfigResult, ConnStoreError, ConnectionProfile,
    ConnectionStore, CredentialVault, GroupRecord, MSSQL_PROVIDER, MemoryStateStore, MemoryVault,
    NewGroup, ProfileConfig, SecretError, SecretResult, StoreSettings,
};
use proptest::prelude::*;
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

/// Records every profile handed to `add_connection`
#[derive(Default)]
struct RecordingConfig {
    received: Mutex<Vec<ConnectionProfile>>,
    fail: bool,
}

impl RecordingConfig {
    fn last(&self) -> Option<ConnectionProfile> {
        self.received.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ProfileConfig for RecordingConfig {
    async fn add_connection(&self, profile: &ConnectionProfile) -> ConfigResult<ConnectionProfile> {
        self.received.lock().unwrap().push(profile.clone());
        if self.fail {
            return Err(ConfigError::Duplicate("profile".to_string()));
        }
        let mut stored = profile.clone();
        stored.id = Some(Uuid::new_v4());
        stored.group_id = Some(Uuid::new_v4());
        stored.group_full_name = Some("Assigned".to_string());
        Ok(stored)
    }

    async fn add_group(&self, _group: &NewGroup) -> ConfigResult<Uuid> {
        Ok(Uuid::new_v4())
    }

    fn get_connections(&self, _active_only: bool) -> Vec<ConnectionProfile> {
        Vec::new()
    }

    fn get_all_groups(&self) -> Vec<GroupRecord> {
        vec![GroupRecord::root()]
    }

    async fn edit_group(&self, _group: &GroupRecord) -> ConfigResult<()> {
        Ok(())
    }

    async fn delete_connection(&self, _profile: &ConnectionProfile) -> ConfigResult<()> {
        Ok(())
    }

    async fn delete_group(&self, _group: &GroupRecord) -> ConfigResult<()> {
        Ok(())
    }

    async fn change_group_id_for_connection(
        &self,
        _profile: &ConnectionProfile,
        _new_group_id: Uuid,
    ) -> ConfigResult<()> {
        Ok(())
    }

    async fn change_group_id_for_connection_group(
        &self,
        _source: &GroupRecord,
        _target: &GroupRecord,
    ) -> ConfigResult<()> {
        Ok(())
    }

    fn can_change_connection_config(
        &self,
        _profile: &ConnectionProfile,
        _new_group_id: Uuid,
    ) -> bool {
        true
    }
}

/// Vault whose every call fails
struct UnavailableVault;

#[async_trait]
impl CredentialVault for UnavailableVault {
    async fn read_credential(&self, _key: &str) -> SecretResult<Option<SecretString>> {
        Err(SecretError::BackendUnavailable("offline".to_string()))
    }

    async fn save_credential(&self, _key: &str, _password: &SecretString) -> SecretResult<bool> {
        Err(SecretError::BackendUnavailable("offline".to_string()))
    }

    async fn delete_credential(&self, _key: &str) -> SecretResult<bool> {
        Err(SecretError::BackendUnavailable("offline".to_string()))
    }

    fn backend_id(&self) -> &'static str {
        "unavailable"
    }
}

fn create_store(
    config: Arc<RecordingConfig>,
    vault: Arc<dyn CredentialVault>,
) -> ConnectionStore {
    ConnectionStore::new(
        Arc::new(MemoryStateStore::new()),
        config,
        Arc::new(StoreSettings::default()),
        Arc::new(CapabilitiesRegistry::with_defaults()),
        vault,
    )
}

fn sql_login(password: &str) -> ConnectionProfile {
    ConnectionProfile::new(MSSQL_PROVIDER, "srv")
        .with_user("sa")
        .with_auth_type("SqlLogin")
        .with_password(password)
        .saved_in("")
}

proptest! {
    /// Without forcing, the durable store never sees the password; with
    /// forcing, it sees it unchanged.
    #[test]
    fn password_reaches_config_only_when_forced(
        password in "[ -~]{1,24}",
        force in any::<bool>(),
        save_password in any::<bool>(),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let config = Arc::new(RecordingConfig::default());
        let vault = Arc::new(MemoryVault::new());
        let store = create_store(config.clone(), vault.clone());

        let mut profile = sql_login(&password);
        profile.save_password = save_password;
        rt.block_on(store.save_profile(&mut profile, force)).unwrap();

        let received = config.last().unwrap();
        if force {
            prop_assert_eq!(
                received.password().map(|p| p.expose_secret().to_string()),
                Some(password.clone())
            );
        } else {
            prop_assert!(!received.has_password());
            prop_assert!(received.option("password").is_none());
        }

        // The caller's profile keeps its password either way
        prop_assert_eq!(profile.password().unwrap().expose_secret(), password.as_str());
        prop_assert_eq!(rt.block_on(vault.len()), usize::from(save_password));
    }
}

#[tokio::test]
async fn assigned_fields_are_copied_back() {
    let config = Arc::new(RecordingConfig::default());
    let store = create_store(config, Arc::new(MemoryVault::new()));

    let mut profile = sql_login("pw");
    store.save_profile(&mut profile, false).await.unwrap();

    assert!(profile.id.is_some());
    assert!(profile.group_id.is_some());
    assert_eq!(profile.group_full_name.as_deref(), Some("Assigned"));
}

#[tokio::test]
async fn config_failure_leaves_profile_untouched() {
    let config = Arc::new(RecordingConfig {
        fail: true,
        ..RecordingConfig::default()
    });
    let store = create_store(config, Arc::new(MemoryVault::new()));

    let mut profile = sql_login("pw");
    let err = store.save_profile(&mut profile, false).await.unwrap_err();

    assert!(matches!(err, ConnStoreError::Config(ConfigError::Duplicate(_))));
    assert!(profile.id.is_none());
    assert!(profile.group_id.is_none());
    assert!(profile.database.is_none());
}

#[tokio::test]
async fn vault_failure_propagates() {
    let store = create_store(
        Arc::new(RecordingConfig::default()),
        Arc::new(UnavailableVault),
    );

    let mut profile = sql_login("pw");
    profile.save_password = true;
    let err = store.save_profile(&mut profile, false).await.unwrap_err();
    assert!(matches!(
        err,
        ConnStoreError::Secret(SecretError::BackendUnavailable(_))
    ));

    let mut bare = profile.without_password();
    bare.save_password = true;
    assert!(store.add_saved_password(bare).await.is_err());
}

#[tokio::test]
async fn not_saving_password_never_touches_vault() {
    let store = create_store(
        Arc::new(RecordingConfig::default()),
        Arc::new(UnavailableVault),
    );

    let mut profile = sql_login("pw");
    store.save_profile(&mut profile, false).await.unwrap();

    let lookup = store
        .add_saved_password(profile.without_password())
        .await
        .unwrap();
    assert!(!lookup.saved_credential);
}
