//! Property tests for identity and credential keys

use connstore_core::identity::{CRED_PREFIX, CredentialItemType, credential_id, identity_key};
use connstore_core::{CapabilitiesRegistry, ConnectionProfile, MSSQL_PROVIDER, PGSQL_PROVIDER};
use proptest::prelude::*;

fn arb_profile() -> impl Strategy<Value = ConnectionProfile> {
    (
        prop_oneof![Just(MSSQL_PROVIDER), Just(PGSQL_PROVIDER), Just("Oracle")],
        "[a-z][a-z0-9.-]{0,20}",
        proptest::option::of("[A-Za-z0-9_|\\\\]{0,12}"),
        proptest::option::of("[a-z]{1,8}"),
    )
        .prop_map(|(provider, server, database, user)| {
            let mut profile = ConnectionProfile::new(provider, server);
            profile.database = database;
            profile.user = user;
            profile
        })
}

proptest! {
    /// Passwords and save flags never change the identity key.
    #[test]
    fn identity_ignores_password_and_flags(
        profile in arb_profile(),
        password in "[ -~]{0,16}",
        save_password in any::<bool>(),
        save_profile in any::<bool>(),
    ) {
        let caps = CapabilitiesRegistry::with_defaults();
        let before = identity_key(&profile, &caps);

        let mut changed = profile.clone().with_password(password);
        changed.save_password = save_password;
        changed.save_profile = save_profile;

        prop_assert_eq!(identity_key(&changed, &caps), before);
    }

    /// Changing the server, database, user or provider changes the key.
    #[test]
    fn identity_tracks_structural_fields(profile in arb_profile(), suffix in "[a-z]{1,4}") {
        let caps = CapabilitiesRegistry::with_defaults();
        let before = identity_key(&profile, &caps);

        let mut server = profile.clone();
        server.server.push_str(&suffix);
        prop_assert_ne!(identity_key(&server, &caps), before.clone());

        let mut database = profile.clone();
        database.database = Some(format!("{}{suffix}", database.database.unwrap_or_default()));
        prop_assert_ne!(identity_key(&database, &caps), before.clone());

        let mut user = profile.clone();
        user.user = Some(format!("{}{suffix}", user.user.unwrap_or_default()));
        prop_assert_ne!(identity_key(&user, &caps), before.clone());

        let mut provider = profile.clone();
        provider.provider_name.push_str(&suffix);
        prop_assert_ne!(identity_key(&provider, &caps), before);
    }

    /// Distinct identity keys give distinct credential keys, even when values
    /// contain the separator.
    #[test]
    fn credential_keys_do_not_collide(a in arb_profile(), b in arb_profile()) {
        let caps = CapabilitiesRegistry::with_defaults();
        let same_identity = identity_key(&a, &caps) == identity_key(&b, &caps);
        let same_credential = credential_id(&a, CredentialItemType::Profile, &caps)
            == credential_id(&b, CredentialItemType::Profile, &caps);
        prop_assert_eq!(same_identity, same_credential);
    }
}

#[test]
fn separator_in_database_is_escaped() {
    let caps = CapabilitiesRegistry::with_defaults();
    let tricky = ConnectionProfile::new(MSSQL_PROVIDER, "srv").with_database("a|server:x");
    let plain = ConnectionProfile::new(MSSQL_PROVIDER, "srv").with_database("a");

    let key = identity_key(&tricky, &caps);
    assert!(key.contains("database:a\\|server:x|"));
    assert_ne!(key, identity_key(&plain, &caps));
}

#[test]
fn credential_key_layout() {
    let caps = CapabilitiesRegistry::with_defaults();
    let profile = ConnectionProfile::new(MSSQL_PROVIDER, "srv").with_user("sa");
    let key = credential_id(&profile, CredentialItemType::Profile, &caps);

    assert!(key.starts_with(&format!("{CRED_PREFIX}|itemtype:Profile|id:")));
    assert!(key.ends_with(&identity_key(&profile, &caps)));
}
