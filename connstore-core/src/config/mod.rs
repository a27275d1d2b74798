//! Configuration: durable profile storage and store settings

mod file;
mod profiles;
pub mod settings;

pub use file::{CONNECTIONS_FILE, TomlProfileConfig};
pub use profiles::ProfileConfig;
pub use settings::{
    MAX_RECENT_CONNECTIONS_DEFAULT, MAX_RECENT_CONNECTIONS_SETTING, SETTINGS_FILE,
    SettingsProvider, StoreSettings, default_config_dir,
};
