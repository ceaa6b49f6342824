//! Configuration module for sqltools.
//!
//! Handles the settings file, the connections file, and the settings
//! directory they live in.

mod jsonc;
mod paths;
mod profile;
mod settings;

pub use jsonc::{parse_jsonc, strip_comments};
pub use paths::{
    ensure_file, settings_dir, CONNECTIONS_FILENAME, DEFAULT_CONNECTIONS, DEFAULT_SETTINGS,
    SETTINGS_FILENAME,
};
pub use profile::{expand_env_vars, DbKind, Profile, ProfileStore};
pub(crate) use profile::deserialize_kind_map;
pub use settings::{FormatSettings, LetterCase, Settings, SettingsError};
