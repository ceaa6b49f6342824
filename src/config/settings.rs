//! JSON-based settings for sqltools.
//!
//! The settings file is JSON with `//` and `/* */` comments allowed.
//!
//! Example configuration:
//! ```json
//! {
//!     "debug": false,
//!     "history_size": 100,
//!     "show_records.limit": 50,
//!     "cli": { "pgsql": "psql" },
//!     "cli_options": {
//!         "pgsql": {
//!             "options": ["--no-password"],
//!             "before": [],
//!             "args": "-h {host} -p {port} -U {username} -d {database}",
//!             "queries": {
//!                 "desc": { "query": "select ...", "options": ["--tuples-only"] }
//!             }
//!         }
//!     },
//!     "format": { "keyword_case": "upper", "indent_width": 4, "reindent": true }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::jsonc::parse_jsonc;
use super::paths::{ensure_file, settings_dir, DEFAULT_SETTINGS, SETTINGS_FILENAME};
use super::profile::{deserialize_kind_map, DbKind};
use crate::command::CliCatalog;

/// Error type for settings and connection files.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("Duplicate connection name: {0}")]
    DuplicateConnection(String),

    #[error("Unsupported database type: {0}")]
    UnsupportedType(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root settings structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Emit debug logging.
    pub debug: bool,

    /// CLI executable (name on PATH or full path) per database type.
    #[serde(deserialize_with = "deserialize_kind_map")]
    pub cli: HashMap<DbKind, String>,

    /// Invocation rules and query templates per database type.
    pub cli_options: CliCatalog,

    /// SQL formatter options.
    pub format: FormatSettings,

    /// Number of executed queries kept in history.
    pub history_size: usize,

    /// Row limit substituted into "show records" queries.
    #[serde(rename = "show_records.limit")]
    pub show_records_limit: u32,

    /// Connection used when none is named explicitly.
    pub default: Option<String>,

    /// Kill a CLI that runs longer than this. No limit when unset.
    pub timeout_seconds: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            cli: HashMap::new(),
            cli_options: CliCatalog::default(),
            format: FormatSettings::default(),
            history_size: 100,
            show_records_limit: 50,
            default: None,
            timeout_seconds: None,
        }
    }
}

/// Letter case applied by the formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterCase {
    Upper,
    Lower,
    Capitalize,
}

/// SQL formatter options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatSettings {
    /// Case for keywords; unchanged when unset.
    pub keyword_case: Option<LetterCase>,

    /// Case for unquoted identifiers; unchanged when unset.
    pub identifier_case: Option<LetterCase>,

    pub strip_comments: bool,

    /// Indent with tabs instead of spaces.
    pub indent_tabs: bool,

    pub indent_width: u8,

    /// Re-layout statements. When false only case and comments change.
    pub reindent: bool,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            keyword_case: Some(LetterCase::Upper),
            identifier_case: None,
            strip_comments: false,
            indent_tabs: false,
            indent_width: 4,
            reindent: true,
        }
    }
}

impl Settings {
    /// Parse settings from JSON-with-comments text.
    pub fn parse(s: &str) -> Result<Self, SettingsError> {
        Ok(parse_jsonc(s)?)
    }

    /// Load settings from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Settings shipped with the crate.
    pub fn bundled() -> Result<Self, SettingsError> {
        Self::parse(DEFAULT_SETTINGS)
    }

    /// Load settings from the settings directory, seeding the file from the
    /// bundled defaults when it does not exist yet.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from_dir(&settings_dir()?)
    }

    /// Load settings from `dir`, seeding the file when missing.
    pub fn load_from_dir(dir: &Path) -> Result<Self, SettingsError> {
        let path = ensure_file(dir, SETTINGS_FILENAME, DEFAULT_SETTINGS)?;
        Self::from_file(path)
    }

    /// Configured executable for a database type.
    pub fn executable_for(&self, kind: DbKind) -> Option<&str> {
        self.cli.get(&kind).map(String::as_str)
    }

    /// Per-command timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}
