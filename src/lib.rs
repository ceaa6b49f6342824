//! # sqltools
//!
//! Run SQL through database command-line clients using named connection
//! profiles.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │     Settings + Connections files (JSON with comments)    │
//! │   (CLI executables, per-type CliSpec, named profiles)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [config]
//! ┌─────────────────────────────────────────────────────────┐
//! │              Connection (profile + CliSpec)              │
//! │  list_tables, list_columns, describe_table, execute ...  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [command: ArgumentBuilder]
//! ┌─────────────────────────────────────────────────────────┐
//! │           Invocation (argv, stdin, encoding)             │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [command: ProcessRunner]
//! ┌─────────────────────────────────────────────────────────┐
//! │        psql / mysql / sqlplus / sqlite3 child process    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [command: parse_rows]
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Raw text or parsed rows                  │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod command;
pub mod config;
pub mod connection;
pub mod editor;
pub mod format;
pub mod history;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::command::{
        parse_rows, ArgumentBuilder, BuildError, CliCatalog, CliSpec, CommandError,
        CommandResult, ExecutionResult, Invocation, ProcessRunner, Runner,
    };
    pub use crate::config::{DbKind, FormatSettings, Profile, ProfileStore, Settings, SettingsError};
    pub use crate::connection::Connection;
    pub use crate::editor::EditorHost;
    pub use crate::format::format_sql;
    pub use crate::history::{HistoryError, HistoryRing, SharedHistory};
}

pub use connection::Connection;
pub use history::HistoryRing;
