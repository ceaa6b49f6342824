//! CLI dispatch: from a profile and a query to captured output.
//!
//! # Architecture
//!
//! ```text
//! Profile + CliSpec ──[ArgumentBuilder]──▶ Invocation (argv, stdin, encoding)
//!                                               │
//!                                          [ProcessRunner]
//!                                               │
//!                      stdin (query) ──▶  psql / mysql / sqlplus ...
//!                                               │
//!                      stdout + stderr ◀────────┘
//!                                               │
//!                                   merged text ──[parse_rows]──▶ Vec<String>
//! ```

mod builder;
mod catalog;
mod error;
mod output;
mod runner;
pub mod template;

pub use builder::{ArgumentBuilder, Invocation};
pub use catalog::{ArgsTemplate, CliCatalog, CliSpec, QuerySpec};
pub use error::{BuildError, CommandError, CommandResult};
pub use output::parse_rows;
pub use runner::{ExecutionResult, ProcessRunner, Runner};
