//! High-level operations against one connection profile.
//!
//! Every operation follows the same path: pick the query template from the
//! profile's [`CliSpec`], build the argv, run the CLI, then return the raw
//! text or the rows parsed out of it.

use std::path::PathBuf;
use std::sync::PoisonError;

use tokio::sync::Mutex;

use crate::command::template::{render_positional, substitute_percent};
use crate::command::{
    parse_rows, ArgumentBuilder, CliSpec, CommandError, CommandResult, ProcessRunner, Runner,
};
use crate::config::{DbKind, Profile, Settings};
use crate::history::SharedHistory;

/// Logical query listing tables.
pub const QUERY_TABLES: &str = "desc";
/// Logical query listing columns.
pub const QUERY_COLUMNS: &str = "columns";
/// Logical query listing functions.
pub const QUERY_FUNCTIONS: &str = "functions";
/// Logical query describing one table (`%s` = table).
pub const QUERY_DESC_TABLE: &str = "desc table";
/// Logical query describing one function (`%s` = function).
pub const QUERY_DESC_FUNCTION: &str = "desc function";
/// Logical query selecting rows (`{0}` = table, `{1}` = limit).
pub const QUERY_SHOW_RECORDS: &str = "show records";

/// Default row limit for [`Connection::show_records`].
pub const DEFAULT_ROWS_LIMIT: u32 = 50;

/// Find the CLI executable configured for a database type.
pub fn resolve_executable(kind: DbKind, settings: &Settings) -> CommandResult<PathBuf> {
    let name = settings
        .executable_for(kind)
        .ok_or_else(|| CommandError::ConfigurationMissing {
            kind,
            reason: "no executable set under \"cli\" in the settings".to_string(),
        })?;

    which::which(name).map_err(|e| CommandError::ConfigurationMissing {
        kind,
        reason: format!(
            "'{}' could not be found ({}); set its path under \"cli\" in the settings",
            name, e
        ),
    })
}

/// A profile bound to its CLI.
///
/// Only one query runs at a time per connection; concurrent calls wait for
/// the one in flight. Each call spawns a fresh process.
pub struct Connection<R = ProcessRunner> {
    profile: Profile,
    spec: CliSpec,
    executable: String,
    rows_limit: u32,
    history: SharedHistory,
    runner: R,
    in_flight: Mutex<()>,
}

impl Connection<ProcessRunner> {
    /// Bind a profile using the settings' catalog and executable table.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` if the settings have no CLI options for the
    /// profile's type and `ConfigurationMissing` if its executable cannot be
    /// found.
    pub fn open(profile: Profile, settings: &Settings, history: SharedHistory) -> CommandResult<Self> {
        let spec = settings.cli_options.spec_for(profile.kind)?.clone();
        let executable = resolve_executable(profile.kind, settings)?;
        let runner = ProcessRunner::new().with_timeout(settings.timeout());

        tracing::debug!(
            connection = %profile.name,
            executable = %executable.display(),
            "opened connection"
        );

        Ok(
            Self::with_runner(profile, spec, executable.to_string_lossy(), runner, history)
                .with_rows_limit(settings.show_records_limit),
        )
    }
}

impl<R: Runner> Connection<R> {
    /// Bind a profile to an explicit executable and runner.
    pub fn with_runner(
        profile: Profile,
        spec: CliSpec,
        executable: impl Into<String>,
        runner: R,
        history: SharedHistory,
    ) -> Self {
        Self {
            profile,
            spec,
            executable: executable.into(),
            rows_limit: DEFAULT_ROWS_LIMIT,
            history,
            runner,
            in_flight: Mutex::new(()),
        }
    }

    /// Set the row limit used by [`Connection::show_records`].
    pub fn with_rows_limit(mut self, rows_limit: u32) -> Self {
        self.rows_limit = rows_limit;
        self
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn spec(&self) -> &CliSpec {
        &self.spec
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub fn history(&self) -> &SharedHistory {
        &self.history
    }

    /// List tables (the `desc` query), one per parsed row.
    pub async fn list_tables(&self) -> CommandResult<Vec<String>> {
        let query = self.spec.query(QUERY_TABLES)?.query.clone();
        let text = self.dispatch(Some(QUERY_TABLES), query).await?;
        Ok(parse_rows(&text))
    }

    /// List columns, or nothing if this database type has no `columns` query.
    pub async fn list_columns(&self) -> CommandResult<Vec<String>> {
        self.list_if_supported(QUERY_COLUMNS).await
    }

    /// List functions, or nothing if this database type has no `functions` query.
    pub async fn list_functions(&self) -> CommandResult<Vec<String>> {
        self.list_if_supported(QUERY_FUNCTIONS).await
    }

    /// Describe a table; returns the CLI's text.
    pub async fn describe_table(&self, table: &str) -> CommandResult<String> {
        let query = substitute_percent(&self.spec.query(QUERY_DESC_TABLE)?.query, table)?;
        self.dispatch(Some(QUERY_DESC_TABLE), query).await
    }

    /// Describe a function; returns the CLI's text.
    pub async fn describe_function(&self, function: &str) -> CommandResult<String> {
        let query = substitute_percent(&self.spec.query(QUERY_DESC_FUNCTION)?.query, function)?;
        self.dispatch(Some(QUERY_DESC_FUNCTION), query).await
    }

    /// Select up to the configured row limit from a table; returns the CLI's text.
    pub async fn show_records(&self, table: &str) -> CommandResult<String> {
        let limit = self.rows_limit.to_string();
        let query = render_positional(&self.spec.query(QUERY_SHOW_RECORDS)?.query, &[table, &limit])?;
        self.dispatch(Some(QUERY_SHOW_RECORDS), query).await
    }

    /// Execute one free-form query.
    pub async fn execute(&self, query: &str) -> CommandResult<String> {
        self.execute_batch([query]).await
    }

    /// Execute queries in order as one CLI run.
    ///
    /// The [`CliSpec`] `before` statements are prepended and every statement
    /// goes on its own line. The composed text is recorded in the history.
    pub async fn execute_batch<I, S>(&self, queries: I) -> CommandResult<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let query = self.compose(queries);
        tracing::debug!(query = %query, "query");

        if !query.is_empty() {
            self.history
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .add(query.clone());
        }

        self.dispatch(None, query).await
    }

    /// The text [`Connection::execute_batch`] would send.
    pub fn compose<I, S>(&self, queries: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut text = String::new();
        for statement in &self.spec.before {
            text.push_str(statement);
            text.push('\n');
        }
        for query in queries {
            text.push_str(query.as_ref());
            text.push('\n');
        }
        text.truncate(text.trim_end_matches('\n').len());
        text
    }

    async fn list_if_supported(&self, name: &str) -> CommandResult<Vec<String>> {
        if !self.spec.supports(name) {
            tracing::debug!(
                connection = %self.profile.name,
                kind = %self.profile.kind,
                query = name,
                "query not supported, returning no rows"
            );
            return Ok(Vec::new());
        }

        let query = self.spec.query(name)?.query.clone();
        let text = self.dispatch(Some(name), query).await?;
        Ok(parse_rows(&text))
    }

    async fn dispatch(&self, query_name: Option<&str>, query: String) -> CommandResult<String> {
        let invocation = ArgumentBuilder::new(&self.executable, &self.spec, &self.profile)
            .build(query_name)?
            .with_input(query);

        let _guard = self.in_flight.lock().await;
        let result = self.runner.run(&invocation).await?;
        Ok(result.output)
    }
}
