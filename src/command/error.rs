//! Command construction and execution errors.

use std::io;
use std::time::Duration;
use thiserror::Error;

use crate::config::DbKind;

/// Result type for command operations.
pub type CommandResult<T> = Result<T, CommandError>;

/// Errors raised while turning a profile and template into an argv.
#[derive(Error, Debug)]
pub enum BuildError {
    /// A `{field}` placeholder names a field the profile does not have.
    #[error("profile has no value for placeholder {{{0}}}")]
    MissingField(String),

    /// A positional or `%s` placeholder has no argument.
    #[error("no argument for placeholder {0}")]
    MissingArgument(String),

    /// The logical query is not defined for this database type.
    #[error("query '{0}' is not defined for this database type")]
    UnknownQuery(String),

    /// Stray or unclosed braces, or an unsupported `%` directive.
    #[error("malformed template: {0}")]
    MalformedTemplate(String),

    /// The resolved argument string cannot be split into words.
    #[error("unbalanced quoting in CLI arguments: {0}")]
    UnbalancedQuotes(String),
}

/// Errors that can occur while dispatching a query to a CLI.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The CLI executable for a database type is not configured or not found.
    #[error("CLI for {kind} is not available: {reason}")]
    ConfigurationMissing {
        /// Database type whose CLI is missing.
        kind: DbKind,
        /// What went wrong during lookup.
        reason: String,
    },

    /// No CLI options are registered for the database type.
    #[error("no CLI options configured for database type {0}")]
    UnknownType(DbKind),

    /// The argv or query text could not be built.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Failed to launch the CLI process.
    #[error("failed to spawn {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Failed to write the query to the CLI's stdin.
    #[error("failed to write query to CLI: {0}")]
    WriteFailed(#[source] io::Error),

    /// Failed to collect the CLI's output.
    #[error("failed to read CLI output: {0}")]
    ReadFailed(#[source] io::Error),

    /// The CLI ran past the configured timeout and was killed.
    #[error("command timed out after {0:?}")]
    Timeout(Duration),
}

impl CommandError {
    /// Check if this error came from process I/O rather than configuration.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Self::WriteFailed(_) | Self::ReadFailed(_) | Self::Timeout(_)
        )
    }

    /// Check if this error should send the user to their settings.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationMissing { .. } | Self::UnknownType(_) | Self::Build(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CommandError::from(BuildError::MissingField("password".to_string()));
        assert_eq!(err.to_string(), "profile has no value for placeholder {password}");

        let err = CommandError::ConfigurationMissing {
            kind: DbKind::Postgres,
            reason: "'psql' could not be found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "CLI for pgsql is not available: 'psql' could not be found"
        );

        let err = CommandError::Timeout(Duration::from_millis(200));
        assert_eq!(err.to_string(), "command timed out after 200ms");
    }

    #[test]
    fn test_error_classification() {
        assert!(CommandError::Timeout(Duration::from_secs(5)).is_io());
        assert!(CommandError::WriteFailed(io::Error::from(io::ErrorKind::Other)).is_io());
        assert!(!CommandError::UnknownType(DbKind::Sqlite).is_io());
        assert!(CommandError::UnknownType(DbKind::Sqlite).is_configuration());
        assert!(!CommandError::Timeout(Duration::from_secs(5)).is_configuration());
    }
}
