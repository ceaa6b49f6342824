//! Turns a profile and a CLI spec into a concrete invocation.

use encoding_rs::{Encoding, UTF_8};

use super::catalog::CliSpec;
use super::error::BuildError;
use super::template::render_profile;
use crate::config::Profile;

/// A fully resolved CLI call.
///
/// Always names a program; arguments, stdin text and encoding are optional.
#[derive(Debug, Clone)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    input: String,
    encoding: &'static Encoding,
}

impl Invocation {
    /// Run `program` with no arguments, empty input and UTF-8 text.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            input: String::new(),
            encoding: UTF_8,
        }
    }

    /// Append arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the text to feed on stdin.
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = input.into();
        self
    }

    /// Set the encoding for stdin and for decoding output.
    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments after the executable.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Executable followed by its arguments.
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }

    /// Text written to the CLI's stdin.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }
}

/// Builds argv for one profile.
///
/// The argv is assembled as:
/// 1. the resolved executable
/// 2. the global options
/// 3. the logical query's options, if a query name is given
/// 4. the args template, rendered against the profile and shell-split
///
/// `{field}` placeholders are also rendered inside option strings; each
/// option stays a single argument.
#[derive(Debug, Clone, Copy)]
pub struct ArgumentBuilder<'a> {
    executable: &'a str,
    spec: &'a CliSpec,
    profile: &'a Profile,
}

impl<'a> ArgumentBuilder<'a> {
    pub fn new(executable: &'a str, spec: &'a CliSpec, profile: &'a Profile) -> Self {
        Self {
            executable,
            spec,
            profile,
        }
    }

    /// Build the invocation, with empty input.
    pub fn build(&self, query_name: Option<&str>) -> Result<Invocation, BuildError> {
        let mut args = Vec::new();

        for option in &self.spec.options {
            args.push(render_profile(option, self.profile)?);
        }

        if let Some(name) = query_name {
            for option in &self.spec.query(name)?.options {
                args.push(render_profile(option, self.profile)?);
            }
        }

        let line = render_profile(&self.spec.args.joined(), self.profile)?;
        let words = shlex::split(&line).ok_or_else(|| BuildError::UnbalancedQuotes(line.clone()))?;
        args.extend(words);

        let invocation = Invocation::new(self.executable)
            .with_args(args)
            .with_encoding(self.profile.text_encoding());
        tracing::debug!(argv = %invocation.argv().join(" "), "using cli args");

        Ok(invocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfileStore;
    use insta::assert_snapshot;

    fn store() -> ProfileStore {
        ProfileStore::parse(
            r#"{ "connections": {
                "pg": { "type": "postgres", "host": "localhost", "port": 5432, "username": "u", "database": "d" },
                "ora": { "type": "oracle", "host": "db1", "port": 1521, "username": "scott",
                         "database": "orcl", "password": "tiger", "service": "ORCL" }
            } }"#,
        )
        .unwrap()
    }

    fn pg_spec() -> CliSpec {
        serde_json::from_str(
            r#"{
                "options": ["-h", "{host}", "-p", "{port}"],
                "args": "-U {username} -d {database}",
                "queries": {
                    "desc": { "query": "select 1", "options": ["--tuples-only", "--no-psqlrc"] },
                    "desc table": { "query": "\\d+ %s" }
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_free_form_argv() {
        let store = store();
        let spec = pg_spec();
        let invocation = ArgumentBuilder::new("/usr/bin/psql", &spec, store.get("pg").unwrap())
            .build(None)
            .unwrap();

        assert_eq!(invocation.program(), "/usr/bin/psql");
        assert_eq!(
            invocation.argv(),
            vec!["/usr/bin/psql", "-h", "localhost", "-p", "5432", "-U", "u", "-d", "d"]
        );
        assert!(invocation.input().is_empty());
        assert_eq!(invocation.encoding(), UTF_8);
    }

    #[test]
    fn test_query_options_follow_global_options() {
        let store = store();
        let spec = pg_spec();
        let invocation = ArgumentBuilder::new("psql", &spec, store.get("pg").unwrap())
            .build(Some("desc"))
            .unwrap();

        assert_snapshot!(
            invocation.argv().join(" "),
            @"psql -h localhost -p 5432 --tuples-only --no-psqlrc -U u -d d"
        );
    }

    #[test]
    fn test_unknown_query_name() {
        let store = store();
        let spec = pg_spec();
        let result = ArgumentBuilder::new("psql", &spec, store.get("pg").unwrap()).build(Some("functions"));
        assert!(matches!(result, Err(BuildError::UnknownQuery(_))));
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let store = store();
        let spec: CliSpec = serde_json::from_str(r#"{ "args": "-U {username} -W {password}" }"#).unwrap();
        let result = ArgumentBuilder::new("psql", &spec, store.get("pg").unwrap()).build(None);
        assert!(matches!(result, Err(BuildError::MissingField(name)) if name == "password"));
    }

    #[test]
    fn test_quoted_args_stay_together() {
        let store = store();
        let spec: CliSpec = serde_json::from_str(
            r#"{
                "options": ["-S"],
                "args": ["{username}/{password}@\"(DESCRIPTION=(ADDRESS=(PROTOCOL=TCP)(HOST={host})(PORT={port}))",
                         "(CONNECT_DATA=(SERVICE_NAME={service})))\""]
            }"#,
        )
        .unwrap();
        let invocation = ArgumentBuilder::new("sqlplus", &spec, store.get("ora").unwrap())
            .build(None)
            .unwrap();

        assert_eq!(invocation.argv().len(), 3);
        assert_eq!(
            invocation.args()[1],
            "scott/tiger@(DESCRIPTION=(ADDRESS=(PROTOCOL=TCP)(HOST=db1)(PORT=1521)) (CONNECT_DATA=(SERVICE_NAME=ORCL)))"
        );
    }

    #[test]
    fn test_unbalanced_quotes() {
        let store = store();
        let spec: CliSpec = serde_json::from_str(r#"{ "args": "-d \"{database}" }"#).unwrap();
        let result = ArgumentBuilder::new("psql", &spec, store.get("pg").unwrap()).build(None);
        assert!(matches!(result, Err(BuildError::UnbalancedQuotes(_))));
    }

    #[test]
    fn test_with_input() {
        let store = store();
        let spec = pg_spec();
        let invocation = ArgumentBuilder::new("psql", &spec, store.get("pg").unwrap())
            .build(None)
            .unwrap()
            .with_input("SELECT 1;");
        assert_eq!(invocation.input(), "SELECT 1;");
        assert_eq!(invocation.args()[0], "-h");
    }
}
