//! Per-database-type CLI options and query templates.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use super::error::{BuildError, CommandError, CommandResult};
use crate::config::{deserialize_kind_map, DbKind};

/// CLI argument template, either one string or a list joined with spaces.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ArgsTemplate {
    Line(String),
    Tokens(Vec<String>),
}

impl ArgsTemplate {
    /// The template as a single line.
    pub fn joined(&self) -> Cow<'_, str> {
        match self {
            ArgsTemplate::Line(line) => Cow::Borrowed(line),
            ArgsTemplate::Tokens(tokens) => Cow::Owned(tokens.join(" ")),
        }
    }
}

impl Default for ArgsTemplate {
    fn default() -> Self {
        ArgsTemplate::Line(String::new())
    }
}

/// A predefined query and the extra CLI options it needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuerySpec {
    pub query: String,
    #[serde(default)]
    pub options: Vec<String>,
}

/// How to invoke one database type's CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliSpec {
    /// Options passed on every invocation, in order.
    pub options: Vec<String>,

    /// Connection arguments with `{field}` placeholders.
    pub args: ArgsTemplate,

    /// Statements prefixed to every free-form execution.
    pub before: Vec<String>,

    /// Logical query name to template.
    pub queries: HashMap<String, QuerySpec>,
}

impl CliSpec {
    /// Whether the logical query is defined.
    pub fn supports(&self, name: &str) -> bool {
        self.queries.contains_key(name)
    }

    /// Look up a logical query.
    pub fn query(&self, name: &str) -> Result<&QuerySpec, BuildError> {
        self.queries
            .get(name)
            .ok_or_else(|| BuildError::UnknownQuery(name.to_string()))
    }
}

/// All configured CLI specs, keyed by database type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CliCatalog {
    specs: HashMap<DbKind, CliSpec>,
}

impl<'de> Deserialize<'de> for CliCatalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_kind_map(deserializer).map(|specs| CliCatalog { specs })
    }
}

impl CliCatalog {
    /// Get the CLI options for a database type.
    pub fn spec_for(&self, kind: DbKind) -> CommandResult<&CliSpec> {
        self.specs.get(&kind).ok_or(CommandError::UnknownType(kind))
    }

    /// Register or replace a spec.
    pub fn insert(&mut self, kind: DbKind, spec: CliSpec) -> Option<CliSpec> {
        self.specs.insert(kind, spec)
    }

    /// Database types with a registered spec.
    pub fn kinds(&self) -> impl Iterator<Item = DbKind> + '_ {
        self.specs.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_template_forms() {
        let line: ArgsTemplate = serde_json::from_str(r#""-h {host} -p {port}""#).unwrap();
        let tokens: ArgsTemplate = serde_json::from_str(r#"["-h {host}", "-p {port}"]"#).unwrap();
        assert_eq!(line.joined(), "-h {host} -p {port}");
        assert_eq!(tokens.joined(), "-h {host} -p {port}");
    }

    #[test]
    fn test_spec_defaults_and_queries() {
        let spec: CliSpec = serde_json::from_str(
            r#"{ "queries": { "desc": { "query": "select 1" } } }"#,
        )
        .unwrap();

        assert!(spec.options.is_empty());
        assert!(spec.before.is_empty());
        assert_eq!(spec.args.joined(), "");
        assert!(spec.supports("desc"));
        assert!(spec.query("desc").unwrap().options.is_empty());
        assert!(!spec.supports("columns"));
        assert!(matches!(spec.query("columns"), Err(BuildError::UnknownQuery(name)) if name == "columns"));
    }

    #[test]
    fn test_spec_rejects_unknown_keys() {
        let result = serde_json::from_str::<CliSpec>(r#"{ "optoins": [] }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_catalog_lookup() {
        let mut catalog = CliCatalog::default();
        catalog.insert(DbKind::Sqlite, CliSpec::default());

        assert!(catalog.spec_for(DbKind::Sqlite).is_ok());
        assert!(matches!(
            catalog.spec_for(DbKind::Oracle),
            Err(CommandError::UnknownType(DbKind::Oracle))
        ));
        assert_eq!(catalog.kinds().collect::<Vec<_>>(), vec![DbKind::Sqlite]);
    }

    #[test]
    fn test_catalog_keys_accept_aliases() {
        let catalog: CliCatalog =
            serde_json::from_str(r#"{ "postgres": { "args": "-d {database}" } }"#).unwrap();
        assert!(catalog.spec_for(DbKind::Postgres).is_ok());
    }

    #[test]
    fn test_catalog_rejects_two_aliases_for_one_type() {
        let result = serde_json::from_str::<CliCatalog>(
            r#"{ "sqlite": { "args": "{database}" }, "sqlite3": { "args": "-batch {database}" } }"#,
        );
        let err = result.unwrap_err();
        assert!(err.to_string().contains("database type sqlite is configured twice"), "{}", err);
    }
}
