//! Named database connection profiles.
//!
//! Profiles are read from the connections file:
//! ```json
//! {
//!     "connections": {
//!         "Local Postgres": {
//!             "type": "pgsql",
//!             "host": "localhost",
//!             "port": 5432,
//!             "username": "postgres",
//!             "database": "app",
//!             "password": "${PGPASSWORD}"
//!         }
//!     },
//!     "default": "Local Postgres"
//! }
//! ```
//!
//! String values support `${VAR}` environment expansion. `$$` is a literal
//! `$`, and any other `$` is kept as written.

use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fmt;
use std::fs;
use std::marker::PhantomData;
use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::jsonc::parse_jsonc;
use super::paths::{ensure_file, settings_dir, CONNECTIONS_FILENAME, DEFAULT_CONNECTIONS};
use super::settings::SettingsError;

/// Supported database types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DbKind {
    /// PostgreSQL via `psql`
    Postgres,
    /// MySQL / MariaDB via `mysql`
    MySql,
    /// Oracle via `sqlplus`
    Oracle,
    /// Vertica via `vsql`
    Vertica,
    /// SQL Server / Sybase via `sqsh`
    Sqsh,
    /// Firebird via `isql-fb`
    Firebird,
    /// SQLite via `sqlite3`
    Sqlite,
}

impl DbKind {
    /// Parse a database type from its configuration name.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, SettingsError> {
        match s.to_lowercase().as_str() {
            "pgsql" | "postgres" | "postgresql" => Ok(DbKind::Postgres),
            "mysql" | "mariadb" => Ok(DbKind::MySql),
            "oracle" => Ok(DbKind::Oracle),
            "vertica" => Ok(DbKind::Vertica),
            "sqsh" | "mssql" | "sqlserver" => Ok(DbKind::Sqsh),
            "firebird" => Ok(DbKind::Firebird),
            "sqlite" | "sqlite3" => Ok(DbKind::Sqlite),
            other => Err(SettingsError::UnsupportedType(other.to_string())),
        }
    }

    /// Canonical configuration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DbKind::Postgres => "pgsql",
            DbKind::MySql => "mysql",
            DbKind::Oracle => "oracle",
            DbKind::Vertica => "vertica",
            DbKind::Sqsh => "sqsh",
            DbKind::Firebird => "firebird",
            DbKind::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for DbKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DbKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DbKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        DbKind::from_str(&s).map_err(de::Error::custom)
    }
}

/// Deserialize a map keyed by database type, rejecting two keys that name
/// the same type (`"pgsql"` and `"postgres"`).
pub(crate) fn deserialize_kind_map<'de, D, V>(deserializer: D) -> Result<HashMap<DbKind, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct KindMapVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for KindMapVisitor<V> {
        type Value = HashMap<DbKind, V>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map keyed by database type")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = HashMap::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, V>()? {
                let kind = DbKind::from_str(&key).map_err(de::Error::custom)?;
                if entries.insert(kind, value).is_some() {
                    return Err(de::Error::custom(format!(
                        "database type {} is configured twice (again as '{}')",
                        kind, key
                    )));
                }
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(KindMapVisitor(PhantomData))
}

/// Expand `${VAR}` references in a profile value.
///
/// `$$` yields a literal `$`. A `$` not followed by `{` or `$`, or a `${`
/// without a closing brace, is kept as is.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('$') {
        result.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            result.push('$');
            rest = tail;
        } else if let Some((name, tail)) = after.strip_prefix('{').and_then(|t| t.split_once('}')) {
            let value = env::var(name).map_err(|_| SettingsError::MissingEnvVar(name.to_string()))?;
            result.push_str(&value);
            rest = tail;
        } else {
            result.push('$');
            rest = after;
        }
    }

    result.push_str(rest);
    Ok(result)
}

/// A named connection profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Unique name, the key in the connections file.
    pub name: String,
    pub kind: DbKind,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub database: String,
    /// Encoding label used for the CLI's stdin and output (default UTF-8).
    pub encoding: Option<String>,
    pub password: Option<String>,
    /// Service name (Oracle).
    pub service: Option<String>,
    /// Any other scalar keys, usable as template fields.
    pub extra: BTreeMap<String, String>,
}

impl Profile {
    /// Value of a template field, if the profile has it.
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "name" => Some(self.name.clone()),
            "type" => Some(self.kind.as_str().to_string()),
            "host" => Some(self.host.clone()),
            "port" => Some(self.port.to_string()),
            "username" => Some(self.username.clone()),
            "database" => Some(self.database.clone()),
            "encoding" => self.encoding.clone(),
            "password" => self.password.clone(),
            "service" => self.service.clone(),
            other => self.extra.get(other).cloned(),
        }
    }

    /// Text encoding for this connection's CLI.
    pub fn text_encoding(&self) -> &'static Encoding {
        self.encoding
            .as_deref()
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8)
    }

    /// One-line description shown next to the name in pickers.
    pub fn summary(&self) -> String {
        format!(
            "DB: {}, Connection: {}@{}:{}",
            self.database, self.username, self.host, self.port
        )
    }

    fn from_raw(name: String, raw: RawProfile) -> Result<Self, SettingsError> {
        let port = match raw.port {
            PortValue::Number(port) => port,
            PortValue::Text(text) => {
                let text = expand_env_vars(&text)?;
                text.trim().parse().map_err(|_| {
                    SettingsError::InvalidConfig(format!("{}: invalid port '{}'", name, text))
                })?
            }
        };

        let encoding = raw.encoding.map(ScalarValue::into_text).transpose()?;
        if let Some(label) = &encoding {
            if Encoding::for_label(label.as_bytes()).is_none() {
                return Err(SettingsError::InvalidConfig(format!(
                    "{}: unknown encoding '{}'",
                    name, label
                )));
            }
        }

        let mut extra = BTreeMap::new();
        for (key, value) in raw.extra {
            let text = match value {
                serde_json::Value::Null => continue,
                serde_json::Value::String(s) => expand_env_vars(&s)?,
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Number(n) => n.to_string(),
                _ => {
                    return Err(SettingsError::InvalidConfig(format!(
                        "{}: field '{}' must be a string, number or boolean",
                        name, key
                    )))
                }
            };
            extra.insert(key, text);
        }

        Ok(Self {
            kind: raw.kind,
            host: expand_env_vars(&raw.host)?,
            port,
            username: expand_env_vars(&raw.username)?,
            database: expand_env_vars(&raw.database)?,
            encoding,
            password: raw.password.map(ScalarValue::into_text).transpose()?,
            service: raw.service.map(ScalarValue::into_text).transpose()?,
            extra,
            name,
        })
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Deserialize)]
struct RawProfile {
    #[serde(rename = "type")]
    kind: DbKind,
    host: String,
    port: PortValue,
    username: String,
    database: String,
    #[serde(default)]
    encoding: Option<ScalarValue>,
    #[serde(default)]
    password: Option<ScalarValue>,
    #[serde(default)]
    service: Option<ScalarValue>,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u16),
    Text(String),
}

/// An optional profile value written as a string, number or boolean.
#[derive(Deserialize)]
#[serde(untagged)]
enum ScalarValue {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl ScalarValue {
    fn into_text(self) -> Result<String, SettingsError> {
        match self {
            ScalarValue::Text(text) => expand_env_vars(&text),
            ScalarValue::Number(n) => Ok(n.to_string()),
            ScalarValue::Bool(b) => Ok(b.to_string()),
        }
    }
}

/// Connection entries in file order, duplicates included.
#[derive(Default)]
struct OrderedProfiles(Vec<(String, RawProfile)>);

impl<'de> Deserialize<'de> for OrderedProfiles {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = OrderedProfiles;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of connection name to connection options")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, raw)) = map.next_entry::<String, RawProfile>()? {
                    entries.push((name, raw));
                }
                Ok(OrderedProfiles(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConnectionsFile {
    #[serde(default)]
    connections: OrderedProfiles,
    #[serde(default)]
    default: Option<String>,
}

/// Loaded connection profiles, in file order.
#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    profiles: Vec<Profile>,
    default: Option<String>,
}

impl ProfileStore {
    /// Parse a connections file's JSON-with-comments text.
    pub fn parse(s: &str) -> Result<Self, SettingsError> {
        let file: ConnectionsFile = parse_jsonc(s)?;

        let mut profiles: Vec<Profile> = Vec::with_capacity(file.connections.0.len());
        for (name, raw) in file.connections.0 {
            if profiles.iter().any(|p| p.name == name) {
                return Err(SettingsError::DuplicateConnection(name));
            }
            profiles.push(Profile::from_raw(name, raw)?);
        }

        let default = file.default.filter(|name| !name.is_empty());
        if let Some(name) = &default {
            if !profiles.iter().any(|p| &p.name == name) {
                return Err(SettingsError::ConnectionNotFound(name.clone()));
            }
        }

        Ok(Self { profiles, default })
    }

    /// Load profiles from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load profiles from the settings directory, seeding the file when missing.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from_dir(&settings_dir()?)
    }

    /// Load profiles from `dir`, seeding the file when missing.
    pub fn load_from_dir(dir: &Path) -> Result<Self, SettingsError> {
        let path = ensure_file(dir, CONNECTIONS_FILENAME, DEFAULT_CONNECTIONS)?;
        Self::from_file(path)
    }

    /// Get a profile by name.
    pub fn get(&self, name: &str) -> Result<&Profile, SettingsError> {
        self.profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| SettingsError::ConnectionNotFound(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Name of the default connection from the connections file.
    pub fn default_name(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Pick the profile to use: the requested name, else the file's default,
    /// else `fallback` (usually the settings file's default).
    pub fn resolve(
        &self,
        requested: Option<&str>,
        fallback: Option<&str>,
    ) -> Result<&Profile, SettingsError> {
        match requested.or(self.default_name()).or(fallback) {
            Some(name) => self.get(name),
            None => Err(SettingsError::InvalidConfig(
                "no connection selected and no default connection configured".to_string(),
            )),
        }
    }
}
