use serde::{Deserialize, Serialize};

/// Connection parameters for one database export.
///
/// Every field may be empty, in which case the matching `pg_dump` flag is
/// omitted and `pg_dump` falls back to its own default (`PGHOST`, the local
/// socket, the login user, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub host: String,
    pub port: String,
    pub database: String,
    pub username: String,
    /// Extra `pg_dump` flags, passed through verbatim, e.g. `--inserts`.
    pub options: Vec<String>,
}

impl PostgresConfig {
    /// Connection flags for the non-empty fields, always in the order
    /// database, host, port, username.
    pub fn connection_flags(&self) -> Vec<String> {
        [
            ("-d", &self.database),
            ("-h", &self.host),
            ("-p", &self.port),
            ("-U", &self.username),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(flag, value)| format!("{flag}{value}"))
        .collect()
    }
}

impl From<::common::config::PostgresSection> for PostgresConfig {
    fn from(section: ::common::config::PostgresSection) -> Self {
        Self {
            host: section.host,
            port: section.port,
            database: section.database,
            username: section.username,
            options: section.options,
        }
    }
}
