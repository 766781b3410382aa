use config::{Config, Environment, File, Map};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Locations searched for a configuration file, lowest precedence first.
pub const CONFIG_PATHS: [&str; 3] = [
    "/etc/pgexport/pgexport.toml",
    "~/.config/pgexport/pgexport.toml",
    "pgexport.toml",
];

/// Locations tried in order by [`update_config`].
const WRITE_PATHS: [&str; 2] = ["~/.config/pgexport/pgexport.toml", "pgexport.toml"];

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not write configuration to any of: {0}")]
    NoWritablePath(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory the dump and archive are written to. Unset means the
    /// current working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    pub postgres: PostgresSection,
    pub tools: ToolsSection,
}

/// Connection parameters handed to `pg_dump`. Empty strings are left out of
/// the command line entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PostgresSection {
    pub host: String,
    pub port: String,
    pub database: String,
    pub username: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolsSection {
    pub pg_dump: String,
    pub tar: String,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            pg_dump: "pg_dump".to_string(),
            tar: "tar".to_string(),
        }
    }
}

/// Environment variable holding extra `pg_dump` flags, split on whitespace.
const OPTIONS_VAR: &str = "PGEXPORT_POSTGRES__OPTIONS";

/// Loads the configuration.
///
/// With an explicit path only that file is read (and it must exist).
/// Otherwise every existing file in [`CONFIG_PATHS`] is layered in order.
/// `PGEXPORT_*` environment variables are applied last, e.g.
/// `PGEXPORT_POSTGRES__HOST` or `PGEXPORT_TOOLS__PG_DUMP`.
pub fn load_config(explicit: Option<&Path>) -> Result<ExportConfig, ConfigFileError> {
    let vars = std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)));
    load_config_with_env(explicit, vars)
}

/// [`load_config`] reading `PGEXPORT_*` values from `vars` instead of the
/// process environment. Values are kept as text, never parsed as numbers.
pub fn load_config_with_env<I>(
    explicit: Option<&Path>,
    vars: I,
) -> Result<ExportConfig, ConfigFileError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let builder = Config::builder()
        .set_default("tools.pg_dump", "pg_dump")?
        .set_default("tools.tar", "tar")?;

    let builder = match explicit {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            builder.add_source(File::from(path).required(true))
        }
        None => CONFIG_PATHS.iter().fold(builder, |builder, path| {
            let path = shellexpand::tilde(path).into_owned();
            if Path::new(&path).exists() {
                debug!("Loading configuration from {path}");
                builder.add_source(File::with_name(&path))
            } else {
                builder
            }
        }),
    };

    let (options, env): (Vec<_>, Vec<_>) = vars
        .into_iter()
        .filter(|(key, _)| key.starts_with("PGEXPORT_"))
        .partition(|(key, _)| key.eq_ignore_ascii_case(OPTIONS_VAR));

    let mut builder = builder.add_source(
        Environment::with_prefix("PGEXPORT")
            .prefix_separator("_")
            .separator("__")
            .source(Some(env.into_iter().collect::<Map<String, String>>())),
    );

    if let Some((_, value)) = options.into_iter().last() {
        let options: Vec<String> = value.split_whitespace().map(str::to_string).collect();
        builder = builder.set_override("postgres.options", options)?;
    }

    Ok(builder.build()?.try_deserialize()?)
}

/// Writes `config` as TOML to `path`, creating parent directories.
pub fn write_config(config: &ExportConfig, path: &Path) -> Result<(), ConfigFileError> {
    let toml_string = toml::to_string_pretty(config)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(path, toml_string)?;
    Ok(())
}

/// Writes the configuration to the first writable location, trying the
/// user config directory before the current directory. Returns the path
/// that was written.
pub fn update_config(config: &ExportConfig) -> Result<PathBuf, ConfigFileError> {
    for path in WRITE_PATHS {
        let expanded = PathBuf::from(shellexpand::tilde(path).into_owned());

        match write_config(config, &expanded) {
            Ok(()) => {
                info!("Configuration written to {}", expanded.display());
                return Ok(expanded);
            }
            Err(e) => {
                error!("Failed to write {}: {}", expanded.display(), e);
                continue;
            }
        }
    }

    Err(ConfigFileError::NoWritablePath(WRITE_PATHS.join(", ")))
}
