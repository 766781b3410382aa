pub mod commands;

use std::path::PathBuf;

use ::common::config::ExportConfig;

use crate::common::PostgresConfig;
use crate::exporter::ExportTools;

/// Export a database into `<database>_<unix time>.sql.tar.gz`
#[derive(clap::Args, Debug, Default)]
pub struct ExportArgs {
    /// PostgreSQL host
    #[clap(long)]
    pub host: Option<String>,

    /// PostgreSQL port
    #[clap(long)]
    pub port: Option<String>,

    /// PostgreSQL database
    #[clap(long)]
    pub database: Option<String>,

    /// PostgreSQL user
    #[clap(long)]
    pub username: Option<String>,

    /// Extra pg_dump flag, repeatable (e.g. --option=--inserts)
    #[clap(long = "option", allow_hyphen_values = true)]
    pub options: Vec<String>,

    /// Path to the pg_dump executable
    #[clap(long)]
    pub pg_dump: Option<String>,

    /// Path to the tar executable
    #[clap(long)]
    pub tar: Option<String>,

    /// Directory the dump and archive are written to
    #[clap(long)]
    pub output_dir: Option<PathBuf>,

    /// Print the export result as JSON
    #[clap(long)]
    pub json: bool,
}

/// Check that pg_dump and tar can be executed
#[derive(clap::Args, Debug, Default)]
pub struct CheckArgs {
    /// Path to the pg_dump executable
    #[clap(long)]
    pub pg_dump: Option<String>,

    /// Path to the tar executable
    #[clap(long)]
    pub tar: Option<String>,
}

/// Export settings after applying command-line overrides to the file config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedExport {
    pub config: PostgresConfig,
    pub tools: ExportTools,
    pub output_dir: Option<PathBuf>,
}

impl ExportArgs {
    /// Flags win over the configuration file. `--option` flags are appended
    /// after the options from the file.
    pub fn resolve(&self, file: &ExportConfig) -> ResolvedExport {
        let mut config = PostgresConfig::from(file.postgres.clone());
        let mut tools = ExportTools::from(file.tools.clone());

        override_with(&mut config.host, &self.host);
        override_with(&mut config.port, &self.port);
        override_with(&mut config.database, &self.database);
        override_with(&mut config.username, &self.username);
        config.options.extend(self.options.iter().cloned());

        override_with(&mut tools.pg_dump, &self.pg_dump);
        override_with(&mut tools.tar, &self.tar);

        ResolvedExport {
            config,
            tools,
            output_dir: self.output_dir.clone().or_else(|| file.output_dir.clone()),
        }
    }
}

impl CheckArgs {
    pub fn resolve(&self, file: &ExportConfig) -> ExportTools {
        let mut tools = ExportTools::from(file.tools.clone());
        override_with(&mut tools.pg_dump, &self.pg_dump);
        override_with(&mut tools.tar, &self.tar);
        tools
    }
}

fn override_with(target: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}
