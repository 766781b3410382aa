use chrono::{DateTime, Utc};
use log::{error, info};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::common::PostgresConfig;
use crate::wrapper::{CommandError, CommandRunner, PgDump, SystemRunner, Tar};

/// Content type of every archive produced by an export.
pub const ARCHIVE_MIME: &str = "application/x-tar";

/// Something that produces a backup artifact for one data source.
pub trait Exporter {
    fn export(&self) -> ExportResult;
}

/// Executables used for the dump and archive steps. Bare names are resolved
/// through `PATH`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTools {
    pub pg_dump: String,
    pub tar: String,
}

impl Default for ExportTools {
    fn default() -> Self {
        Self {
            pg_dump: "pg_dump".to_string(),
            tar: "tar".to_string(),
        }
    }
}

impl From<::common::config::ToolsSection> for ExportTools {
    fn from(section: ::common::config::ToolsSection) -> Self {
        Self {
            pg_dump: section.pg_dump,
            tar: section.tar,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("pg_dump failed")]
    Dump(#[source] CommandError),

    #[error("archiving failed")]
    Archive(#[source] CommandError),
}

impl ExportError {
    pub fn command_error(&self) -> &CommandError {
        match self {
            ExportError::Dump(e) | ExportError::Archive(e) => e,
        }
    }

    /// Output captured from the step that failed.
    pub fn output(&self) -> &str {
        self.command_error().output()
    }

    /// This error followed by each of its sources, joined with `: `.
    pub fn describe(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

/// Outcome of one export call.
#[derive(Debug)]
pub struct ExportResult {
    outcome: Result<PathBuf, ExportError>,
}

impl ExportResult {
    fn success(path: PathBuf) -> Self {
        Self { outcome: Ok(path) }
    }

    fn failure(error: ExportError) -> Self {
        Self {
            outcome: Err(error),
        }
    }

    /// Archive location, only set on success.
    pub fn path(&self) -> Option<&Path> {
        self.outcome.as_ref().ok().map(PathBuf::as_path)
    }

    pub fn mime(&self) -> &'static str {
        ARCHIVE_MIME
    }

    pub fn error(&self) -> Option<&ExportError> {
        self.outcome.as_ref().err()
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn into_result(self) -> Result<PathBuf, ExportError> {
        self.outcome
    }
}

impl Serialize for ExportResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ExportResult", 3)?;
        state.serialize_field("path", &self.path())?;
        state.serialize_field("mime", self.mime())?;
        state.serialize_field("error", &self.error().map(ExportError::describe))?;
        state.end()
    }
}

/// `<database>_<unix seconds>.sql`.
///
/// Names only differ per second: two exports of the same database within
/// one second get the same name and overwrite each other's files.
pub fn dump_file_name(database: &str, at: DateTime<Utc>) -> String {
    format!("{}_{}.sql", database, at.timestamp())
}

pub fn archive_file_name(dump_file: &str) -> String {
    format!("{dump_file}.tar.gz")
}

/// Exports one PostgreSQL database with `pg_dump` and `tar`.
///
/// Both files land in the output directory (the current directory unless
/// set) and both are kept: the plain SQL dump and `<dump>.tar.gz`.
#[derive(Debug, Clone)]
pub struct PostgresExporter<R = SystemRunner> {
    config: PostgresConfig,
    tools: ExportTools,
    output_dir: Option<PathBuf>,
    runner: R,
}

impl PostgresExporter<SystemRunner> {
    pub fn new(config: PostgresConfig) -> Self {
        Self::with_runner(config, SystemRunner)
    }
}

impl<R: CommandRunner> PostgresExporter<R> {
    pub fn with_runner(config: PostgresConfig, runner: R) -> Self {
        Self {
            config,
            tools: ExportTools::default(),
            output_dir: None,
            runner,
        }
    }

    pub fn tools(mut self, tools: ExportTools) -> Self {
        self.tools = tools;
        self
    }

    /// Run both tools inside `dir`. Relative tool paths are then resolved
    /// against `dir` as well, so prefer bare names or absolute paths.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn config(&self) -> &PostgresConfig {
        &self.config
    }

    /// Export with file names stamped with `at` instead of the current time.
    pub fn export_at(&self, at: DateTime<Utc>) -> ExportResult {
        let dump_file = dump_file_name(&self.config.database, at);
        let archive_file = archive_file_name(&dump_file);
        let dir = self.output_dir.as_deref();

        info!(
            "Exporting database {:?} to {}",
            self.config.database, archive_file
        );

        // A failed dump may leave a partial file behind; it is not removed.
        if let Err(e) =
            PgDump::new(&self.tools.pg_dump).run(&self.runner, &self.config, &dump_file, dir)
        {
            return self.fail(ExportError::Dump(e));
        }

        if let Err(e) =
            Tar::new(&self.tools.tar).create_gzip(&self.runner, &archive_file, &dump_file, dir)
        {
            return self.fail(ExportError::Archive(e));
        }

        let path = match dir {
            Some(dir) => dir.join(&archive_file),
            None => PathBuf::from(&archive_file),
        };
        info!("Export completed: {}", path.display());

        ExportResult::success(path)
    }

    fn fail(&self, error: ExportError) -> ExportResult {
        error!(
            "Export of {:?} failed: {}",
            self.config.database,
            error.describe()
        );
        ExportResult::failure(error)
    }
}

impl<R: CommandRunner> Exporter for PostgresExporter<R> {
    fn export(&self) -> ExportResult {
        self.export_at(Utc::now())
    }
}
