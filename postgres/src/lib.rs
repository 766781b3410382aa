//! PostgreSQL export: dumps a database with `pg_dump` and wraps the dump in
//! a gzip-compressed tarball with `tar`.

pub mod cli;
pub mod common;
pub mod exporter;
pub mod wrapper;

use thiserror::Error;

use crate::wrapper::CommandError;

#[derive(Error, Debug)]
pub enum PostgresError {
    #[error("{tool} is not available")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: CommandError,
    },
}

pub type Result<T> = std::result::Result<T, PostgresError>;

// Re-export key types for convenience
pub use crate::common::PostgresConfig;
pub use crate::exporter::{
    archive_file_name, dump_file_name, ExportError, ExportResult, ExportTools, Exporter,
    PostgresExporter, ARCHIVE_MIME,
};
pub use crate::wrapper::{CommandRunner, SystemRunner};
