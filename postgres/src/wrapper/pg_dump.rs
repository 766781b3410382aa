use log::{debug, info};
use std::path::Path;

use crate::common::PostgresConfig;
use crate::wrapper::{CommandError, CommandRunner};
use crate::{PostgresError, Result};

/// Plain-text SQL output.
const PLAIN_FORMAT_FLAG: &str = "-Fp";

/// Output file flag, joined with the file name.
const OUTPUT_FILE_FLAG: &str = "-f";

/// Wrapper for the pg_dump command
pub struct PgDump<'a> {
    program: &'a str,
}

impl<'a> PgDump<'a> {
    pub fn new(program: &'a str) -> Self {
        Self { program }
    }

    /// Argument list for a plain dump of `config` into `dump_file`: the
    /// caller's options, the format and output flags, then the connection
    /// flags for non-empty fields.
    pub fn args(config: &PostgresConfig, dump_file: &str) -> Vec<String> {
        let mut args = config.options.clone();
        args.push(PLAIN_FORMAT_FLAG.to_string());
        args.push(format!("{OUTPUT_FILE_FLAG}{dump_file}"));
        args.extend(config.connection_flags());
        args
    }

    /// Run pg_dump, writing `dump_file` relative to `working_dir`
    pub fn run<R: CommandRunner>(
        &self,
        runner: &R,
        config: &PostgresConfig,
        dump_file: &str,
        working_dir: Option<&Path>,
    ) -> std::result::Result<String, CommandError> {
        let output = runner.run(self.program, &Self::args(config, dump_file), working_dir)?;
        info!("pg_dump completed successfully");
        Ok(output)
    }

    /// Check if pg_dump is available in the system
    pub fn check_availability<R: CommandRunner>(&self, runner: &R) -> Result<String> {
        let output = runner
            .run(self.program, &["--version".to_string()], None)
            .map_err(|source| PostgresError::ToolUnavailable {
                tool: self.program.to_string(),
                source,
            })?;

        let version = output.lines().next().unwrap_or_default().trim().to_string();
        debug!("pg_dump version: {version}");

        Ok(version)
    }
}
