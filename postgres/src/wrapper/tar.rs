use log::{debug, info};
use std::path::Path;

use crate::wrapper::{CommandError, CommandRunner};
use crate::{PostgresError, Result};

/// Wrapper for the tar command
pub struct Tar<'a> {
    program: &'a str,
}

impl<'a> Tar<'a> {
    pub fn new(program: &'a str) -> Self {
        Self { program }
    }

    pub fn gzip_args(archive: &str, input: &str) -> Vec<String> {
        vec!["-czf".to_string(), archive.to_string(), input.to_string()]
    }

    /// Create a gzip-compressed `archive` holding the single file `input`.
    /// Both names are relative to `working_dir`.
    pub fn create_gzip<R: CommandRunner>(
        &self,
        runner: &R,
        archive: &str,
        input: &str,
        working_dir: Option<&Path>,
    ) -> std::result::Result<String, CommandError> {
        let output = runner.run(self.program, &Self::gzip_args(archive, input), working_dir)?;
        info!("Archive {archive} created");
        Ok(output)
    }

    pub fn check_availability<R: CommandRunner>(&self, runner: &R) -> Result<String> {
        let output = runner
            .run(self.program, &["--version".to_string()], None)
            .map_err(|source| PostgresError::ToolUnavailable {
                tool: self.program.to_string(),
                source,
            })?;

        let version = output.lines().next().unwrap_or_default().trim().to_string();
        debug!("tar version: {version}");

        Ok(version)
    }
}
