use log::debug;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;

/// Failure of a single external command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to execute {program}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} failed ({status}): {output}")]
    Exit {
        program: String,
        status: String,
        code: Option<i32>,
        output: String,
    },
}

impl CommandError {
    /// Output captured from the command, empty when it never started.
    pub fn output(&self) -> &str {
        match self {
            CommandError::Spawn { .. } => "",
            CommandError::Exit { output, .. } => output,
        }
    }

    pub fn program(&self) -> &str {
        match self {
            CommandError::Spawn { program, .. } | CommandError::Exit { program, .. } => program,
        }
    }
}

/// Runs an external program to completion.
///
/// Returns the combined stdout and stderr on a zero exit status. Tests
/// substitute a recording fake for [`SystemRunner`].
pub trait CommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        working_dir: Option<&Path>,
    ) -> Result<String, CommandError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(
        &self,
        program: &str,
        args: &[String],
        working_dir: Option<&Path>,
    ) -> Result<String, CommandError> {
        (**self).run(program, args, working_dir)
    }
}

/// [`CommandRunner`] backed by `std::process::Command`. Blocks until the
/// child exits; there is no timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        working_dir: Option<&Path>,
    ) -> Result<String, CommandError> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }

        debug!("Running command: {cmd:?}");

        let output = cmd.output().map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(CommandError::Exit {
                program: program.to_string(),
                status: output.status.to_string(),
                code: output.status.code(),
                output: combined,
            });
        }

        Ok(combined)
    }
}
