//! Running external tools

use std::io::{BufRead, BufReader};
use std::process::{Command, ExitStatus, Stdio};

use crate::{PackageError, Result};

/// Name of the program a command runs, for log and error messages
pub(crate) fn program_name(command: &Command) -> String {
    command.get_program().to_string_lossy().into_owned()
}

/// Run a command and log its stdout line by line while it runs.
///
/// Blocks until the process exits. There is no timeout.
pub fn run_streaming(command: &mut Command) -> Result<ExitStatus> {
    let program = program_name(command);
    tracing::debug!("Running {:?}", command);

    let mut child = command.stdout(Stdio::piped()).spawn()?;

    if let Some(stdout) = child.stdout.take() {
        for line in BufReader::new(stdout).split(b'\n') {
            match line {
                Ok(line) => {
                    let line = String::from_utf8_lossy(&line);
                    tracing::debug!("{}", line.trim());
                }
                Err(e) => {
                    tracing::warn!("Error reading output of {}: {}", program, e);
                    break;
                }
            }
        }
    }

    Ok(child.wait()?)
}

/// Turn an unsuccessful exit status into [`PackageError::ExternalProcess`]
pub(crate) fn check_status(command: &Command, status: ExitStatus) -> Result<()> {
    if status.success() {
        Ok(())
    } else {
        Err(PackageError::ExternalProcess {
            program: program_name(command),
            status,
        })
    }
}
