//! Channel creation by spawning the analyzer as a child process.

use std::process::{Command, Stdio};

use log::info;

use super::{Duplex, Guard};
use crate::config::ProcessConfig;
use crate::error::{Error, Result};

/// Verbosity flag appended to the analyzer's argument list.
pub const VERBOSITY_FLAG: &str = "-v";

/// Spawns the analyzer and returns a channel over its standard streams.
///
/// The writable end of the channel is connected to the child's input, the
/// readable end to its output; the child's error stream is inherited so that
/// its own logging reaches the host's terminal. The child is reaped when the
/// channel is released.
///
/// There is no timeout nor health check here: a dead child is detected by the
/// protocol client through read failure.
///
/// # Errors
/// Returns [`Error::LaunchFailure`] if the command cannot be located or
/// executed. The attempt is not retried.
pub fn launch(config: &ProcessConfig) -> Result<Duplex> {
    info!("launching analyzer `{}`", config.command.display());

    let mut child = Command::new(&config.command)
        .args(&config.arguments)
        .arg(VERBOSITY_FLAG)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|source| Error::LaunchFailure {
            command: config.command.clone(),
            source,
        })?;

    let writer = child.stdin.take().unwrap_or_else(|| unreachable!("stdin is piped"));
    let reader = child.stdout.take().unwrap_or_else(|| unreachable!("stdout is piped"));

    Ok(Duplex::with_guard(Box::new(reader), Box::new(writer), Guard::child(child)))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn unknown_command_is_a_launch_failure() {
        let config = ProcessConfig::new(PathBuf::from("/nonexistent/analyzer"), vec![]);

        let error = launch(&config).map(drop).unwrap_err();

        assert!(matches!(error, Error::LaunchFailure { ref command, .. } if *command == config.command));
    }
}
