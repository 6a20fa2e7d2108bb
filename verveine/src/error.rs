//! Errors that can be yielded while establishing a channel.

use std::io;
use std::path::PathBuf;

use derive_more::Display;

/// Type representing launch errors.
///
/// Both kinds are terminal for the current activation attempt: they are
/// surfaced to the caller and neither is retried nor recovered locally. A
/// channel is either fully established or not established at all.
#[derive(Debug, Display)]
pub enum Error {
    /// The analyzer process could not be spawned.
    #[display(fmt = "cannot launch analyzer {:?}: {}", command, source)]
    LaunchFailure {
        /// Path of the executable that failed to launch.
        command: PathBuf,

        /// Underlying operating system error.
        source: io::Error,
    },

    /// The connection to an already-running analyzer could not be opened.
    #[display(fmt = "cannot connect to analyzer on 127.0.0.1:{}: {}", port, source)]
    ConnectionFailure {
        /// Loopback port the connection was attempted on.
        port: u16,

        /// Underlying operating system error, from the last attempt.
        source: io::Error,
    },
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::LaunchFailure { source, .. } | Self::ConnectionFailure { source, .. } => Some(source),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_command() {
        let error = Error::LaunchFailure {
            command: PathBuf::from("/opt/analyzer"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };

        assert!(error.to_string().contains("/opt/analyzer"));
    }

    #[test]
    fn display_names_the_port() {
        let error = Error::ConnectionFailure {
            port: 2087,
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };

        assert!(error.to_string().contains("127.0.0.1:2087"));
    }
}
