//! Launch configuration.
//!
//! All activation parameters are explicit values built once by the host and
//! passed to [`activate`]; there is no ambient configuration lookup.
//!
//! [`activate`]: crate::activation::activate

use std::path::PathBuf;

use derive_more::Constructor;

/// Parameters of a single activation.
///
/// The record is immutable: it is built once at startup and lives for the
/// whole session.
#[derive(Clone, Constructor, Debug)]
pub struct LaunchConfig {
    /// Identifying name of the client, reported to the analyzer during the handshake.
    pub name: String,

    /// How the analyzer is reached.
    pub strategy: LaunchStrategy,

    /// Options handed to the [`ProtocolClient`] together with the channel.
    ///
    /// [`ProtocolClient`]: crate::lsp::ProtocolClient
    pub options: ClientOptions,
}

/// The two mutually exclusive ways of obtaining a channel to the analyzer.
///
/// The choice is resolved once at startup. Socket mode expects the analyzer to
/// have been started out-of-band; its lifecycle is not managed here.
#[derive(Clone, Debug)]
pub enum LaunchStrategy {
    /// Spawn the analyzer as a child process and talk over its standard streams.
    Process(ProcessConfig),

    /// Connect to an already-running analyzer over loopback TCP.
    Socket(SocketConfig),
}

/// Command line of the analyzer process.
#[derive(Clone, Constructor, Debug)]
pub struct ProcessConfig {
    /// Path of the analyzer executable.
    pub command: PathBuf,

    /// Arguments passed to the analyzer, in order.
    ///
    /// The launcher appends a fixed verbosity flag after these.
    pub arguments: Vec<String>,
}

/// Loopback endpoint of an externally managed analyzer.
#[derive(Clone, Constructor, Debug)]
pub struct SocketConfig {
    /// TCP port the analyzer listens on.
    pub port: u16,
}

/// Options forwarded to the [`ProtocolClient`].
///
/// [`ProtocolClient`]: crate::lsp::ProtocolClient
#[derive(Clone, Constructor, Debug)]
pub struct ClientOptions {
    /// Document-type identifiers the analyzer is engaged for.
    pub document_filter: Vec<String>,

    /// Key under which settings are nested when pushed to the analyzer.
    pub settings_namespace: String,
}

impl ClientOptions {
    /// Indicates whether documents of the given type are synchronised to the analyzer.
    ///
    /// An empty filter engages the analyzer for no document at all.
    #[must_use]
    pub fn handles(&self, language_id: &str) -> bool {
        self.document_filter.iter().any(|id| id == language_id)
    }
}
