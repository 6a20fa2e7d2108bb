//! One-shot activation of an analyzer.

use anyhow::Result;
use log::info;

use crate::channel;
use crate::config::{LaunchConfig, LaunchStrategy};
use crate::lsp::{ProtocolClient, Session};

/// Activates an analyzer: creates the channel prescribed by the launch strategy, then hands it — together with the
/// document filter and settings namespace — to the protocol client.
///
/// Every call creates a fresh, independent channel and session; nothing is shared with or reused from previous
/// activations. There is no supervisory loop: if the analyzer later dies, the session surfaces the disconnection
/// to its caller and is simply disposed.
///
/// # Errors
/// Returns the launch error ([`LaunchFailure`] or [`ConnectionFailure`]) if the channel could not be established,
/// or the protocol client's error if the handshake failed. The failed attempt is not retried.
///
/// [`ConnectionFailure`]: crate::error::Error::ConnectionFailure
/// [`LaunchFailure`]: crate::error::Error::LaunchFailure
pub fn activate(config: &LaunchConfig, client: &dyn ProtocolClient) -> Result<Box<dyn Session>> {
    info!("activating analyzer `{}`", config.name);

    let channel = match config.strategy {
        LaunchStrategy::Process(ref process) => channel::process::launch(process)?,
        LaunchStrategy::Socket(ref socket) => channel::socket::launch(socket)?,
    };

    client.start(&config.name, channel, config.options.clone())
}
