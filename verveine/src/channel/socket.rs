//! Channel creation by connecting to an already-running analyzer.

use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::thread;
use std::time::Duration;

use log::{info, warn};

use super::{Duplex, Guard};
use crate::config::SocketConfig;
use crate::error::{Error, Result};

/// Maximum duration of a single connection attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Delay before the one retry of a failed connection attempt.
pub const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Connects to the analyzer on loopback and returns a channel over the stream.
///
/// The analyzer is expected to have been started out-of-band; nothing here
/// manages its lifecycle. A failed attempt is retried exactly once, after
/// [`RETRY_DELAY`]; each attempt is bounded by [`CONNECT_TIMEOUT`].
///
/// # Errors
/// Returns [`Error::ConnectionFailure`] with the last OS error if both
/// attempts fail.
pub fn launch(config: &SocketConfig) -> Result<Duplex> {
    let address = SocketAddr::from((Ipv4Addr::LOCALHOST, config.port));

    info!("connecting to analyzer on {address}");

    let stream = TcpStream::connect_timeout(&address, CONNECT_TIMEOUT)
        .or_else(|err| {
            warn!("connection to {address} failed ({err}), retrying once");

            thread::sleep(RETRY_DELAY);

            TcpStream::connect_timeout(&address, CONNECT_TIMEOUT)
        })
        .map_err(|source| Error::ConnectionFailure {
            port: config.port,
            source,
        })?;

    let reader = stream.try_clone().map_err(|source| Error::ConnectionFailure {
        port: config.port,
        source,
    })?;

    let guard = stream.try_clone().map_err(|source| Error::ConnectionFailure {
        port: config.port,
        source,
    })?;

    Ok(Duplex::with_guard(Box::new(reader), Box::new(stream), Guard::socket(guard)))
}
