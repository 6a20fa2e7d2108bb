//! Duplex byte channels towards an analyzer.
//!
//! A [`Duplex`] is owned exclusively by whichever launcher created it: the
//! process launcher owns the child and its pipes, the socket launcher owns the
//! halves of its stream. Nothing is shared, and the backing resource is
//! released on drop.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::process::Child;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

pub mod process;
pub mod socket;

/// How long a child analyzer is given to exit on its own before being killed.
const REAP_GRACE: Duration = Duration::from_millis(100);

/// A bidirectional byte stream towards an analyzer.
///
/// Writing reaches the analyzer's input; reading observes its output. The
/// channel carries no framing of its own: structured messages are layered on
/// top by the protocol client.
pub struct Duplex {
    reader: Box<dyn Read + Send>,
    writer: Box<dyn Write + Send>,
    guard: Option<Guard>,
}

impl Duplex {
    /// Creates a channel over arbitrary streams, with no backing resource to release.
    #[must_use]
    pub fn new(reader: Box<dyn Read + Send>, writer: Box<dyn Write + Send>) -> Self {
        Self {
            reader,
            writer,
            guard: None,
        }
    }

    /// Creates a channel whose backing resource is released with the returned [`Guard`].
    pub(crate) fn with_guard(reader: Box<dyn Read + Send>, writer: Box<dyn Write + Send>, guard: Guard) -> Self {
        Self {
            reader,
            writer,
            guard: Some(guard),
        }
    }

    /// Splits the channel into its halves and ownership token.
    ///
    /// The [`Guard`], if any, must be kept for as long as the halves are in use, and must be dropped before
    /// abandoning a blocking read on the read half.
    #[must_use]
    pub fn into_parts(self) -> (Box<dyn Read + Send>, Box<dyn Write + Send>, Option<Guard>) {
        (self.reader, self.writer, self.guard)
    }
}

/// Ownership token for the resource backing a [`Duplex`].
///
/// Dropping the token releases the resource: a child analyzer is reaped (and killed first if it does not exit
/// within a short grace period), a socket is shut down, unblocking any pending read.
pub struct Guard(Inner);

enum Inner {
    Child(Child),
    Socket(TcpStream),
}

impl Guard {
    pub(crate) fn child(child: Child) -> Self {
        Self(Inner::Child(child))
    }

    pub(crate) fn socket(stream: TcpStream) -> Self {
        Self(Inner::Socket(stream))
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        match self.0 {
            Inner::Child(ref mut child) => reap(child),
            Inner::Socket(ref stream) => {
                stream
                    .shutdown(Shutdown::Both)
                    .unwrap_or_else(|err| debug!("analyzer socket already closed: {err}"));
            },
        }
    }
}

/// Waits for a child analyzer to exit, killing it after [`REAP_GRACE`].
fn reap(child: &mut Child) {
    let deadline = Instant::now() + REAP_GRACE;

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                info!("analyzer exited with {status}");
                return;
            },
            Ok(None) if Instant::now() < deadline => thread::sleep(Duration::from_millis(10)),
            Ok(None) => break,
            Err(err) => {
                warn!("failed to poll analyzer process: {err}");
                break;
            },
        }
    }

    child.kill().unwrap_or_else(|err| warn!("failed to kill analyzer process: {err}"));
    child.wait().map(drop).unwrap_or_else(|err| warn!("failed to reap analyzer process: {err}"));
}
