//! Join-on-drop wrapper for the I/O threads.

use std::thread::JoinHandle;

use log::error;

/// Handles of the spawned I/O threads, joined when the owning connection is dropped.
///
/// The backing channel resource must be released before this wrapper is dropped, so that both threads are
/// unblocked and the joins terminate.
pub(super) struct Threads {
    /// Reader thread.
    pub reader: Option<JoinHandle<()>>,

    /// Writer thread.
    pub writer: Option<JoinHandle<()>>,
}

impl Drop for Threads {
    fn drop(&mut self) {
        for (name, handle) in [("reader", self.reader.take()), ("writer", self.writer.take())] {
            if let Some(handle) = handle {
                handle.join().unwrap_or_else(|_| error!("failed to join {name} thread"));
            }
        }
    }
}
