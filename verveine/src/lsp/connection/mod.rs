//! Input/Output communication.
//!
//! I/O is performed with two threads, one for reading and one for writing.
//! Using two threads for I/O is a common pattern to avoid using non-blocking polling.
//!
//! [`crossbeam-channel`] is used to communicate between the threads, using message passing.
//!
//! [`crossbeam-channel`]: crossbeam_channel

use crossbeam_channel::{RecvError, SendError, TryRecvError};

use crate::lsp::message::Message;

pub mod duplex;
pub mod thread;

pub use duplex::Connection;

/// A trait defining the communication channel towards the analyzer.
#[cfg_attr(test, mockall::automock)]
pub trait Analyzer {
    /// Reads the next [`Message`] coming from the analyzer, blocking until one is available.
    ///
    /// # Errors
    /// Returns an error if the channel is disconnected.
    fn receive(&self) -> Result<Message, RecvError>;

    /// Reads the next [`Message`] coming from the analyzer, if one was already received.
    ///
    /// # Errors
    /// Returns an error if no message is pending, or if the channel is disconnected.
    fn try_receive(&self) -> Result<Message, TryRecvError>;

    /// Sends a [`Message`] to the analyzer.
    ///
    /// # Errors
    /// Returns an error if the channel is disconnected.
    fn send(&self, message: Message) -> Result<(), SendError<Message>>;
}
