//! I/O communication over a launched [`Duplex`] channel.

use std::io::{BufReader, BufWriter, Read, Write};
use std::thread;

use crossbeam_channel::{unbounded, Receiver, RecvError, SendError, Sender, TryRecvError};
use log::{debug, error, info};

use super::thread::Threads;
use super::Analyzer;
use crate::channel::{Duplex, Guard};
use crate::lsp::message::Message;

/// Message passing from the spawned threads.
///
/// Please note that the `Receiver` and `Sender` have unbounded capacity: the client has no worker pool, and
/// back-pressure is delegated to the peers of the channel.
pub struct Connection {
    /// Read from the reader thread.
    pub(crate) receiver: Receiver<Message>,

    /// Write to the writer thread.
    pub(crate) sender: Sender<Message>,

    /// Backing resource of the channel.
    ///
    /// Released before the threads are joined, so that a wedged analyzer cannot block the drop.
    _guard: Option<Guard>,

    /// Spawned threads.
    _threads: Threads,
}

impl Connection {
    /// Creates a new [`Connection`] pumping messages over `channel`.
    #[must_use]
    pub fn new(channel: Duplex) -> Self {
        let (read_half, write_half, guard) = channel.into_parts();

        let (reader_sender, receiver) = unbounded::<Message>();
        let (sender, writer_receiver) = unbounded::<Message>();

        let reader = Some(thread::spawn(move || Self::reader_thread(&reader_sender, BufReader::new(read_half))));
        let writer = Some(thread::spawn(move || Self::writer_thread(&writer_receiver, BufWriter::new(write_half))));

        Self {
            receiver,
            sender,
            _guard: guard,
            _threads: Threads { reader, writer },
        }
    }

    /// Reader thread function.
    ///
    /// Ends when the analyzer closes its end of the channel, when a corrupted message desynchronises the stream,
    /// or when the receiving side of the connection is gone.
    fn reader_thread<R: Read>(sender: &Sender<Message>, mut reader: BufReader<R>) {
        info!("Reader thread started");

        loop {
            match Message::read(&mut reader) {
                Ok(Some(msg)) => {
                    debug!("Received: {msg:?}");

                    if sender.send(msg).is_err() {
                        break;
                    }
                },
                Ok(None) => {
                    info!("Analyzer closed its end of the channel");
                    break;
                },
                Err(err) => {
                    error!("Corrupted message from analyzer: {err}");
                    break;
                },
            }
        }

        info!("Reader thread exited");
    }

    /// Writer thread function.
    fn writer_thread<W: Write>(receiver: &Receiver<Message>, mut writer: BufWriter<W>) {
        info!("Writer thread started");

        for msg in receiver {
            debug!("Sending: {msg:?}");

            msg.write(&mut writer).unwrap_or_else(|err| {
                error!("Failed to write message to analyzer: {err}");
            });
        }

        info!("Writer thread exited");
    }
}

impl Analyzer for Connection {
    fn receive(&self) -> Result<Message, RecvError> {
        self.receiver.recv()
    }

    fn try_receive(&self) -> Result<Message, TryRecvError> {
        self.receiver.try_recv()
    }

    fn send(&self, message: Message) -> Result<(), SendError<Message>> {
        self.sender.send(message)
    }
}
