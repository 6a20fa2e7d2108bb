//! Bootstrap client for external language analyzers.
//!
//! This crate connects a host editor to a language-analysis server speaking the
//! [Language Server Protocol]. It owns the bootstrap half of that relationship:
//! from a [`LaunchConfig`], it either spawns the analyzer as a child process and
//! talks over its standard streams, or connects to an already-running analyzer
//! over loopback TCP. The resulting [`Duplex`] channel is handed, together with
//! the document filter and settings namespace, to a [`ProtocolClient`] which
//! performs the protocol handshake and returns a disposable [`Session`].
//!
//! A ready-made [`ProtocolClient`] implementation is provided in [`lsp::client`];
//! hosts with their own protocol machinery only need [`activation`] and
//! [`channel`].
//!
//! [Language Server Protocol]: https://microsoft.github.io/language-server-protocol/
//! [`Duplex`]: channel::Duplex
//! [`LaunchConfig`]: config::LaunchConfig
//! [`ProtocolClient`]: lsp::ProtocolClient
//! [`Session`]: lsp::Session

pub mod activation;
pub mod channel;
pub mod config;
pub mod error;
pub mod lsp;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
