//! [Language Server Protocol] client machinery.
//!
//! This module defines a [`Client`], communicating through a [`Connection`] to a [Language Server Protocol] analyzer.
//! The [`Client`] uses a user-defined backend implementing [`LanguageClient`] which defines how analyzer-originated
//! traffic (diagnostics, messages, configuration requests) is handled by the host.
//!
//! Hosts consume the machinery through the [`ProtocolClient`] and [`Session`] contracts: a [`ProtocolClient`] is
//! given a freshly launched channel and returns a started, disposable [`Session`].
//!
//! [Language Server Protocol]: https://microsoft.github.io/language-server-protocol/
//! [`Client`]: client::Client
//! [`Connection`]: connection::Connection

#![allow(clippy::wildcard_imports)]

pub mod client;
pub mod connection;
pub mod dispatcher;
pub mod message;

use anyhow::Result;
use log::info;
use lsp_types::*;
use serde_json::Value;

use crate::channel::Duplex;
use crate::config::ClientOptions;

/// A trait for the host-side backend of a [Language Server Protocol] client.
///
/// This trait defines how analyzer-originated [requests] and [notifications] are handled. The [`Client`] will call
/// the appropriate method of the [`LanguageClient`] when such a message is received; unimplemented methods log and,
/// for requests, answer with an empty result.
///
/// [Language Server Protocol]: https://microsoft.github.io/language-server-protocol/
/// [notifications]: https://microsoft.github.io/language-server-protocol/specifications/specification-current/#notificationMessage
/// [requests]: https://microsoft.github.io/language-server-protocol/specifications/specification-current/#requestMessage
/// [`Client`]: client::Client
#[allow(unused_variables)]
#[cfg_attr(test, mockall::automock)]
pub trait LanguageClient {
    /// [`textDocument/publishDiagnostics`] notification.
    ///
    /// [`textDocument/publishDiagnostics`]: https://microsoft.github.io/language-server-protocol/specifications/specification-current/#textDocument_publishDiagnostics
    fn publish_diagnostics(&mut self, params: PublishDiagnosticsParams) {
        info!("textDocument/publishDiagnostics not handled");
    }

    /// [`window/showMessage`] notification.
    ///
    /// [`window/showMessage`]: https://microsoft.github.io/language-server-protocol/specifications/specification-current/#window_showMessage
    fn show_message(&mut self, params: ShowMessageParams) {
        info!("window/showMessage not handled");
    }

    /// [`window/logMessage`] notification.
    ///
    /// [`window/logMessage`]: https://microsoft.github.io/language-server-protocol/specifications/specification-current/#window_logMessage
    fn log_message(&mut self, params: LogMessageParams) {
        info!("window/logMessage not handled");
    }

    /// [`workspace/configuration`] request.
    ///
    /// The analyzer asks for configuration sections; the default implementation answers with `null` for each
    /// requested item.
    ///
    /// [`workspace/configuration`]: https://microsoft.github.io/language-server-protocol/specifications/specification-current/#workspace_configuration
    fn workspace_configuration(&mut self, params: ConfigurationParams) -> Vec<Value> {
        info!("workspace/configuration not handled");

        vec![Value::Null; params.items.len()]
    }
}

/// A started protocol session over one channel.
///
/// The session is the handle returned by [`ProtocolClient::start`]: the host drives document synchronisation
/// through it and disposes it when the analyzer is no longer needed. Disposing — by [`stop`] or by drop — releases
/// the channel and never raises.
///
/// [`stop`]: Session::stop
pub trait Session {
    /// Identity advertised by the analyzer during the handshake, if any.
    fn server_info(&self) -> Option<&ServerInfo>;

    /// Synchronises a newly opened document, if its type passes the document filter.
    ///
    /// Returns whether the document is now synchronised.
    ///
    /// # Errors
    /// Returns an error if the channel is closed.
    fn open_document(&mut self, document: TextDocumentItem) -> Result<bool>;

    /// Synchronises the new full content of an opened document.
    ///
    /// Changes to documents that were never opened (or did not pass the filter) are ignored.
    ///
    /// # Errors
    /// Returns an error if the channel is closed.
    fn change_document(&mut self, uri: Url, version: i32, text: String) -> Result<()>;

    /// Closes a synchronised document.
    ///
    /// # Errors
    /// Returns an error if the channel is closed.
    fn close_document(&mut self, uri: Url) -> Result<()>;

    /// Dispatches all analyzer-originated traffic received so far, without blocking.
    ///
    /// # Errors
    /// Returns an error if the analyzer disconnected.
    fn process_pending(&mut self) -> Result<()>;

    /// Performs the orderly `shutdown`/`exit` exchange and releases the channel.
    fn stop(self: Box<Self>);
}

/// A trait for the protocol implementation consumed by [`activate`].
///
/// Given an identifying name, a freshly launched channel and the activation options, `start` performs whatever
/// handshake the protocol requires and returns the started [`Session`].
///
/// [`activate`]: crate::activation::activate
pub trait ProtocolClient {
    /// Starts a session over `channel`.
    ///
    /// # Errors
    /// Returns an error if the handshake fails; the channel is released in that case.
    fn start(&self, name: &str, channel: Duplex, options: ClientOptions) -> Result<Box<dyn Session>>;
}
