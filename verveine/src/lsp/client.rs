//! [Language Server Protocol] client frontend, driving the analyzer lifecycle.
//!
//! [Language Server Protocol]: https://microsoft.github.io/language-server-protocol/

use std::collections::HashSet;

use anyhow::{bail, Context, Result};
use crossbeam_channel::TryRecvError;
use log::{debug, info, warn};
use lsp_types::notification::{
    DidChangeConfiguration, DidChangeTextDocument, DidCloseTextDocument, DidOpenTextDocument, Exit, Initialized, LogMessage,
    PublishDiagnostics, ShowMessage,
};
use lsp_types::request::{Initialize, Shutdown, WorkspaceConfiguration};
use lsp_types::{
    ClientCapabilities, ClientInfo, DidChangeConfigurationParams, DidChangeTextDocumentParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, InitializeParams, InitializeResult, InitializedParams, ServerInfo, TextDocumentContentChangeEvent,
    TextDocumentIdentifier, TextDocumentItem, Url, VersionedTextDocumentIdentifier,
};
use serde_json::{Map, Value};

use super::connection::{Analyzer, Connection};
use super::dispatcher::{notification, request};
use super::message::notification::Notification;
use super::message::request::Request;
use super::message::response::{Error as ResponseError, ErrorCode};
use super::message::Message;
use super::{LanguageClient, ProtocolClient, Session};
use crate::channel::Duplex;
use crate::config::ClientOptions;

/// State of the [`Client`].
///
/// Transitions are one-way: a closed client is never reused, a fresh activation creates a fresh client.
enum State {
    /// The `initialize` exchange has not been performed yet.
    NotInitialized,

    /// Handshake done: documents may be synchronised.
    Running,

    /// The `shutdown`/`exit` exchange has been performed.
    Closed,
}

/// [Language Server Protocol] client frontend.
///
/// A [`Client`] drives the lifecycle of one analyzer over one connection: the `initialize` handshake, the
/// configuration push, document synchronisation gated by the document filter, and the orderly shutdown.
/// Analyzer-originated traffic is dispatched towards the user-defined backend implementing [`LanguageClient`].
///
/// [Language Server Protocol]: https://microsoft.github.io/language-server-protocol/
pub struct Client<B: LanguageClient, C: Analyzer> {
    /// User-defined backend.
    backend: B,

    /// Connection towards the analyzer.
    connection: C,

    /// Options of this activation.
    options: ClientOptions,

    /// Actual state of the client.
    state: State,

    /// Identifier of the next request, incremented after each one.
    next_request_id: u64,

    /// Documents currently synchronised to the analyzer.
    open_documents: HashSet<Url>,

    /// Identity advertised by the analyzer during the handshake.
    server_info: Option<ServerInfo>,
}

impl<B: LanguageClient, C: Analyzer> Client<B, C> {
    /// Creates a new [`Client`], without performing the handshake.
    pub fn new(backend: B, connection: C, options: ClientOptions) -> Self {
        Self {
            backend,
            connection,
            options,
            state: State::NotInitialized,
            next_request_id: 1,
            open_documents: HashSet::new(),
            server_info: None,
        }
    }

    /// Performs the [`initialize`]/[`initialized`] handshake.
    ///
    /// The settings namespace is announced through the initialisation options, and `name` identifies this client
    /// to the analyzer. This method is guaranteed to be meaningful only once.
    ///
    /// # Errors
    /// Returns an error if the client was already initialised, if the channel closed, or if the analyzer answered
    /// with an error.
    ///
    /// [`initialize`]: https://microsoft.github.io/language-server-protocol/specifications/specification-current/#initialize
    /// [`initialized`]: https://microsoft.github.io/language-server-protocol/specifications/specification-current/#initialized
    pub fn initialize(&mut self, name: &str) -> Result<InitializeResult> {
        if !matches!(self.state, State::NotInitialized) {
            bail!("client already initialised");
        }

        let params = InitializeParams {
            process_id: Some(std::process::id()),
            initialization_options: Some(scoped(&self.options.settings_namespace, Value::Object(Map::new()))),
            capabilities: ClientCapabilities::default(),
            client_info: Some(ClientInfo {
                name: name.to_owned(),
                version: Some(crate::VERSION.to_owned()),
            }),
            ..InitializeParams::default()
        };

        let result = self.request::<Initialize>(params)?;

        self.notify::<Initialized>(InitializedParams {})?;

        self.state = State::Running;
        self.server_info = result.server_info.clone();

        info!(
            "analyzer initialised: {}",
            self.server_info.as_ref().map_or("<anonymous>", |server| server.name.as_str())
        );

        Ok(result)
    }

    /// Pushes `settings` to the analyzer, nested under the settings namespace.
    ///
    /// # Errors
    /// Returns an error if the channel is closed.
    pub fn configure(&mut self, settings: Value) -> Result<()> {
        self.notify::<DidChangeConfiguration>(DidChangeConfigurationParams {
            settings: scoped(&self.options.settings_namespace, settings),
        })
    }

    /// Performs the orderly [`shutdown`]/[`exit`] exchange.
    ///
    /// Does nothing on a client that is not running.
    ///
    /// # Errors
    /// Returns an error if the channel closed before the exchange completed.
    ///
    /// [`shutdown`]: https://microsoft.github.io/language-server-protocol/specifications/specification-current/#shutdown
    /// [`exit`]: https://microsoft.github.io/language-server-protocol/specifications/specification-current/#exit
    pub fn shutdown(&mut self) -> Result<()> {
        if !matches!(self.state, State::Running) {
            return Ok(());
        }

        self.state = State::Closed;

        self.request::<Shutdown>(())?;
        self.notify::<Exit>(())
    }

    /// Sends a [`Request`] and blocks until its [`Response`] arrives.
    ///
    /// Analyzer-originated traffic received while waiting is dispatched to the backend.
    ///
    /// [`Response`]: super::message::response::Response
    fn request<R: lsp_types::request::Request>(&mut self, params: R::Params) -> Result<R::Result> {
        let id = self.next_request_id;
        self.next_request_id += 1;

        self.connection
            .send(Message::Request(Request::new::<R>(id, params)))
            .context("channel to the analyzer is closed")?;

        loop {
            let Ok(message) = self.connection.receive() else {
                bail!("analyzer disconnected while waiting for an answer to {}", R::METHOD);
            };

            match message {
                Message::Response(response) if response.id == id => return response.extract::<R>(),
                message => self.dispatch(message),
            }
        }
    }

    /// Sends a [`Notification`].
    fn notify<N: lsp_types::notification::Notification>(&mut self, params: N::Params) -> Result<()> {
        self.connection
            .send(Message::Notification(Notification::new::<N>(params)))
            .context("channel to the analyzer is closed")?;

        Ok(())
    }

    /// Dispatches a received [`Message`] towards the user-defined [`LanguageClient`] backend's methods.
    fn dispatch(&mut self, message: Message) {
        match message {
            Message::Request(request) => {
                request::Dispatcher::new(request, &mut self.backend, &self.connection)
                    .handle::<WorkspaceConfiguration>(B::workspace_configuration)
                    .handle_fallthrough(ResponseError {
                        code: ErrorCode::MethodNotFound,
                        message: "method not supported by this client".to_owned(),
                        data: None,
                    });
            },

            Message::Notification(notification) => {
                notification::Dispatcher::new(notification, &mut self.backend)
                    .handle::<PublishDiagnostics>(B::publish_diagnostics)
                    .handle::<ShowMessage>(B::show_message)
                    .handle::<LogMessage>(B::log_message)
                    .handle_fallthrough("unhandled notification from analyzer");
            },

            Message::Response(response) => warn!("dropping answer to unknown request {}", response.id),
        }
    }
}

impl<B: LanguageClient, C: Analyzer> Session for Client<B, C> {
    fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.as_ref()
    }

    fn open_document(&mut self, document: TextDocumentItem) -> Result<bool> {
        if !matches!(self.state, State::Running) {
            bail!("client is not running");
        }

        if !self.options.handles(&document.language_id) {
            debug!("analyzer not engaged for `{}` documents", document.language_id);

            return Ok(false);
        }

        self.open_documents.insert(document.uri.clone());

        self.notify::<DidOpenTextDocument>(DidOpenTextDocumentParams { text_document: document })?;

        Ok(true)
    }

    fn change_document(&mut self, uri: Url, version: i32, text: String) -> Result<()> {
        if !matches!(self.state, State::Running) {
            bail!("client is not running");
        }

        if !self.open_documents.contains(&uri) {
            debug!("ignoring change to unsynchronised document {uri}");

            return Ok(());
        }

        self.notify::<DidChangeTextDocument>(DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier { uri, version },
            content_changes: vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text,
            }],
        })
    }

    fn close_document(&mut self, uri: Url) -> Result<()> {
        if !matches!(self.state, State::Running) {
            bail!("client is not running");
        }

        if !self.open_documents.remove(&uri) {
            return Ok(());
        }

        self.notify::<DidCloseTextDocument>(DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier { uri },
        })
    }

    fn process_pending(&mut self) -> Result<()> {
        loop {
            match self.connection.try_receive() {
                Ok(message) => self.dispatch(message),
                Err(TryRecvError::Empty) => return Ok(()),
                Err(TryRecvError::Disconnected) => bail!("analyzer disconnected"),
            }
        }
    }

    fn stop(mut self: Box<Self>) {
        self.shutdown().unwrap_or_else(|err| warn!("orderly shutdown failed: {err}"));
    }
}

/// Factory of [`Session`]s over freshly launched channels.
///
/// `LspClient` is the provided [`ProtocolClient`] implementation: each [`start`] builds a fresh backend, pumps the
/// channel with a [`Connection`], performs the handshake, then pushes an initial empty configuration under the
/// settings namespace. Starting twice yields two fully independent sessions.
///
/// [`start`]: ProtocolClient::start
pub struct LspClient<F> {
    /// Builds one backend per started session.
    factory: F,
}

impl<F> LspClient<F> {
    /// Creates a new [`LspClient`] building backends with `factory`.
    pub fn new(factory: F) -> Self {
        Self { factory }
    }
}

impl<B, F> ProtocolClient for LspClient<F>
where
    B: LanguageClient + 'static,
    F: Fn() -> B,
{
    fn start(&self, name: &str, channel: Duplex, options: ClientOptions) -> Result<Box<dyn Session>> {
        let connection = Connection::new(channel);
        let mut client = Client::new((self.factory)(), connection, options);

        client.initialize(name)?;
        client.configure(Value::Object(Map::new()))?;

        Ok(Box::new(client))
    }
}

/// Nests `settings` under the namespace key, as analyzers expect their configuration block.
fn scoped(namespace: &str, settings: Value) -> Value {
    let mut root = Map::new();

    root.insert(namespace.to_owned(), settings);

    Value::Object(root)
}

#[cfg(test)]
mod tests {
    use lsp_types::ServerCapabilities;
    use serde_json::json;

    use super::super::message::response::Response;
    use super::*;
    use crate::lsp::connection::MockAnalyzer;
    use crate::lsp::MockLanguageClient;

    fn options() -> ClientOptions {
        ClientOptions::new(vec!["plaintext".to_owned()], "verveine".to_owned())
    }

    fn handshake_connection() -> MockAnalyzer {
        let mut connection = MockAnalyzer::new();

        connection
            .expect_send()
            .times(1)
            .withf(|message| matches!(message, Message::Request(request) if request.method == "initialize"))
            .returning(|_| Ok(()));

        connection.expect_receive().times(1).returning(|| {
            Ok(Message::Response(Response::new::<Initialize>(1, InitializeResult {
                capabilities: ServerCapabilities::default(),
                server_info: Some(ServerInfo {
                    name: "mock-analyzer".to_owned(),
                    version: None,
                }),
            })))
        });

        connection
            .expect_send()
            .times(1)
            .withf(|message| matches!(message, Message::Notification(notification) if notification.method == "initialized"))
            .returning(|_| Ok(()));

        connection
    }

    #[test]
    fn settings_are_nested_under_the_namespace() {
        assert_eq!(
            scoped("pyls", json!({"plugins": {"pycodestyle": {"enabled": false}}})),
            json!({"pyls": {"plugins": {"pycodestyle": {"enabled": false}}}})
        );
    }

    #[test]
    fn initialize_performs_the_handshake() {
        let mut client = Client::new(MockLanguageClient::new(), handshake_connection(), options());

        let result = client.initialize("tests").unwrap();

        assert_eq!(result.server_info.unwrap().name, "mock-analyzer");
        assert_eq!(client.server_info().unwrap().name, "mock-analyzer");
    }

    #[test]
    fn initialize_announces_the_settings_namespace() {
        let mut connection = MockAnalyzer::new();

        connection
            .expect_send()
            .times(1)
            .withf(|message| {
                let Message::Request(request) = message else { return false; };

                request.params.get("initializationOptions") == Some(&json!({"verveine": {}}))
            })
            .returning(|_| Ok(()));

        connection.expect_receive().times(1).returning(|| {
            Ok(Message::Response(Response::new::<Initialize>(1, InitializeResult::default())))
        });

        connection.expect_send().times(1).returning(|_| Ok(()));

        let mut client = Client::new(MockLanguageClient::new(), connection, options());

        client.initialize("tests").unwrap();
    }

    #[test]
    fn initialize_twice_is_an_error() {
        let mut client = Client::new(MockLanguageClient::new(), handshake_connection(), options());

        client.initialize("tests").unwrap();

        assert!(client.initialize("tests").is_err());
    }

    #[test]
    fn documents_outside_the_filter_are_not_synchronised() {
        let mut client = Client::new(MockLanguageClient::new(), handshake_connection(), options());

        client.initialize("tests").unwrap();

        let document = TextDocumentItem {
            uri: Url::parse("file:///tmp/lib.rs").unwrap(),
            language_id: "rust".to_owned(),
            version: 0,
            text: String::new(),
        };

        assert!(!client.open_document(document).unwrap());
    }

    #[test]
    fn documents_inside_the_filter_are_synchronised() {
        let mut connection = handshake_connection();

        connection
            .expect_send()
            .times(1)
            .withf(|message| matches!(message, Message::Notification(notification) if notification.method == "textDocument/didOpen"))
            .returning(|_| Ok(()));

        let mut client = Client::new(MockLanguageClient::new(), connection, options());

        client.initialize("tests").unwrap();

        let document = TextDocumentItem {
            uri: Url::parse("file:///tmp/notes.txt").unwrap(),
            language_id: "plaintext".to_owned(),
            version: 0,
            text: "hello".to_owned(),
        };

        assert!(client.open_document(document).unwrap());
    }

    #[test]
    fn changes_to_unopened_documents_are_ignored() {
        let mut client = Client::new(MockLanguageClient::new(), handshake_connection(), options());

        client.initialize("tests").unwrap();

        client
            .change_document(Url::parse("file:///tmp/notes.txt").unwrap(), 1, "hello".to_owned())
            .unwrap();
    }

    #[test]
    fn shutdown_performs_the_exchange_once() {
        let mut connection = handshake_connection();

        connection
            .expect_send()
            .times(1)
            .withf(|message| matches!(message, Message::Request(request) if request.method == "shutdown"))
            .returning(|_| Ok(()));

        connection
            .expect_receive()
            .times(1)
            .returning(|| Ok(Message::Response(Response::new::<Shutdown>(2, ()))));

        connection
            .expect_send()
            .times(1)
            .withf(|message| matches!(message, Message::Notification(notification) if notification.method == "exit"))
            .returning(|_| Ok(()));

        let mut client = Client::new(MockLanguageClient::new(), connection, options());

        client.initialize("tests").unwrap();
        client.shutdown().unwrap();

        // A second call must not speak to the analyzer again.
        client.shutdown().unwrap();
    }

    #[test]
    fn interleaved_notifications_reach_the_backend() {
        let mut connection = MockAnalyzer::new();
        let mut backend = MockLanguageClient::new();

        backend.expect_publish_diagnostics().times(1).return_const(());

        connection.expect_send().times(2).returning(|_| Ok(()));

        let mut responses = vec![
            Message::Notification(Notification::new::<PublishDiagnostics>(lsp_types::PublishDiagnosticsParams {
                uri: Url::parse("file:///tmp/notes.txt").unwrap(),
                diagnostics: vec![],
                version: None,
            })),
            Message::Response(Response::new::<Initialize>(1, InitializeResult::default())),
        ];

        connection.expect_receive().times(2).returning(move || Ok(responses.remove(0)));

        let mut client = Client::new(backend, connection, options());

        client.initialize("tests").unwrap();
    }
}
