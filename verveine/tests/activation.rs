//! End-to-end activation tests, driving the real binaries over real channels.

use std::io::BufReader;
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use lsp_types::request::{Initialize, Shutdown};
use lsp_types::{InitializeResult, PublishDiagnosticsParams, ServerCapabilities, ServerInfo, TextDocumentItem, Url};
use verveine::activation::activate;
use verveine::config::{ClientOptions, LaunchConfig, LaunchStrategy, ProcessConfig, SocketConfig};
use verveine::error::Error;
use verveine::lsp::client::LspClient;
use verveine::lsp::message::response::Response;
use verveine::lsp::message::Message;
use verveine::lsp::{LanguageClient, Session};

/// Backend collecting published diagnostics for inspection.
#[derive(Clone, Default)]
struct Collector {
    diagnostics: Arc<Mutex<Vec<PublishDiagnosticsParams>>>,
}

impl LanguageClient for Collector {
    fn publish_diagnostics(&mut self, params: PublishDiagnosticsParams) {
        self.diagnostics.lock().unwrap().push(params);
    }
}

fn process_config(filter: &[&str]) -> LaunchConfig {
    LaunchConfig::new(
        "tests".to_owned(),
        LaunchStrategy::Process(ProcessConfig::new(PathBuf::from(env!("CARGO_BIN_EXE_verveine-analyzer")), vec![])),
        ClientOptions::new(filter.iter().map(ToString::to_string).collect(), "verveine".to_owned()),
    )
}

fn socket_config(port: u16) -> LaunchConfig {
    LaunchConfig::new(
        "tests".to_owned(),
        LaunchStrategy::Socket(SocketConfig::new(port)),
        ClientOptions::new(vec!["plaintext".to_owned()], "verveine".to_owned()),
    )
}

fn collecting_client(collector: &Collector) -> LspClient<impl Fn() -> Collector> {
    let collector = collector.clone();

    LspClient::new(move || collector.clone())
}

fn plaintext_document(uri: &str, text: &str) -> TextDocumentItem {
    TextDocumentItem {
        uri: Url::parse(uri).unwrap(),
        language_id: "plaintext".to_owned(),
        version: 0,
        text: text.to_owned(),
    }
}

/// Pumps the session until the collector holds diagnostics, or until the deadline.
fn wait_for_diagnostics(session: &mut dyn Session, collector: &Collector, patience: Duration) -> Vec<PublishDiagnosticsParams> {
    let deadline = Instant::now() + patience;

    loop {
        session.process_pending().unwrap();

        {
            let diagnostics = collector.diagnostics.lock().unwrap();

            if !diagnostics.is_empty() || Instant::now() >= deadline {
                return diagnostics.clone();
            }
        }

        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn process_launch_performs_the_handshake() {
    let collector = Collector::default();
    let client = collecting_client(&collector);

    let session = activate(&process_config(&["plaintext"]), &client).unwrap();

    assert_eq!(session.server_info().unwrap().name, "verveine-analyzer");

    session.stop();
}

#[test]
fn unknown_command_surfaces_a_launch_failure() {
    let config = LaunchConfig::new(
        "tests".to_owned(),
        LaunchStrategy::Process(ProcessConfig::new(PathBuf::from("/nonexistent/analyzer"), vec![])),
        ClientOptions::new(vec!["plaintext".to_owned()], "verveine".to_owned()),
    );

    let client = LspClient::new(Collector::default);

    let error = activate(&config, &client).map(drop).unwrap_err();

    assert!(matches!(error.downcast_ref::<Error>(), Some(Error::LaunchFailure { .. })));
}

#[test]
fn opened_documents_round_trip_through_the_analyzer() {
    let collector = Collector::default();
    let client = collecting_client(&collector);

    let mut session = activate(&process_config(&["plaintext"]), &client).unwrap();

    let document = plaintext_document("file:///tmp/notes.txt", "hello analyzer\nsecond line");

    assert!(session.open_document(document).unwrap());

    let diagnostics = wait_for_diagnostics(session.as_mut(), &collector, Duration::from_secs(5));

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].uri.as_str(), "file:///tmp/notes.txt");
    assert_eq!(diagnostics[0].diagnostics[0].message, "echo: hello analyzer");

    session.stop();
}

#[test]
fn documents_outside_the_filter_are_not_synchronised() {
    let collector = Collector::default();
    let client = collecting_client(&collector);

    let mut session = activate(&process_config(&["plaintext"]), &client).unwrap();

    let document = TextDocumentItem {
        uri: Url::parse("file:///tmp/lib.rs").unwrap(),
        language_id: "rust".to_owned(),
        version: 0,
        text: "fn main() {}".to_owned(),
    };

    assert!(!session.open_document(document).unwrap());

    let diagnostics = wait_for_diagnostics(session.as_mut(), &collector, Duration::from_millis(300));

    assert!(diagnostics.is_empty());

    session.stop();
}

#[test]
fn each_activation_creates_an_independent_session() {
    let collector = Collector::default();
    let client = collecting_client(&collector);
    let config = process_config(&["plaintext"]);

    let first = activate(&config, &client).unwrap();
    let mut second = activate(&config, &client).unwrap();

    // Disposing the first session must leave the second fully functional.
    first.stop();

    let document = plaintext_document("file:///tmp/after.txt", "still alive");

    assert!(second.open_document(document).unwrap());

    let diagnostics = wait_for_diagnostics(second.as_mut(), &collector, Duration::from_secs(5));

    assert_eq!(diagnostics[0].diagnostics[0].message, "echo: still alive");

    second.stop();
}

#[test]
fn dropping_a_session_does_not_raise() {
    let client = LspClient::new(Collector::default);

    let session = activate(&process_config(&["plaintext"]), &client).unwrap();

    drop(session);
}

/// Binds an ephemeral port and serves one handshake/shutdown exchange on it, the way an out-of-band analyzer
/// would.
fn spawn_listening_analyzer() -> (u16, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut writer = stream;

        while let Some(message) = Message::read(&mut reader).unwrap() {
            match message {
                Message::Request(request) if request.method == "initialize" => {
                    Message::Response(Response::new::<Initialize>(request.id, InitializeResult {
                        capabilities: ServerCapabilities::default(),
                        server_info: Some(ServerInfo {
                            name: "socket-analyzer".to_owned(),
                            version: None,
                        }),
                    }))
                    .write(&mut writer)
                    .unwrap();
                },

                Message::Request(request) if request.method == "shutdown" => {
                    Message::Response(Response::new::<Shutdown>(request.id, ())).write(&mut writer).unwrap();
                },

                Message::Notification(notification) if notification.method == "exit" => break,

                _ => (),
            }
        }
    });

    (port, handle)
}

#[test]
fn socket_launch_connects_to_a_listening_analyzer() {
    let (port, handle) = spawn_listening_analyzer();

    let client = LspClient::new(Collector::default);

    let session = activate(&socket_config(port), &client).unwrap();

    assert_eq!(session.server_info().unwrap().name, "socket-analyzer");

    session.stop();

    handle.join().unwrap();
}

#[test]
fn socket_launch_without_listener_surfaces_a_connection_failure() {
    // Bind then drop, so the port was just free.
    let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();

    let client = LspClient::new(Collector::default);

    let error = activate(&socket_config(port), &client).map(drop).unwrap_err();

    assert!(matches!(error.downcast_ref::<Error>(), Some(Error::ConnectionFailure { .. })));
}
