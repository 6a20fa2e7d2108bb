//! Minimal loopback analysis server.
//!
//! `verveine-analyzer` is the peer used by the round-trip tests and as a demo analyzer: it answers the
//! `initialize` handshake with its identity, echoes the first line of every synchronised document back as a
//! diagnostic, and honours the `shutdown`/`exit` exchange. It serves either on its standard streams (the process
//! launch strategy) or a single connection on a loopback TCP port (the socket launch strategy, started
//! out-of-band with `--listen`).

use std::io::{self, BufRead, BufReader, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpListener};

use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use lsp_types::notification::PublishDiagnostics;
use lsp_types::request::{Initialize, Shutdown};
use lsp_types::{
    Diagnostic, DidChangeTextDocumentParams, DidOpenTextDocumentParams, InitializeResult, PublishDiagnosticsParams, Range,
    ServerCapabilities, ServerInfo, TextDocumentSyncCapability, TextDocumentSyncKind, Url,
};
use verveine::lsp::message::notification::Notification;
use verveine::lsp::message::request::Request;
use verveine::lsp::message::response::{Error, ErrorCode, Response};
use verveine::lsp::message::Message;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = "verveine-analyzer";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// serve a single connection on this loopback TCP port instead of the standard streams
    #[arg(long)]
    listen: Option<u16>,

    /// increase verbosity (accepted for compatibility with launchers)
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    debug!("verbosity flag count: {}", args.verbose);

    match args.listen {
        Some(port) => {
            let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, port)))?;

            info!("Serving {NAME} on {}", listener.local_addr()?);

            let (stream, peer) = listener.accept()?;

            info!("Client connected from {peer}");

            let mut reader = BufReader::new(stream.try_clone()?);
            let mut writer = stream;

            serve(&mut reader, &mut writer)
        },

        None => {
            info!("Starting {NAME} on standard streams");

            serve(&mut BufReader::new(io::stdin()), &mut io::stdout())
        },
    }
}

/// Serves one client until it sends `exit` or closes its end of the channel.
fn serve(reader: &mut dyn BufRead, writer: &mut dyn Write) -> Result<()> {
    while let Some(message) = Message::read(reader)? {
        match message {
            Message::Request(request) => answer(request, writer)?,

            Message::Notification(notification) => match notification.method.as_str() {
                "exit" => {
                    info!("Exit received");
                    break;
                },

                "textDocument/didOpen" => {
                    let params: DidOpenTextDocumentParams = serde_json::from_value(notification.params)?;

                    echo(params.text_document.uri, Some(params.text_document.version), &params.text_document.text, writer)?;
                },

                "textDocument/didChange" => {
                    let params: DidChangeTextDocumentParams = serde_json::from_value(notification.params)?;

                    if let Some(change) = params.content_changes.into_iter().last() {
                        echo(params.text_document.uri, Some(params.text_document.version), &change.text, writer)?;
                    }
                },

                method => debug!("{method} ignored"),
            },

            Message::Response(_) => (),
        }
    }

    info!("Exiting {NAME}");

    Ok(())
}

/// Answers a client request.
fn answer(request: Request, writer: &mut dyn Write) -> Result<()> {
    let response = match request.method.as_str() {
        "initialize" => Response::new::<Initialize>(request.id, InitializeResult {
            capabilities: capabilities(),
            server_info: Some(ServerInfo {
                name: NAME.to_owned(),
                version: Some(VERSION.to_owned()),
            }),
        }),

        "shutdown" => {
            info!("Shutdown requested");

            Response::new::<Shutdown>(request.id, ())
        },

        method => Response::error(request.id, Error {
            code: ErrorCode::MethodNotFound,
            message: format!("{method} is not supported"),
            data: None,
        }),
    };

    Message::Response(response).write(writer)
}

/// Capabilities advertised during the handshake.
fn capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
        ..ServerCapabilities::default()
    }
}

/// Publishes one diagnostic echoing the first line of the document, making round trips observable.
fn echo(uri: Url, version: Option<i32>, text: &str, writer: &mut dyn Write) -> Result<()> {
    let first_line = text.lines().next().unwrap_or_default();

    let diagnostic = Diagnostic::new_simple(Range::default(), format!("echo: {first_line}"));

    Message::Notification(Notification::new::<PublishDiagnostics>(PublishDiagnosticsParams {
        uri,
        diagnostics: vec![diagnostic],
        version,
    }))
    .write(writer)
}
