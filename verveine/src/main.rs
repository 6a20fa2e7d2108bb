//! Command-line smoke driver for the bootstrap client.
//!
//! Launches (or connects to) an analyzer, performs the handshake, optionally opens one document and reports what
//! the analyzer has to say about it, then disposes the session.

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use clap::Parser;
use log::info;
use lsp_types::{PublishDiagnosticsParams, ShowMessageParams, TextDocumentItem, Url};
use verveine::activation::activate;
use verveine::config::{ClientOptions, LaunchConfig, LaunchStrategy, ProcessConfig, SocketConfig};
use verveine::lsp::client::LspClient;
use verveine::lsp::{LanguageClient, Session};
use verveine::{NAME, VERSION};

/// How long the driver waits for diagnostics after opening a document.
const REPORT_WINDOW: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// analyzer executable to launch
    #[arg(required_unless_present = "connect", conflicts_with = "connect")]
    command: Option<PathBuf>,

    /// arguments passed to the analyzer
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    arguments: Vec<String>,

    /// connect to an analyzer already listening on this loopback port instead of launching one
    #[arg(long)]
    connect: Option<u16>,

    /// document types the analyzer is engaged for
    #[arg(long = "filter", default_value = "plaintext")]
    document_filter: Vec<String>,

    /// key under which settings are pushed to the analyzer
    #[arg(long, default_value = "verveine")]
    settings_namespace: String,

    /// open this document after the handshake
    #[arg(long)]
    open: Option<PathBuf>,

    /// document type of the opened document
    #[arg(long, default_value = "plaintext")]
    language: String,
}

/// Backend printing everything the analyzer reports.
#[derive(Default)]
struct Reporter;

impl LanguageClient for Reporter {
    fn publish_diagnostics(&mut self, params: PublishDiagnosticsParams) {
        for diagnostic in params.diagnostics {
            println!("{}:{}: {}", params.uri, diagnostic.range.start.line + 1, diagnostic.message);
        }
    }

    fn show_message(&mut self, params: ShowMessageParams) {
        println!("analyzer says: {}", params.message);
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    info!("Starting {NAME} {VERSION}");

    let strategy = match args.connect {
        Some(port) => LaunchStrategy::Socket(SocketConfig::new(port)),
        None => LaunchStrategy::Process(ProcessConfig::new(
            args.command.unwrap_or_else(|| unreachable!("clap requires a command without --connect")),
            args.arguments,
        )),
    };

    let config = LaunchConfig::new(
        NAME.to_owned(),
        strategy,
        ClientOptions::new(args.document_filter, args.settings_namespace),
    );

    let client = LspClient::new(Reporter::default);
    let mut session = activate(&config, &client)?;

    println!(
        "connected to {}",
        session.server_info().map_or("an anonymous analyzer", |server| server.name.as_str())
    );

    if let Some(path) = args.open {
        let text = fs::read_to_string(&path)?;
        let path = fs::canonicalize(&path)?;
        let uri = Url::from_file_path(&path).map_err(|()| anyhow!("not an absolute path: {}", path.display()))?;

        let document = TextDocumentItem {
            uri,
            language_id: args.language.clone(),
            version: 0,
            text,
        };

        if session.open_document(document)? {
            // Give the analyzer a moment to publish something about the document.
            let deadline = Instant::now() + REPORT_WINDOW;

            while Instant::now() < deadline {
                session.process_pending()?;
                thread::sleep(Duration::from_millis(50));
            }
        } else {
            println!("analyzer is not engaged for `{}` documents", args.language);
        }
    }

    session.stop();

    info!("Exiting {NAME}");

    Ok(())
}
