//! [`Request`] dispatcher.

use log::{error, warn};

use crate::lsp::connection::Analyzer;
use crate::lsp::message::request::Request;
use crate::lsp::message::response::{Error, ErrorCode, Response};
use crate::lsp::message::Message;
use crate::lsp::LanguageClient;

/// Dispatches an analyzer-originated [`Request`] to the [`LanguageClient`].
///
/// The [`Dispatcher`] has to be called through every supported [`handle`]-like method.
///
/// Each [`handle`]-like method will look at the method of [`Request`]. If there is a match, the corresponding
/// [`LanguageClient`]'s method is called and its result is sent back over the connection. Malformed parameters are
/// answered with an [`ErrorCode::InvalidParams`] error.
///
/// If there is no match after every [`handle`]-like call, the [`handle_fallthrough`] method should be called.
///
/// [`handle`]: Dispatcher::handle
/// [`handle_fallthrough`]: Dispatcher::handle_fallthrough
pub(in crate::lsp) struct Dispatcher<'dispatcher, B: LanguageClient, C: Analyzer> {
    /// [`Request`] to be dispatched.
    ///
    /// Will be transformed into `None` if consumed.
    request: Option<Request>,

    /// [`LanguageClient`] where the [`Request`] is dispatched.
    backend: &'dispatcher mut B,

    /// The connection to send the [`Response`] to.
    connection: &'dispatcher C,
}

impl<'dispatcher, B: LanguageClient, C: Analyzer> Dispatcher<'dispatcher, B, C> {
    /// Creates a new [`Dispatcher`].
    pub fn new(request: Request, backend: &'dispatcher mut B, connection: &'dispatcher C) -> Self {
        Self {
            request: Some(request),

            backend,
            connection,
        }
    }

    /// Dispatches the [`Request`] to the [`LanguageClient`], if the [`Request`]'s method corresponds to the
    /// [`lsp_types::request::Request::METHOD`].
    pub fn handle<R>(&mut self, handler: fn(&mut B, R::Params) -> R::Result) -> &mut Self
    where
        R: lsp_types::request::Request,
    {
        let Some(ref request) = self.request else { return self; };

        if request.method != R::METHOD {
            return self;
        }

        let request = self.request.take().unwrap_or_else(|| unreachable!("checked as Some above"));

        let response = match serde_json::from_value::<R::Params>(request.params) {
            Ok(params) => Response::new::<R>(request.id, handler(self.backend, params)),
            Err(err) => {
                warn!("malformed {} request from analyzer: {err}", R::METHOD);

                Response::error(request.id, Error {
                    code: ErrorCode::InvalidParams,
                    message: err.to_string(),
                    data: None,
                })
            },
        };

        self.connection
            .send(Message::Response(response))
            .unwrap_or_else(|err| error!("Failed to send message to writer thread: {err}"));

        self
    }

    /// Fallthrough handler if the [`Request`] is not handled by any [`handle`]-like method.
    ///
    /// This function should be used at the end of the [`handle`]-like method chain.
    ///
    /// [`handle`]: Dispatcher::handle
    pub fn handle_fallthrough(&mut self, error_response: Error) {
        let Some(ref request) = self.request else { return; };

        warn!("{} on {}", error_response.message, request.method);

        let response = Response::error(request.id, error_response);

        self.connection
            .send(Message::Response(response))
            .unwrap_or_else(|err| error!("Failed to send message to writer thread: {err}"));
    }
}
