//! [`Notification`] dispatcher.

use log::warn;

use crate::lsp::message::notification::Notification;
use crate::lsp::LanguageClient;

/// Dispatches an analyzer-originated [`Notification`] to the [`LanguageClient`].
///
/// The [`Dispatcher`] has to be called through every supported [`handle`]-like method.
///
/// Each [`handle`]-like method will look at the method of [`Notification`]. If there is a match, the corresponding
/// [`LanguageClient`]'s method is called with the deserialised parameters. Unlike outgoing traffic, incoming
/// parameters come from an arbitrary peer: malformed ones are logged and dropped, never trusted.
///
/// If there is no match after every [`handle`]-like call, the [`handle_fallthrough`] method should be called.
///
/// [`handle`]: Dispatcher::handle
/// [`handle_fallthrough`]: Dispatcher::handle_fallthrough
pub(in crate::lsp) struct Dispatcher<'dispatcher, B: LanguageClient> {
    /// [`Notification`] to be dispatched.
    ///
    /// Will be transformed into `None` if consumed.
    notification: Option<Notification>,

    /// [`LanguageClient`] where the [`Notification`] is dispatched.
    backend: &'dispatcher mut B,
}

impl<'dispatcher, B: LanguageClient> Dispatcher<'dispatcher, B> {
    /// Creates a new [`Dispatcher`].
    pub fn new(notification: Notification, backend: &'dispatcher mut B) -> Self {
        Self {
            notification: Some(notification),

            backend,
        }
    }

    /// Dispatches the [`Notification`] to the [`LanguageClient`], if the [`Notification`]'s method corresponds to
    /// the [`lsp_types::notification::Notification::METHOD`].
    pub fn handle<N>(&mut self, handler: fn(&mut B, N::Params)) -> &mut Self
    where
        N: lsp_types::notification::Notification,
    {
        let Some(ref notification) = self.notification else { return self; };

        if notification.method != N::METHOD {
            return self;
        }

        let notification = self.notification.take().unwrap_or_else(|| unreachable!("checked as Some above"));

        match serde_json::from_value::<N::Params>(notification.params) {
            Ok(params) => handler(self.backend, params),
            Err(err) => warn!("malformed {} notification from analyzer: {err}", N::METHOD),
        }

        self
    }

    /// Fallthrough handler if the [`Notification`] is not handled by any [`handle`]-like method.
    ///
    /// This function should be used at the end of the [`handle`]-like method chain.
    ///
    /// [`handle`]: Dispatcher::handle
    pub fn handle_fallthrough(&mut self, message: &str) {
        let Some(ref notification) = self.notification else { return; };

        warn!("{message}: {}", notification.method);
    }
}
