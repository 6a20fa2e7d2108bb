//! A [notification] sent from the client to the analyzer, or from the analyzer to the client.
//!
//! [notification]: https://microsoft.github.io/language-server-protocol/specifications/specification-current/#notificationMessage

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// [Notification] message.
///
/// [Notification]: https://microsoft.github.io/language-server-protocol/specifications/specification-current/#notificationMessage
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Notification {
    /// The method to be invoked.
    pub method: String,

    /// The notification parameters.
    #[serde(default)]
    #[serde(skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

impl Notification {
    /// Creates a new [`Notification`].
    pub fn new<N: lsp_types::notification::Notification>(params: N::Params) -> Self {
        Self {
            method: N::METHOD.to_owned(),
            params: serde_json::to_value(params).unwrap_or_else(|_| unreachable!("lsp_types crate is assumed to be correct")),
        }
    }
}
