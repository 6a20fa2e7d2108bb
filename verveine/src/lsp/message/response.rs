//! A [response] answering a [request].
//!
//! [response]: https://microsoft.github.io/language-server-protocol/specifications/specification-current/#responseMessage
//! [request]: https://microsoft.github.io/language-server-protocol/specifications/specification-current/#requestMessage

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// [Response] message.
///
/// [Response]: https://microsoft.github.io/language-server-protocol/specifications/specification-current/#responseMessage
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Response {
    /// The request id.
    pub id: u64,

    /// The result of a request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// The error object in case a request fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Error>,
}

impl Response {
    /// Creates a new successful [`Response`].
    pub fn new<R: lsp_types::request::Request>(id: u64, result: R::Result) -> Self {
        Self {
            id,
            result: Some(serde_json::to_value(result).unwrap_or_else(|_| unreachable!("lsp_types crate is assumed to be correct"))),
            error: None,
        }
    }

    /// Creates a new failed [`Response`].
    #[must_use]
    pub fn error(id: u64, error: Error) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Extracts the typed result of the request this [`Response`] answers.
    ///
    /// # Errors
    /// Returns an error if the analyzer answered with an error object, or if the result does not deserialise to
    /// the expected type.
    pub fn extract<R: lsp_types::request::Request>(self) -> Result<R::Result> {
        if let Some(error) = self.error {
            bail!("analyzer answered {} with error {:?}: {}", R::METHOD, error.code, error.message);
        }

        Ok(serde_json::from_value(self.result.unwrap_or(Value::Null))?)
    }
}

/// [Response error] message.
///
/// [Response error]: https://microsoft.github.io/language-server-protocol/specifications/specification-current/#responseError
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Error {
    /// A number indicating the error type that occurred.
    pub code: ErrorCode,

    /// A string providing a short description of the error.
    pub message: String,

    /// A primitive or structured value that contains additional information about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// [Error codes] of the base protocol.
///
/// Codes not named by the base protocol round-trip through [`ErrorCode::Other`].
///
/// [Error codes]: https://microsoft.github.io/language-server-protocol/specifications/specification-current/#errorCodes
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(from = "i64", into = "i64")]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    ServerNotInitialized,
    RequestCancelled,
    ContentModified,
    Other(i64),
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        match code {
            -32700 => Self::ParseError,
            -32600 => Self::InvalidRequest,
            -32601 => Self::MethodNotFound,
            -32602 => Self::InvalidParams,
            -32603 => Self::InternalError,
            -32002 => Self::ServerNotInitialized,
            -32800 => Self::RequestCancelled,
            -32801 => Self::ContentModified,
            other => Self::Other(other),
        }
    }
}

impl From<ErrorCode> for i64 {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
            ErrorCode::ServerNotInitialized => -32002,
            ErrorCode::RequestCancelled => -32800,
            ErrorCode::ContentModified => -32801,
            ErrorCode::Other(other) => other,
        }
    }
}
