//! Dispatch of analyzer-originated traffic towards the [`LanguageClient`] backend.
//!
//! [`LanguageClient`]: crate::lsp::LanguageClient

pub mod notification;
pub mod request;
