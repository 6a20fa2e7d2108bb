//! Message handling when communicating with a [Language Server Protocol] analyzer.
//!
//! [Language Server Protocol]: https://microsoft.github.io/language-server-protocol/

pub mod notification;
pub mod request;
pub mod response;

use std::io::{BufRead, Write};

use anyhow::{bail, Result};
use notification::Notification;
use request::Request;
use response::Response;
use serde::{Deserialize, Serialize};

/// A message sent to or received from a [Language Server Protocol] analyzer.
///
/// [Language Server Protocol]: https://microsoft.github.io/language-server-protocol/
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Message {
    /// A [`Request`] sent from the client to the analyzer, or back.
    Request(Request),

    /// A [`Response`] answering a [`Request`].
    Response(Response),

    /// A [`Notification`], sent in either direction.
    Notification(Notification),
}

/// Tiny wrapper adding the protocol version to outgoing messages.
#[derive(Serialize)]
struct JsonRPC {
    /// JSON-RPC version.
    jsonrpc: &'static str,

    /// The message.
    #[serde(flatten)]
    msg: Message,
}

impl Message {
    /// Reads a [`Message`] from a [`BufRead`] according to the [specification].
    ///
    /// This function will block until a complete message is received. A clean end of stream — the analyzer closed
    /// its end of the channel — reads as `None`.
    ///
    /// # Errors
    /// Returns an error if the message does not conform to the [specification], or if a `read` operation failed.
    ///
    /// [specification]: https://microsoft.github.io/language-server-protocol/specifications/specification-current/#baseProtocol
    pub fn read(reader: &mut dyn BufRead) -> Result<Option<Self>> {
        let mut buffer = String::new();

        if reader.read_line(&mut buffer)? == 0 {
            return Ok(None);
        }

        if !(buffer.starts_with("Content-Length: ") && buffer.ends_with("\r\n")) {
            bail!("Missing Content-Length header");
        }

        let size = buffer
            .get(16..buffer.len() - 2)
            .unwrap_or_else(|| unreachable!("UTF-8 is checked by read_line"))
            .parse::<usize>()?;

        // Discard the remaining headers, up to the blank separator line.
        loop {
            let mut header = String::new();

            if reader.read_line(&mut header)? == 0 {
                bail!("End of stream inside message headers");
            }

            if header == "\r\n" {
                break;
            }
        }

        let mut buffer = vec![0; size];

        reader.read_exact(&mut buffer)?;

        let buffer = String::from_utf8(buffer)?;

        Ok(Some(serde_json::from_str(&buffer)?))
    }

    /// Sends a [`Message`] to a [`Write`] according to the [specification].
    ///
    /// This function will block until the complete message is sent.
    ///
    /// # Errors
    /// Returns an error if one of the `write` operations failed.
    ///
    /// [specification]: https://microsoft.github.io/language-server-protocol/specifications/specification-current/#baseProtocol
    pub fn write(self, writer: &mut dyn Write) -> Result<()> {
        let message = JsonRPC {
            jsonrpc: "2.0",
            msg: self,
        };

        let payload = serde_json::to_string(&message).unwrap_or_else(|_| unreachable!("lsp_types crate is assumed to be correct"));

        write!(writer, "Content-Length: {}\r\n\r\n", payload.len())?;

        writer.write_all(payload.as_bytes())?;
        writer.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::BufReader;

    use lsp_types::*;

    use super::*;

    #[test]
    fn expected_read() {
        let data = b"Content-Length: 41\r\n\r\n{ \"method\": \"initialized\", \"params\": {} }";

        assert_eq!(
            Message::read(&mut BufReader::new(&data[..])).unwrap(),
            Some(Message::Notification(Notification::new::<lsp_types::notification::Initialized>(InitializedParams {})))
        );
    }

    #[test]
    fn extra_headers_are_discarded() {
        let data = b"Content-Length: 41\r\nContent-Type: application/vscode-jsonrpc; charset=utf-8\r\n\r\n{ \"method\": \"initialized\", \"params\": {} }";

        assert_eq!(
            Message::read(&mut BufReader::new(&data[..])).unwrap(),
            Some(Message::Notification(Notification::new::<lsp_types::notification::Initialized>(InitializedParams {})))
        );
    }

    #[test]
    fn expected_write() {
        let mut output = Vec::new();

        Message::Response(Response::new::<lsp_types::request::Shutdown>(1, ()))
            .write(&mut output)
            .unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "Content-Length: 38\r\n\r\n{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":null}");
    }

    #[test]
    fn end_of_stream() {
        let data = b"";

        assert_eq!(Message::read(&mut BufReader::new(&data[..])).unwrap(), None);
    }

    #[test]
    fn missing_content_length() {
        let data = b"{ \"method\": \"initialized\", \"params\": {} }";

        assert_eq!(
            Message::read(&mut BufReader::new(&data[..])).unwrap_err().to_string(),
            "Missing Content-Length header"
        );
    }

    #[test]
    fn truncated_payload() {
        let data = b"Content-Length: 100\r\n\r\n{ \"method\": \"initialized\", \"params\": {} }";

        assert_eq!(Message::read(&mut BufReader::new(&data[..])).unwrap_err().to_string(), "failed to fill whole buffer");
    }

    #[test]
    fn unexpected_content_length_value() {
        let data = b"Content-Length: ???\r\n\r\n{ \"method\": \"initialized\", \"params\": {} }";

        assert_eq!(
            Message::read(&mut BufReader::new(&data[..])).unwrap_err().to_string(),
            "invalid digit found in string"
        );
    }

    #[test]
    fn corrupt_payload() {
        let data = b"Content-Length: 38\r\n\r\n{ \"method\": \"initialized\", \"params\": {";

        assert_eq!(
            Message::read(&mut BufReader::new(&data[..])).unwrap_err().to_string(),
            "EOF while parsing an object at line 1 column 38"
        );
    }
}
