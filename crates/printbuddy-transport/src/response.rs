//! Response classification.
//!
//! A response is accepted if it starts with a `200 OK` or `409 CONFLICT`
//! status line and a complete header block, or if it carries no HTTP header
//! at all, in which case the whole stream is the body. A header block cut
//! short by the end of the stream is reported, not rejected.

use crate::connection::Connection;
use crate::error::TransportError;
use serde::de::DeserializeOwned;
use std::io::{self, BufRead, BufReader};
use tracing::debug;

/// Bytes inspected for an `HTTP/` marker before the status line is parsed.
const PEEK_LEN: usize = 32;

const ACCEPTED_STATUS: [&str; 2] = ["HTTP/1.1 200 OK", "HTTP/1.1 409 CONFLICT"];

type BodyReader = BufReader<Box<dyn Connection>>;

/// A classified response positioned at the start of its body.
pub struct Response {
    status: Option<String>,
    headers_complete: bool,
    body: BodyReader,
}

impl Response {
    /// Read and classify the response head from `conn`.
    ///
    /// `target` names the request in error messages.
    pub fn read(conn: Box<dyn Connection>, target: &str) -> Result<Self, TransportError> {
        let read_failed = |source| TransportError::ReadFailed {
            target: target.to_string(),
            source,
        };

        // Whatever the first read yields is enough to decide
        let mut body = BufReader::new(conn);
        let peek = body.fill_buf().map_err(read_failed)?;
        let has_header = contains(&peek[..peek.len().min(PEEK_LEN)], b"HTTP/");

        if !has_header {
            debug!("No HTTP header from {}", target);
            return Ok(Self {
                status: None,
                headers_complete: true,
                body,
            });
        }

        let status = read_line(&mut body).map_err(read_failed)?.unwrap_or_default();
        if !ACCEPTED_STATUS.contains(&status.as_str()) {
            debug!("Unexpected response: {}", status);
            return Err(TransportError::UnexpectedStatus { status });
        }

        let headers_complete = loop {
            match read_line(&mut body).map_err(read_failed)? {
                Some(line) if line.is_empty() => break true,
                Some(_) => continue,
                None => break false,
            }
        };

        Ok(Self {
            status: Some(status),
            headers_complete,
            body,
        })
    }

    /// The accepted status line, or `None` for a headerless response.
    pub fn status_line(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// `false` if the stream ended before the blank line closing the
    /// headers.
    pub fn headers_complete(&self) -> bool {
        self.headers_complete
    }

    pub fn is_headerless(&self) -> bool {
        self.status.is_none()
    }

    /// Parse the first JSON document of the body. Trailing bytes are ignored.
    pub fn json<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        let mut docs = serde_json::Deserializer::from_reader(self.body).into_iter::<T>();
        match docs.next() {
            Some(doc) => doc,
            None => Err(serde_json::Error::io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "empty response body",
            ))),
        }
    }

    /// Remaining body as a reader.
    pub fn into_body(self) -> impl BufRead {
        self.body
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers_complete", &self.headers_complete)
            .finish_non_exhaustive()
    }
}

/// Read one line without its `\r\n`. `None` at end of stream.
fn read_line(reader: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut raw = Vec::new();
    if reader.read_until(b'\n', &mut raw)? == 0 {
        return Ok(None);
    }
    if !raw.ends_with(b"\n") {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(&raw);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
