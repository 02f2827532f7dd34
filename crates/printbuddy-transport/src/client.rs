//! Request client used by network backends.

use crate::connection::{Connector, TcpConnector};
use crate::error::TransportError;
use crate::request::{encode_request, Method, Request};
use crate::response::Response;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io::Write;
use tracing::{debug, warn};

/// Performs one blocking request/response cycle per call and remembers the
/// most recent failure.
///
/// The last error is overwritten by the next failing call. It is cleared at
/// the start of every [`request_json`](Self::request_json) call but not by
/// the raw [`request`](Self::request).
pub struct JsonRequestClient<C: Connector = TcpConnector> {
    connector: C,
    last_error: Option<TransportError>,
}

impl JsonRequestClient<TcpConnector> {
    pub fn tcp() -> Self {
        Self::new(TcpConnector::default())
    }
}

impl<C: Connector> JsonRequestClient<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            last_error: None,
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Connect, send `req` and classify the response head.
    ///
    /// Returns `None` if no response could be read; the cause is kept in
    /// [`last_error`](Self::last_error). An incomplete header block is
    /// recorded there too, but the response is still returned.
    pub fn request(&mut self, req: &Request) -> Option<Response> {
        match self.exchange(req) {
            Ok(resp) => {
                if !resp.headers_complete() {
                    let e = TransportError::InvalidResponse {
                        target: req.target(),
                    };
                    warn!("{}", e);
                    self.last_error = Some(e);
                }
                Some(resp)
            }
            Err(e) => {
                warn!("{}", e);
                self.last_error = Some(e);
                None
            }
        }
    }

    /// Request `req` and, if `with_response`, parse the body as JSON.
    ///
    /// Returns `None` on any failure or when no body was requested.
    pub fn request_json(&mut self, req: &Request, with_response: bool) -> Option<Value> {
        self.request_json_as(req, with_response)
    }

    /// Typed variant of [`request_json`](Self::request_json).
    pub fn request_json_as<T: DeserializeOwned>(
        &mut self,
        req: &Request,
        with_response: bool,
    ) -> Option<T> {
        self.reset_last_error();
        let resp = self.request(req)?;
        if self.last_error.is_some() || !with_response {
            return None;
        }

        match resp.json::<T>() {
            Ok(doc) => Some(doc),
            Err(source) => {
                let err = TransportError::Parse {
                    server: req.server(),
                    source,
                };
                warn!("{} [{}]", err, err_source(&err));
                self.last_error = Some(err);
                None
            }
        }
    }

    pub fn last_error(&self) -> Option<&TransportError> {
        self.last_error.as_ref()
    }

    /// Last error message, empty if none.
    pub fn last_error_text(&self) -> String {
        self.last_error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    pub fn reset_last_error(&mut self) {
        self.last_error = None;
    }

    fn exchange(&self, req: &Request) -> Result<Response, TransportError> {
        let target = req.target();
        if req.method == Method::Post {
            debug!("Request data from {} | {}", req.request_line(), req.body);
        } else {
            debug!("Request data from {}", req.request_line());
        }

        let mut conn = self
            .connector
            .connect(&req.host, req.port)
            .map_err(|source| TransportError::ConnectFailed {
                target: target.clone(),
                source,
            })?;

        conn.write_all(encode_request(req).as_bytes())
            .and_then(|_| conn.flush())
            .map_err(|source| TransportError::WriteFailed {
                target: target.clone(),
                source,
            })?;

        Response::read(conn, &target)
    }
}

fn err_source(err: &TransportError) -> String {
    std::error::Error::source(err)
        .map(ToString::to_string)
        .unwrap_or_default()
}
