//! # printbuddy-transport
//!
//! Minimal HTTP/1.1-over-TCP client shared by every network backend.
//!
//! One call performs one request/response cycle: connect, write a hand-built
//! request, classify the status line, skip the headers and optionally parse
//! the body as JSON. Failures are recorded as a single overwritable
//! last-error on the [`JsonRequestClient`].

pub mod client;
pub mod connection;
pub mod error;
pub mod request;
pub mod response;

pub use client::JsonRequestClient;
pub use connection::{Connection, Connector, TcpConnector, DEFAULT_TIMEOUT};
pub use error::TransportError;
pub use request::{basic_auth, encode_request, Method, Request, USER_AGENT};
pub use response::Response;
