//! Byte-stream connections.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::trace;

/// Connect, read and write timeout used by [`TcpConnector::default`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A bidirectional byte stream carrying one request/response cycle.
pub trait Connection: Read + Write {}

impl<T: Read + Write> Connection for T {}

/// Opens connections to `host:port`.
pub trait Connector {
    fn connect(&self, host: &str, port: u16) -> io::Result<Box<dyn Connection>>;
}

/// Plain TCP with bounded connect and read/write timeouts.
#[derive(Debug, Clone, Copy)]
pub struct TcpConnector {
    timeout: Duration,
}

impl TcpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Connector for TcpConnector {
    fn connect(&self, host: &str, port: u16) -> io::Result<Box<dyn Connection>> {
        let mut last_err = io::Error::new(
            io::ErrorKind::NotFound,
            format!("no address for {}:{}", host, port),
        );

        for addr in (host, port).to_socket_addrs()? {
            trace!("Connecting to {}", addr);
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(self.timeout))?;
                    stream.set_write_timeout(Some(self.timeout))?;
                    return Ok(Box::new(stream));
                }
                Err(e) => last_err = e,
            }
        }

        Err(last_err)
    }
}
