//! HTTP request encoding.

use base64::Engine as _;
use std::fmt;

/// Fixed `User-Agent` sent with every request.
pub const USER_AGENT: &str = "ArduinoWiFi/1.1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request against a backend endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub host: String,
    pub port: u16,
    /// Pre-encoded Basic-Auth credential; empty sends no `Authorization`.
    pub auth: String,
    pub path: String,
    /// JSON body, only sent with POST.
    pub body: String,
}

impl Request {
    pub fn get(host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            host: host.into(),
            port,
            auth: String::new(),
            path: path.into(),
            body: String::new(),
        }
    }

    pub fn post(
        host: impl Into<String>,
        port: u16,
        path: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            method: Method::Post,
            body: body.into(),
            ..Self::get(host, port, path)
        }
    }

    pub fn with_auth(mut self, encoded: impl Into<String>) -> Self {
        self.auth = encoded.into();
        self
    }

    /// `METHOD path HTTP/1.1`
    pub fn request_line(&self) -> String {
        format!("{} {} HTTP/1.1", self.method, self.path)
    }

    /// `host:port`
    pub fn server(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `host:port | METHOD path HTTP/1.1`, used in error messages.
    pub fn target(&self) -> String {
        format!("{} | {}", self.server(), self.request_line())
    }
}

/// Encode `username:password` for the `Authorization: Basic` header.
pub fn basic_auth(username: &str, password: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", username, password))
}

/// Render the full request bytes.
pub fn encode_request(req: &Request) -> String {
    let mut out = String::with_capacity(128 + req.body.len());
    out.push_str(&req.request_line());
    out.push_str("\r\n");
    out.push_str(&format!("Host: {}\r\n", req.server()));
    if !req.auth.is_empty() {
        out.push_str(&format!("Authorization: Basic {}\r\n", req.auth));
    }
    out.push_str(&format!("User-Agent: {}\r\n", USER_AGENT));
    out.push_str("Connection: close\r\n");
    if req.method == Method::Post {
        out.push_str("Content-Type: application/json\r\n");
        out.push_str(&format!("Content-Length: {}\r\n", req.body.len()));
    }
    out.push_str("\r\n");
    if req.method == Method::Post {
        out.push_str(&req.body);
    }
    out
}
